//! List-tools command implementation

use std::path::Path;

use miette::Result;

use super::{load_config, load_registry};
use crate::cli::Cli;
use crate::output::write_output;
use linthub_core::format::render_tool_list;

pub fn run_list_tools(cli: &Cli, show_conflicts: bool, output: Option<&Path>) -> Result<()> {
    let config = load_config(cli)?;
    let registry = load_registry(cli, &config)?;
    let listing = render_tool_list(&registry.descriptors(), show_conflicts);
    write_output(&listing, output)
}
