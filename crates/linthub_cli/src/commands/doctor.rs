//! Doctor command implementation

use std::path::Path;
use std::sync::Arc;

use miette::{IntoDiagnostic, Result, miette};

use super::{load_config, load_registry};
use crate::cli::Cli;
use crate::output::write_output;
use crate::utils::create_tokio_runtime;
use linthub_core::format::{render_health, render_health_json};
use linthub_core::{SystemProbe, check_tools};

pub fn run_doctor(
    cli: &Cli,
    tools: Option<&[String]>,
    json: bool,
    output: Option<&Path>,
) -> Result<u8> {
    let config = load_config(cli)?;
    let registry = load_registry(cli, &config)?;

    let selected = match tools {
        Some(names) => names
            .iter()
            .map(|name| {
                registry
                    .get(name)
                    .map(Arc::clone)
                    .ok_or_else(|| miette!("Unknown tool '{}'", name))
            })
            .collect::<Result<Vec<_>>>()?,
        None => registry.descriptors(),
    };

    let runtime = create_tokio_runtime()?;
    let report = runtime.block_on(check_tools(&selected, &SystemProbe::new(".")));

    let rendered = if json {
        render_health_json(&report).into_diagnostic()?
    } else {
        render_health(&report)
    };
    write_output(&rendered, output)?;

    Ok(report.exit_code())
}
