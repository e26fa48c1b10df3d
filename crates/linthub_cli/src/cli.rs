//! CLI argument definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use linthub_core::{GroupBy, OutputFormat};

/// linthub - run every linter and formatter a project needs with one command
#[derive(Parser)]
#[command(name = "linthub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Tool manifest replacing the built-in one
    #[arg(long, global = true)]
    pub manifest: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every applicable tool in check mode
    Check(RunArgs),

    /// Run every applicable tool that can fix files
    Format(RunArgs),

    /// List known tools
    ListTools {
        /// Show conflict declarations and how they resolve
        #[arg(long)]
        show_conflicts: bool,

        /// Write the listing to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report installed tool versions against manifest minimums
    Doctor {
        /// Only check these tools (comma separated)
        #[arg(long, value_delimiter = ',')]
        tools: Option<Vec<String>>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Files or directories to check
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Only run these tools (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub tools: Option<Vec<String>>,

    /// Additional glob patterns to exclude
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Output format (grid, plain, json, markdown)
    #[arg(short = 'f', long)]
    pub output_format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Issue grouping (file, code, none, auto)
    #[arg(long)]
    pub group_by: Option<GroupBy>,

    /// Per-tool options as `tool:key=value[,key=value]`
    #[arg(long = "tool-options", value_name = "TOOL:KEY=VALUE")]
    pub tool_options: Vec<String>,

    /// Install missing project dependencies before running tools
    #[arg(long)]
    pub auto_install: bool,

    /// Run conflicting tools together instead of deferring all but one
    #[arg(long)]
    pub ignore_conflicts: bool,

    /// Print each tool's captured output instead of the report
    #[arg(long)]
    pub raw_output: bool,

    /// Answer yes to confirmation prompts
    #[arg(short, long)]
    pub yes: bool,
}
