//! linthub CLI
//!
//! Runs every linter and formatter a project needs and merges their output
//! into one report.

mod cli;
mod commands;
mod output;
mod utils;

use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::doctor::run_doctor;
use crate::commands::init::run_init;
use crate::commands::list_tools::run_list_tools;
use crate::commands::run::run_tools;
use linthub_core::{EXIT_CLEAN, EXIT_ERROR, Mode};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(cli: &Cli) -> Result<u8> {
    match &cli.command {
        Commands::Check(args) => run_tools(cli, args, Mode::Check),
        Commands::Format(args) => run_tools(cli, args, Mode::Fix),
        Commands::ListTools {
            show_conflicts,
            output,
        } => run_list_tools(cli, *show_conflicts, output.as_deref()).map(|_| EXIT_CLEAN),
        Commands::Doctor {
            tools,
            json,
            output,
        } => run_doctor(cli, tools.as_deref(), *json, output.as_deref()),
        Commands::Init { force } => run_init(*force).map(|_| EXIT_CLEAN),
    }
}
