//! Check and format command implementation

use miette::{IntoDiagnostic, Result};
use tracing::{info, warn};

use super::{load_config, load_registry};
use crate::cli::{Cli, RunArgs};
use crate::output::write_output;
use crate::utils::{confirm, create_tokio_runtime};
use linthub_core::format::render_raw;
use linthub_core::{Engine, Environment, FileFinder, Mode, SystemProbe, render};

pub fn run_tools(cli: &Cli, args: &RunArgs, mode: Mode) -> Result<u8> {
    let mut config = load_config(cli)?;
    config
        .merge_tool_options(&args.tool_options)
        .into_diagnostic()?;
    if args.auto_install {
        config.auto_install = Some(true);
    }

    let registry = load_registry(cli, &config)?;
    let format = args
        .output_format
        .or(config.output_format)
        .unwrap_or_default();
    let group_by = args.group_by.or(config.group_by).unwrap_or_default();

    let mut excludes = config.exclude.clone();
    excludes.extend(args.exclude.iter().cloned());
    let files = FileFinder::new(&excludes)
        .into_diagnostic()?
        .discover(&args.paths)
        .into_diagnostic()?;

    let env = Environment::detect();
    let mut engine =
        Engine::new(registry, config, env).with_ignore_conflicts(args.ignore_conflicts);

    let prompt = engine.auto_install() && !args.auto_install && !args.yes && !env.skips_prompts();
    if prompt {
        for dep in engine.pending_installs(&files) {
            let question = format!(
                "{} is missing. Install dependencies from {}?",
                dep.install_dir, dep.manifest
            );
            if !confirm(&question)? {
                warn!("Skipping dependency install; dependent tools will be skipped");
                engine.set_auto_install(false);
                break;
            }
        }
    }

    let runtime = create_tokio_runtime()?;
    let report = runtime.block_on(async {
        let probe = SystemProbe::new(engine.root());
        let plan = engine
            .plan(mode, args.tools.clone(), &files, &probe)
            .await
            .into_diagnostic()?;
        if plan.is_empty() {
            info!("No tools to run");
        } else {
            info!("Running {}", plan.tool_names().join(", "));
        }

        tokio::select! {
            report = engine.execute(plan, &files, group_by) => report.into_diagnostic(),
            _ = tokio::signal::ctrl_c() => Err(miette::miette!("Interrupted")),
        }
    })?;

    let rendered = if args.raw_output {
        render_raw(&report)
    } else {
        render(&report, format).into_diagnostic()?
    };
    write_output(&rendered, args.output.as_deref())?;

    Ok(report.exit_code)
}
