//! Init command implementation

use std::path::PathBuf;

use miette::{IntoDiagnostic, Result};
use tracing::info;

use linthub_core::Config;

const DEFAULT_CONFIG: &str = r#"{
  // Only run these tools. Remove to run every applicable tool.
  // "enabled": ["ruff", "black"],

  // Tools that never run.
  "disabled": [],

  // Extra glob patterns skipped during file discovery.
  "exclude": [],

  // Install missing project dependencies (node_modules) before running tools.
  "auto_install": false,

  // Per-tool timeout in seconds, e.g. { "mypy": 120 }.
  "timeouts": {},

  // Per-tool options, e.g. { "ruff": { "select": "E,F" } }.
  "tool_options": {},

  "output_format": "grid",
  "group_by": "auto"
}
"#;

pub fn run_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(Config::CONFIG_FILES[0]);

    loop {
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(libc::O_NOFOLLOW);
        }

        match options.open(&config_path) {
            Ok(mut file) => {
                use std::io::Write;
                file.write_all(DEFAULT_CONFIG.as_bytes()).into_diagnostic()?;
                info!("Created {}", config_path.display());
                return Ok(());
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                if !force {
                    return Err(miette::miette!(
                        "Config file already exists. Use --force to overwrite."
                    ));
                }

                match std::fs::remove_file(&config_path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e).into_diagnostic(),
                }
            }
            Err(e) => return Err(e).into_diagnostic(),
        }
    }
}
