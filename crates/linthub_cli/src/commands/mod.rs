//! Command implementations

pub mod doctor;
pub mod init;
pub mod list_tools;
pub mod run;

use miette::{IntoDiagnostic, Result};
use tracing::info;

use crate::cli::Cli;
use linthub_core::{Config, ManifestSource, ToolRegistry};

/// Loads `--config`, or the discovered config file, or defaults.
pub fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::from_file(path).into_diagnostic(),
        None => find_config(),
    }
}

pub fn find_config() -> Result<Config> {
    if let Some(path) = Config::discover(".") {
        info!("Using config: {}", path.display());
        return Config::from_file(&path).into_diagnostic();
    }

    info!("No config file found, using defaults");
    Ok(Config::new())
}

/// `--manifest` beats the config's `manifest` key, which beats the built-in
/// manifest.
pub fn manifest_source(cli: &Cli, config: &Config) -> ManifestSource {
    match cli.manifest.clone().or_else(|| config.manifest_path()) {
        Some(path) => ManifestSource::File(path),
        None => ManifestSource::Builtin,
    }
}

pub fn load_registry(cli: &Cli, config: &Config) -> Result<ToolRegistry> {
    ToolRegistry::discover(&manifest_source(cli, config)).into_diagnostic()
}
