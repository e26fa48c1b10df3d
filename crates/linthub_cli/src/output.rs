//! Report output

use std::path::Path;

use miette::{IntoDiagnostic, Result};
use tracing::info;

/// Writes `content` to `path`, or to stdout when no path is given.
pub fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content).into_diagnostic()?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}
