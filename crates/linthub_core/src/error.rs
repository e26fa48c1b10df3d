//! Engine error types.

use thiserror::Error;

/// Errors that abort an invocation before or instead of running tools.
///
/// Per-tool failures (timeouts, missing executables, crashes) are not errors
/// at this level; they are recorded as an [`ExecutionStatus`](crate::ExecutionStatus)
/// on that tool's result.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed configuration, manifest or flags.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Manifest error.
    #[error("Manifest error: {0}")]
    Manifest(#[from] linthub_manifest::ManifestError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
