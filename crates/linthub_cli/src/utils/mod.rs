//! CLI utility functions

use std::io::{BufRead, IsTerminal, Write};

use miette::{IntoDiagnostic, Result};
use tokio::runtime::Runtime;

pub fn create_tokio_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()
}

/// Asks a yes/no question on stderr. Without a terminal on stdin the answer
/// is no.
pub fn confirm(question: &str) -> Result<bool> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return Ok(false);
    }

    let mut stderr = std::io::stderr();
    write!(stderr, "{} [y/N] ", question).into_diagnostic()?;
    stderr.flush().into_diagnostic()?;

    let mut answer = String::new();
    stdin.lock().read_line(&mut answer).into_diagnostic()?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
        assert!(!is_yes("yep"));
    }
}
