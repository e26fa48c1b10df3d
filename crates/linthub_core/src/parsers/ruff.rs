use serde::Deserialize;

use super::{OutputParser, ParseOutcome, normalize_path, strip_ansi};
use crate::issue::Issue;

/// `ruff check --output-format json`.
pub struct RuffParser;

#[derive(Deserialize)]
struct RuffDiagnostic {
    filename: String,
    location: RuffLocation,
    #[serde(default)]
    code: Option<String>,
    message: String,
}

#[derive(Deserialize)]
struct RuffLocation {
    row: u32,
    column: u32,
}

impl OutputParser for RuffParser {
    fn parse(&self, tool: &str, stdout: &str, _stderr: &str) -> ParseOutcome {
        let stdout = strip_ansi(stdout);
        let text = stdout.trim();
        if text.is_empty() {
            return ParseOutcome::default();
        }

        let entries: Vec<serde_json::Value> = match serde_json::from_str(text) {
            Ok(entries) => entries,
            Err(_) => return ParseOutcome::passthrough(tool, text),
        };

        let mut outcome = ParseOutcome::default();
        for entry in entries {
            match serde_json::from_value::<RuffDiagnostic>(entry) {
                Ok(d) => {
                    let mut issue =
                        Issue::new(tool, normalize_path(&d.filename), d.location.row, d.message)
                            .with_column(d.location.column);
                    if let Some(code) = d.code {
                        issue = issue.with_code(code);
                    }
                    outcome.push(issue);
                }
                Err(_) => outcome.skip(),
            }
        }
        outcome
    }
}
