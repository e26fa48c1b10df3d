use serde::Deserialize;

use super::{OutputParser, ParseOutcome, normalize_path, strip_ansi};
use crate::issue::{Issue, Severity};

/// `shellcheck --format=json1`.
pub struct ShellcheckParser;

#[derive(Deserialize)]
struct Json1 {
    comments: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct Comment {
    file: String,
    line: u32,
    column: u32,
    level: String,
    code: u32,
    message: String,
}

impl OutputParser for ShellcheckParser {
    fn parse(&self, tool: &str, stdout: &str, _stderr: &str) -> ParseOutcome {
        let stdout = strip_ansi(stdout);
        let text = stdout.trim();
        if text.is_empty() {
            return ParseOutcome::default();
        }

        // Older releases emit a bare array instead of the json1 envelope.
        let comments = match serde_json::from_str::<Json1>(text) {
            Ok(doc) => doc.comments,
            Err(_) => match serde_json::from_str::<Vec<serde_json::Value>>(text) {
                Ok(list) => list,
                Err(_) => return ParseOutcome::passthrough(tool, text),
            },
        };

        let mut outcome = ParseOutcome::default();
        for value in comments {
            match serde_json::from_value::<Comment>(value) {
                Ok(c) => outcome.push(
                    Issue::new(tool, normalize_path(&c.file), c.line, c.message)
                        .with_column(c.column)
                        .with_code(format!("SC{}", c.code))
                        .with_severity(Severity::from_label(&c.level)),
                ),
                Err(_) => outcome.skip(),
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_json1() {
        let stdout = r#"{"comments":[
            {"file":"run.sh","line":3,"endLine":3,"column":6,"endColumn":10,"level":"warning","code":2086,"message":"Double quote to prevent globbing and word splitting.","fix":null},
            {"file":"run.sh","line":7,"column":1,"level":"style","code":2164,"message":"Use 'cd ... || exit' in case cd fails."},
            {"file":"run.sh","line":9,"column":1,"level":"error","code":1073,"message":"Couldn't parse this if expression."}
        ]}"#;

        let outcome = ShellcheckParser.parse("shellcheck", stdout, "");
        assert_eq!(outcome.skipped_lines, 0);
        assert_eq!(outcome.issues.len(), 3);
        assert_eq!(
            outcome.issues[0],
            Issue::new(
                "shellcheck",
                "run.sh",
                3,
                "Double quote to prevent globbing and word splitting."
            )
            .with_column(6)
            .with_code("SC2086")
            .with_severity(Severity::Warning)
        );
        assert_eq!(outcome.issues[1].severity, Severity::Warning);
        assert_eq!(outcome.issues[2].severity, Severity::Error);
        assert_eq!(outcome.issues[2].code.as_deref(), Some("SC1073"));
    }

    #[test]
    fn test_legacy_array_format() {
        let stdout = r#"[{"file":"a.sh","line":1,"column":1,"level":"info","code":2034,"message":"x appears unused."}]"#;
        let outcome = ShellcheckParser.parse("shellcheck", stdout, "");
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].severity, Severity::Info);
    }

    #[test]
    fn test_no_comments() {
        let outcome = ShellcheckParser.parse("shellcheck", r#"{"comments":[]}"#, "");
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_not_json() {
        let outcome = ShellcheckParser.parse("shellcheck", "In run.sh line 3:", "");
        assert!(outcome.issues[0].is_unparsed());
    }
}
