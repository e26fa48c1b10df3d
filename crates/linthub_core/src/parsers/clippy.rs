use serde_json::Value;

use super::{OutputParser, ParseOutcome, looks_like_missing_dependency, normalize_path, strip_ansi};
use crate::issue::{Issue, IssueKind, Severity};

/// `cargo clippy --message-format=json`: one JSON object per stdout line.
pub struct ClippyParser;

/// Compiler summaries that carry no location ("aborting due to ...").
fn is_summary(message: &Value) -> bool {
    message
        .get("spans")
        .and_then(Value::as_array)
        .is_none_or(|spans| spans.is_empty())
}

fn primary_span(message: &Value) -> Option<&Value> {
    message
        .get("spans")?
        .as_array()?
        .iter()
        .find(|span| span.get("is_primary").and_then(Value::as_bool) == Some(true))
}

fn to_issue(tool: &str, message: &Value) -> Option<Issue> {
    let span = primary_span(message)?;
    let file = span.get("file_name")?.as_str()?;
    let line = u32::try_from(span.get("line_start")?.as_u64()?).ok()?;
    let column = u32::try_from(span.get("column_start")?.as_u64()?).ok()?;
    let text = message.get("message")?.as_str()?;
    let level = message.get("level").and_then(Value::as_str).unwrap_or("error");
    let code = message
        .get("code")
        .and_then(|c| c.get("code"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    let kind = if code == "E0463" || looks_like_missing_dependency(text) {
        IssueKind::DependencyMissing
    } else {
        IssueKind::Violation
    };

    Some(
        Issue::new(tool, normalize_path(file), line, text)
            .with_column(column)
            .with_code(code)
            .with_severity(Severity::from_label(level))
            .with_kind(kind),
    )
}

impl OutputParser for ClippyParser {
    fn parse(&self, tool: &str, stdout: &str, _stderr: &str) -> ParseOutcome {
        let stdout = strip_ansi(stdout);
        let mut outcome = ParseOutcome::default();

        for line in stdout.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Ok(record) = serde_json::from_str::<Value>(line) else {
                outcome.skip();
                continue;
            };
            // compiler-artifact, build-script-executed, build-finished
            if record.get("reason").and_then(Value::as_str) != Some("compiler-message") {
                continue;
            }
            let Some(message) = record.get("message") else {
                outcome.skip();
                continue;
            };
            if is_summary(message) {
                continue;
            }
            match to_issue(tool, message) {
                Some(issue) => outcome.push(issue),
                None => outcome.skip(),
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn message_line(level: &str, code: Option<&str>, text: &str, file: &str, line: u32) -> String {
        serde_json::json!({
            "reason": "compiler-message",
            "package_id": "demo 0.1.0",
            "message": {
                "message": text,
                "level": level,
                "code": code.map(|c| serde_json::json!({ "code": c, "explanation": null })),
                "spans": [
                    { "file_name": "src/other.rs", "line_start": 1, "column_start": 1, "is_primary": false },
                    { "file_name": file, "line_start": line, "column_start": 9, "is_primary": true }
                ]
            }
        })
        .to_string()
    }

    #[test]
    fn test_parses_compiler_messages() {
        let stdout = [
            r#"{"reason":"compiler-artifact","package_id":"dep 1.0.0"}"#.to_string(),
            message_line(
                "warning",
                Some("clippy::needless_return"),
                "unneeded `return` statement",
                "src/main.rs",
                4,
            ),
            message_line("error", Some("E0463"), "can't find crate for `serde`", "src/lib.rs", 1),
            r#"{"reason":"compiler-message","message":{"message":"aborting due to 1 previous error","level":"error","code":null,"spans":[]}}"#.to_string(),
            r#"{"reason":"build-finished","success":false}"#.to_string(),
        ]
        .join("\n");

        let outcome = ClippyParser.parse("clippy", &stdout, "");
        assert_eq!(outcome.skipped_lines, 0);
        assert_eq!(outcome.issues.len(), 2);
        assert_eq!(
            outcome.issues[0],
            Issue::new("clippy", "src/main.rs", 4, "unneeded `return` statement")
                .with_column(9)
                .with_code("clippy::needless_return")
                .with_severity(Severity::Warning)
        );
        assert_eq!(outcome.issues[1].kind, IssueKind::DependencyMissing);
    }

    #[test]
    fn test_non_json_lines_are_counted() {
        let outcome = ClippyParser.parse("clippy", "    Checking demo v0.1.0\n", "");
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.skipped_lines, 1);
    }
}
