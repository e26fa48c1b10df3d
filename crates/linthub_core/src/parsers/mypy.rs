use super::{
    OutputParser, ParseOutcome, Pattern, combined, looks_like_missing_dependency, normalize_path,
};
use crate::issue::{Issue, IssueKind, Severity};

/// `mypy --show-column-numbers --show-error-codes`.
pub struct MypyParser;

const DEPENDENCY_CODES: &[&str] = &["import-not-found", "import-untyped", "import"];

pub(crate) static LINE_RE: Pattern = Pattern::new(concat!(
    r"^(?P<file>[^:]+):(?P<line>\d+)(?::(?P<col>\d+))?:\s*",
    r"(?P<sev>error|warning|note):\s*",
    r"(?P<msg>.*?)(?:\s+\[(?P<code>[a-z0-9-]+)\])?$",
));

fn is_summary(line: &str) -> bool {
    line.starts_with("Success: ") || line.starts_with("Found ")
}

impl OutputParser for MypyParser {
    fn parse(&self, tool: &str, stdout: &str, stderr: &str) -> ParseOutcome {
        let text = combined(stdout, stderr);
        let mut outcome = ParseOutcome::default();
        let re = LINE_RE.get();

        for raw in text.lines() {
            let line = raw.trim_end();
            if line.trim().is_empty() || is_summary(line) {
                continue;
            }
            let Some(caps) = re.captures(line) else {
                outcome.skip();
                continue;
            };
            let Ok(line_no) = caps["line"].parse::<u32>() else {
                outcome.skip();
                continue;
            };
            let file = normalize_path(&caps["file"]);
            let message = caps["msg"].trim();
            let severity = Severity::from_label(&caps["sev"]);

            // Notes elaborate on the error just before them.
            if severity == Severity::Info
                && let Some(last) = outcome.issues.last_mut()
                && last.file == file
                && last.line == line_no
            {
                last.message.push_str(" (");
                last.message.push_str(message);
                last.message.push(')');
                continue;
            }

            let code = caps.name("code").map(|m| m.as_str()).unwrap_or_default();
            let kind = if DEPENDENCY_CODES.contains(&code) || looks_like_missing_dependency(message)
            {
                IssueKind::DependencyMissing
            } else {
                IssueKind::Violation
            };

            let mut issue = Issue::new(tool, file, line_no, message)
                .with_code(code)
                .with_severity(severity)
                .with_kind(kind);
            if let Some(col) = caps.name("col").and_then(|m| m.as_str().parse().ok()) {
                issue = issue.with_column(col);
            }
            outcome.push(issue);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_errors_with_codes() {
        let stdout = "\
app/models.py:14:5: error: Incompatible return value type (got \"str\", expected \"int\")  [return-value]
app/views.py:3:1: error: Cannot find implementation or library stub for module named \"flask\"  [import-not-found]
app/views.py:3:1: note: See https://mypy.readthedocs.io/en/stable/running_mypy.html#missing-imports
Found 2 errors in 2 files (checked 5 source files)
";
        let outcome = MypyParser.parse("mypy", stdout, "");

        assert_eq!(outcome.skipped_lines, 0);
        assert_eq!(outcome.issues.len(), 2);
        assert_eq!(
            outcome.issues[0],
            Issue::new(
                "mypy",
                "app/models.py",
                14,
                "Incompatible return value type (got \"str\", expected \"int\")"
            )
            .with_column(5)
            .with_code("return-value")
        );
        assert_eq!(outcome.issues[1].kind, IssueKind::DependencyMissing);
        assert!(outcome.issues[1].message.contains("(See https://"));
    }

    #[test]
    fn test_line_without_column_or_code() {
        let outcome = MypyParser.parse("mypy", "lib.py:7: error: Name \"x\" is not defined\n", "");
        let issue = &outcome.issues[0];
        assert_eq!(issue.line, 7);
        assert_eq!(issue.column, None);
        assert_eq!(issue.code, None);
    }

    #[test]
    fn test_standalone_note_is_info() {
        let outcome = MypyParser.parse("mypy", "a.py:1: note: Revealed type is \"int\"\n", "");
        assert_eq!(outcome.issues[0].severity, Severity::Info);
    }

    #[test]
    fn test_success_summary_and_noise() {
        let outcome = MypyParser.parse(
            "mypy",
            "Success: no issues found in 3 source files\n",
            "mypy: can't read file 'x.py': No such file or directory\n",
        );
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.skipped_lines, 1);
    }
}
