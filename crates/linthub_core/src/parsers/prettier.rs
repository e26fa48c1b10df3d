use super::{NO_FILE, OutputParser, ParseOutcome, Pattern, combined, normalize_path};
use crate::issue::{Issue, Severity};

/// `prettier --check` / `prettier --write`.
pub struct PrettierParser;

pub const CODE: &str = "PRETTIER";

pub(crate) static WARN_RE: Pattern = Pattern::new(r"^\[warn\]\s+(?P<file>.*?)(?:\s+\d+ms)?$");

pub(crate) static ERROR_RE: Pattern =
    Pattern::new(r"^\[error\]\s+(?:(?P<file>[^:\s]+):\s+)?(?P<msg>.+)$");

/// Lines prettier prints that are neither findings nor garbage.
fn is_chatter(line: &str) -> bool {
    line.starts_with("Checking formatting")
        || line.starts_with("All matched files use Prettier")
        || line.contains("Code style issues")
        // --write lists every file it touched: "src/a.ts 12ms"
        || line.ends_with("ms")
        || line.ends_with("ms (unchanged)")
}

impl OutputParser for PrettierParser {
    fn parse(&self, tool: &str, stdout: &str, stderr: &str) -> ParseOutcome {
        let text = combined(stdout, stderr);
        let mut outcome = ParseOutcome::default();
        let (warn, error) = (WARN_RE.get(), ERROR_RE.get());

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(caps) = warn.captures(line) {
                let file = caps["file"].trim();
                if file.is_empty() || file.starts_with("Code style issues") {
                    continue;
                }
                outcome.push(
                    Issue::new(tool, normalize_path(file), 0, "File needs formatting")
                        .with_code(CODE)
                        .with_severity(Severity::Warning),
                );
            } else if let Some(caps) = error.captures(line) {
                let file = caps
                    .name("file")
                    .map(|m| normalize_path(m.as_str()))
                    .unwrap_or_else(|| NO_FILE.to_string());
                outcome.push(Issue::new(tool, file, 0, caps["msg"].trim()).with_code(CODE));
            } else if !is_chatter(line) {
                outcome.skip();
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
    fn test_check_output() {
        let stdout = "Checking formatting...\n";
        let stderr = "[warn] src/index.ts\n[warn] styles/main.css\n[warn] Code style issues found in 2 files. Run Prettier with --write to fix.\n";

        let outcome = PrettierParser.parse("prettier", stdout, stderr);
        assert_eq!(outcome.skipped_lines, 0);
        assert_eq!(
            outcome.issues,
            vec![
                Issue::new("prettier", "src/index.ts", 0, "File needs formatting")
                    .with_code("PRETTIER")
                    .with_severity(Severity::Warning),
                Issue::new("prettier", "styles/main.css", 0, "File needs formatting")
                    .with_code("PRETTIER")
                    .with_severity(Severity::Warning),
            ]
        );
    }

    #[test]
    fn test_ansi_wrapped_warning() {
        let outcome = PrettierParser.parse("prettier", "", "\x1b[33m[warn]\x1b[39m a.md\n");
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].file, "a.md");
    }

    #[test]
    fn test_write_mode_lists_files_without_issues() {
        let outcome = PrettierParser.parse("prettier", "src/a.ts 12ms\nsrc/b.ts 3ms (unchanged)\n", "");
        assert_eq!(outcome, ParseOutcome::default());
    }

    #[test]
    fn test_syntax_error() {
        let stderr = "[error] src/bad.js: SyntaxError: Unexpected token (1:7)\n";
        let outcome = PrettierParser.parse("prettier", "", stderr);
        assert_eq!(outcome.issues[0].file, "src/bad.js");
        assert_eq!(outcome.issues[0].severity, Severity::Error);
        assert!(outcome.issues[0].message.starts_with("SyntaxError"));
    }
}
