use super::{OutputParser, ParseOutcome, Pattern, combined, normalize_path};
use crate::issue::{Issue, Severity};

/// `black --check` / `black`.
///
/// Black reports per-file status on stderr: `would reformat x.py` in check
/// mode, `reformatted x.py` after fixing.
pub struct BlackParser;

pub(crate) static WOULD_REFORMAT_RE: Pattern =
    Pattern::new(r"(?i)^would reformat\s+(?P<file>.+)$");

pub(crate) static REFORMATTED_RE: Pattern = Pattern::new(r"(?i)^reformatted\s+(?P<file>.+)$");

pub(crate) static CANNOT_FORMAT_RE: Pattern =
    Pattern::new(r"^error: cannot format (?P<file>.+?): (?P<msg>.+)$");

fn is_summary(line: &str) -> bool {
    line.starts_with("All done!")
        || line.starts_with("Oh no!")
        || line.contains(" would be reformatted")
        || line.contains(" would be left unchanged")
        || line.contains(" reformatted, ")
        || line.contains(" left unchanged")
        || line.contains(" failed to reformat")
}

impl OutputParser for BlackParser {
    fn parse(&self, tool: &str, stdout: &str, stderr: &str) -> ParseOutcome {
        let text = combined(stdout, stderr);
        let mut outcome = ParseOutcome::default();
        let (would, done, cannot) = (
            WOULD_REFORMAT_RE.get(),
            REFORMATTED_RE.get(),
            CANNOT_FORMAT_RE.get(),
        );

        for raw in text.lines() {
            let line = raw.trim();
            // A file black rewrote is done, not a finding.
            if line.is_empty() || done.is_match(line) {
                continue;
            }
            if let Some(caps) = would.captures(line) {
                outcome.push(
                    Issue::new(tool, normalize_path(&caps["file"]), 0, "Would reformat file")
                        .with_severity(Severity::Warning),
                );
            } else if let Some(caps) = cannot.captures(line) {
                outcome.push(Issue::new(
                    tool,
                    normalize_path(&caps["file"]),
                    0,
                    caps["msg"].trim(),
                ));
            } else if !is_summary(line) {
                outcome.skip();
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::status_label;
    use crate::result::ExecutionStatus;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_check_mode() {
        let stderr = "would reformat src/app.py\nwould reformat tests/test_app.py\n\nOh no! 💥 💔 💥\n2 files would be reformatted, 3 files would be left unchanged.\n";
        let outcome = BlackParser.parse("black", "", stderr);

        assert_eq!(outcome.skipped_lines, 0);
        assert_eq!(
            outcome.issues,
            vec![
                Issue::new("black", "src/app.py", 0, "Would reformat file")
                    .with_severity(Severity::Warning),
                Issue::new("black", "tests/test_app.py", 0, "Would reformat file")
                    .with_severity(Severity::Warning),
            ]
        );
    }

    #[test]
    fn test_fix_mode_reports_pass() {
        let stderr = "reformatted src/app.py\n\nAll done! ✨ 🍰 ✨\n1 file reformatted, 4 files left unchanged.\n";
        let outcome = BlackParser.parse("black", "", stderr);
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.skipped_lines, 0);

        let status = ExecutionStatus::classify(&outcome.issues, Some(0), false);
        assert_eq!(status, ExecutionStatus::Ok);
        assert_eq!(status_label(status), "PASS");
    }

    #[test]
    fn test_cannot_format() {
        let stderr = "error: cannot format bad.py: Cannot parse: 1:6: def f(:\n";
        let outcome = BlackParser.parse("black", "", stderr);
        assert_eq!(outcome.issues[0].file, "bad.py");
        assert_eq!(outcome.issues[0].message, "Cannot parse: 1:6: def f(:");
        assert_eq!(outcome.issues[0].severity, Severity::Error);
    }
}
