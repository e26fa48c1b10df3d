use super::{NO_FILE, OutputParser, ParseOutcome, Pattern, combined, normalize_path};
use crate::issue::{Issue, Severity};

/// `cargo fmt -- --check`: one issue per diff hunk header.
pub struct RustfmtParser;

pub(crate) static DIFF_RE: Pattern =
    Pattern::new(r"^Diff in (?P<file>.+?)(?: at line |:)(?P<line>\d+):?$");

pub(crate) static ERROR_RE: Pattern =
    Pattern::new(r"^(?i:error)(?:\[[A-Z0-9]+\])?:?\s+(?P<msg>.+)$");

impl OutputParser for RustfmtParser {
    fn parse(&self, tool: &str, stdout: &str, stderr: &str) -> ParseOutcome {
        let text = combined(stdout, stderr);
        let mut outcome = ParseOutcome::default();
        let (diff, error) = (DIFF_RE.get(), ERROR_RE.get());

        let mut in_hunk = false;
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(caps) = diff.captures(line.trim_end()) {
                in_hunk = true;
                let Ok(line_no) = caps["line"].parse::<u32>() else {
                    outcome.skip();
                    continue;
                };
                outcome.push(
                    Issue::new(tool, normalize_path(&caps["file"]), line_no, "Needs formatting")
                        .with_severity(Severity::Warning),
                );
                continue;
            }
            if in_hunk && line.starts_with(['+', '-', ' ']) {
                continue;
            }
            in_hunk = false;
            if let Some(caps) = error.captures(line.trim()) {
                outcome.push(Issue::new(tool, NO_FILE, 0, caps["msg"].trim()));
            } else {
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
    fn test_diff_headers() {
        let stdout = "\
Diff in /work/src/main.rs at line 1:
-fn main() { println!(\"hi\"); }
+fn main() {
+    println!(\"hi\");
+}
Diff in /work/src/lib.rs:12:
 pub fn f() {}
-pub fn g(){}
+pub fn g() {}
";
        let outcome = RustfmtParser.parse("rustfmt", stdout, "");
        assert_eq!(outcome.skipped_lines, 0);
        assert_eq!(
            outcome.issues,
            vec![
                Issue::new("rustfmt", "/work/src/main.rs", 1, "Needs formatting")
                    .with_severity(Severity::Warning),
                Issue::new("rustfmt", "/work/src/lib.rs", 12, "Needs formatting")
                    .with_severity(Severity::Warning),
            ]
        );
    }

    #[test]
    fn test_errors_and_unknown_lines() {
        let stderr = "Error writing files: failed to resolve mod `missing`\nWarning: can't set `imports_granularity`\n";
        let outcome = RustfmtParser.parse("rustfmt", "", stderr);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].file, NO_FILE);
        assert!(outcome.issues[0].message.starts_with("writing files"));
        assert_eq!(outcome.skipped_lines, 1);
    }
}
