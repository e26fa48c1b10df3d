use super::{
    NO_FILE, OutputParser, ParseOutcome, Pattern, combined, looks_like_missing_dependency,
    normalize_path,
};
use crate::issue::{Issue, IssueKind, Severity};

/// `tsc --noEmit --pretty false`.
pub struct TscParser;

/// Diagnostic codes meaning a module or its types are not installed.
pub const DEPENDENCY_CODES: &[&str] = &["TS2307", "TS2688", "TS7016"];

pub(crate) static LOCATED_RE: Pattern =
    Pattern::new(r"^(?P<file>.+?)\((?P<line>\d+),(?P<col>\d+)\):\s*(?P<sev>error|warning)\s+(?P<code>TS\d+):\s*(?P<msg>.+)$");

pub(crate) static GLOBAL_RE: Pattern =
    Pattern::new(r"^(?P<sev>error|warning)\s+(?P<code>TS\d+):\s*(?P<msg>.+)$");

/// Classifies a TypeScript diagnostic.
pub fn kind_for(code: &str, message: &str) -> IssueKind {
    if DEPENDENCY_CODES.contains(&code) || looks_like_missing_dependency(message) {
        IssueKind::DependencyMissing
    } else {
        IssueKind::Violation
    }
}

impl OutputParser for TscParser {
    fn parse(&self, tool: &str, stdout: &str, stderr: &str) -> ParseOutcome {
        let text = combined(stdout, stderr);
        let mut outcome = ParseOutcome::default();
        let (located, global) = (LOCATED_RE.get(), GLOBAL_RE.get());

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }

            // Multi-line messages continue on indented lines.
            if line.starts_with(char::is_whitespace) {
                match outcome.issues.last_mut() {
                    Some(last) => {
                        last.message.push(' ');
                        last.message.push_str(line.trim());
                    }
                    None => outcome.skip(),
                }
                continue;
            }

            if let Some(caps) = located.captures(line) {
                let (Ok(line_no), Ok(col)) =
                    (caps["line"].parse::<u32>(), caps["col"].parse::<u32>())
                else {
                    outcome.skip();
                    continue;
                };
                let code = &caps["code"];
                let message = caps["msg"].trim();
                outcome.push(
                    Issue::new(tool, normalize_path(&caps["file"]), line_no, message)
                        .with_column(col)
                        .with_code(code)
                        .with_severity(Severity::from_label(&caps["sev"]))
                        .with_kind(kind_for(code, message)),
                );
            } else if let Some(caps) = global.captures(line) {
                let code = &caps["code"];
                let message = caps["msg"].trim();
                outcome.push(
                    Issue::new(tool, NO_FILE, 0, message)
                        .with_code(code)
                        .with_severity(Severity::from_label(&caps["sev"]))
                        .with_kind(kind_for(code, message)),
                );
            } else {
                outcome.skip();
            }
        }
        outcome
    }
}
