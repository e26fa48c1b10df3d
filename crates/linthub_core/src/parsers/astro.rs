use super::tsc::kind_for;
use super::{OutputParser, ParseOutcome, Pattern, combined, normalize_path};
use crate::issue::{Issue, Severity};

/// `astro check`.
///
/// Accepts both `file:line:col - error ts(2322): msg` and the tsc-style
/// `file(line,col): error TS2322: msg`, and ignores astro's timestamped log
/// lines and summaries.
pub struct AstroParser;

pub(crate) static ISSUE_RE: Pattern = Pattern::new(concat!(
    r"(?i)^(?P<file>.+?)",
    r"(?:\((?P<lp>\d+),(?P<cp>\d+)\)|:(?P<lc>\d+):(?P<cc>\d+))",
    r"(?:\s*[-:]\s*|\s+)",
    r"(?P<sev>error|warning|hint)?\s*",
    r"(?:(?P<code>ts\(?\d+\)?)[:\s]+)?",
    r"(?P<msg>.+)$",
));

pub(crate) static TIMESTAMP_RE: Pattern = Pattern::new(r"^\d{1,2}:\d{2}:\d{2}\s");

const SUMMARY_PREFIXES: &[&str] = &["Result", "Found", "Checking", "..."];

fn is_noise(line: &str) -> bool {
    SUMMARY_PREFIXES.iter().any(|p| line.starts_with(p))
        || TIMESTAMP_RE.get().is_match(line)
}

/// `ts(2307)` / `ts2307` -> `TS2307`.
fn normalize_code(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    format!("TS{digits}")
}

impl OutputParser for AstroParser {
    fn parse(&self, tool: &str, stdout: &str, stderr: &str) -> ParseOutcome {
        let text = combined(stdout, stderr);
        let mut outcome = ParseOutcome::default();
        let re = ISSUE_RE.get();

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || is_noise(line) {
                continue;
            }
            let Some(caps) = re.captures(line) else {
                outcome.skip();
                continue;
            };

            let line_no = caps.name("lp").or_else(|| caps.name("lc"));
            let col = caps.name("cp").or_else(|| caps.name("cc"));
            let Some(Ok(line_no)) = line_no.map(|m| m.as_str().parse::<u32>()) else {
                outcome.skip();
                continue;
            };
            let col = col
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .unwrap_or(1);

            let code = caps
                .name("code")
                .map(|m| normalize_code(m.as_str()))
                .unwrap_or_default();
            let message = caps["msg"].trim();
            let severity = caps
                .name("sev")
                .map(|m| Severity::from_label(m.as_str()))
                .unwrap_or(Severity::Error);

            outcome.push(
                Issue::new(tool, normalize_path(&caps["file"]), line_no, message)
                    .with_column(col)
                    .with_kind(kind_for(&code, message))
                    .with_code(code)
                    .with_severity(severity),
            );
        }
        outcome
    }
}
