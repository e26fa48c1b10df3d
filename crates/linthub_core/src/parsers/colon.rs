use super::{OutputParser, ParseOutcome, Pattern, combined, normalize_path};
use crate::issue::{Issue, Severity};

/// Generic `file:line[:col]: ...` output.
///
/// Understands the common shapes behind the location prefix:
/// - `[error] message (rule)` (yamllint parsable)
/// - `CODE severity: message` (hadolint tty)
/// - `severity[code]: message` / `severity: message` (gcc-like)
/// - `message [rule]` (actionlint oneline)
pub struct ColonParser;

pub(crate) static LOCATION_RE: Pattern =
    Pattern::new(r"^(?P<file>[^:\s][^:]*):(?P<line>\d+)(?::(?P<col>\d+))?:?\s+(?P<rest>.+)$");

pub(crate) static BRACKETED_SEVERITY_RE: Pattern =
    Pattern::new(r"^\[(?P<sev>[a-zA-Z]+)\]\s+(?P<msg>.*?)(?:\s+\((?P<code>[\w/.-]+)\))?$");

pub(crate) static CODE_FIRST_RE: Pattern =
    Pattern::new(r"^(?P<code>[A-Z]+\d+)\s+(?P<sev>[a-z]+):\s+(?P<msg>.+)$");

pub(crate) static SEVERITY_FIRST_RE: Pattern =
    Pattern::new(r"^(?i)(?P<sev>error|warning|warn|info|note|style)(?:\[(?P<code>[^\]]+)\])?:\s*(?P<msg>.+)$");

pub(crate) static TRAILING_RULE_RE: Pattern =
    Pattern::new(r"^(?P<msg>.*?)\s+\[(?P<code>[\w/.-]+)\]$");

struct Detail<'a> {
    severity: Severity,
    code: &'a str,
    message: &'a str,
}

fn split_rest(rest: &str) -> Detail<'_> {
    for pattern in [&BRACKETED_SEVERITY_RE, &CODE_FIRST_RE, &SEVERITY_FIRST_RE] {
        if let Some(caps) = pattern.get().captures(rest) {
            return Detail {
                severity: caps
                    .name("sev")
                    .map(|m| Severity::from_label(m.as_str()))
                    .unwrap_or_default(),
                code: caps.name("code").map(|m| m.as_str()).unwrap_or_default(),
                message: caps.name("msg").map(|m| m.as_str()).unwrap_or(rest),
            };
        }
    }

    if let Some(caps) = TRAILING_RULE_RE.get().captures(rest)
        && let (Some(msg), Some(code)) = (caps.name("msg"), caps.name("code"))
    {
        return Detail {
            severity: Severity::Error,
            code: code.as_str(),
            message: msg.as_str(),
        };
    }

    Detail {
        severity: Severity::Error,
        code: "",
        message: rest,
    }
}

impl OutputParser for ColonParser {
    fn parse(&self, tool: &str, stdout: &str, stderr: &str) -> ParseOutcome {
        let text = combined(stdout, stderr);
        let mut outcome = ParseOutcome::default();
        let location = LOCATION_RE.get();

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let Some(caps) = location.captures(line) else {
                outcome.skip();
                continue;
            };
            let Ok(line_no) = caps["line"].parse::<u32>() else {
                outcome.skip();
                continue;
            };

            let detail = split_rest(caps["rest"].trim());
            let mut issue = Issue::new(
                tool,
                normalize_path(&caps["file"]),
                line_no,
                detail.message.trim(),
            )
            .with_code(detail.code)
            .with_severity(detail.severity);
            if let Some(col) = caps.name("col").and_then(|m| m.as_str().parse().ok()) {
                issue = issue.with_column(col);
            }
            outcome.push(issue);
        }
        outcome
    }
}
