//! Output parsers.
//!
//! Each tool's raw stdout/stderr is translated into [`Issue`]s by exactly one
//! parser, selected by the descriptor's [`ParserKind`]. Parsers never fail:
//! lines they do not understand are counted in
//! [`ParseOutcome::skipped_lines`], and a document that should have been
//! structured (invalid JSON from a JSON tool) becomes a single
//! [`IssueKind::Unparsed`] issue carrying the raw text.

mod astro;
mod black;
mod clippy;
mod colon;
mod mypy;
mod prettier;
mod ruff;
mod rustfmt;
mod shellcheck;
mod tsc;

use std::borrow::Cow;
use std::sync::OnceLock;

use linthub_manifest::ParserKind;
use regex::Regex;

use crate::issue::{Issue, IssueKind, Severity};

/// File name used for findings that are not tied to a file.
pub const NO_FILE: &str = "-";

/// Maximum number of raw lines carried by an unparsed passthrough issue.
const PASSTHROUGH_MAX_LINES: usize = 50;

/// Result of parsing one tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub issues: Vec<Issue>,
    /// Non-blank lines that matched nothing the parser knows.
    pub skipped_lines: usize,
}

impl ParseOutcome {
    fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    fn skip(&mut self) {
        self.skipped_lines += 1;
    }

    /// A single raw-passthrough issue for output in an unexpected format.
    fn passthrough(tool: &str, raw: &str) -> Self {
        let text: Vec<&str> = raw.trim().lines().take(PASSTHROUGH_MAX_LINES).collect();
        Self {
            issues: vec![
                Issue::new(tool, NO_FILE, 0, text.join("\n"))
                    .with_kind(IssueKind::Unparsed)
                    .with_severity(Severity::Error),
            ],
            skipped_lines: 0,
        }
    }
}

/// Translates one tool's raw output into issues.
pub trait OutputParser: Send + Sync {
    /// Parses output. Every returned issue has `tool` set to `tool`.
    fn parse(&self, tool: &str, stdout: &str, stderr: &str) -> ParseOutcome;
}

/// Returns the parser for `kind`.
pub fn parser_for(kind: ParserKind) -> &'static dyn OutputParser {
    match kind {
        ParserKind::Ruff => &ruff::RuffParser,
        ParserKind::Shellcheck => &shellcheck::ShellcheckParser,
        ParserKind::Tsc => &tsc::TscParser,
        ParserKind::Astro => &astro::AstroParser,
        ParserKind::Mypy => &mypy::MypyParser,
        ParserKind::Clippy => &clippy::ClippyParser,
        ParserKind::Prettier => &prettier::PrettierParser,
        ParserKind::Black => &black::BlackParser,
        ParserKind::Rustfmt => &rustfmt::RustfmtParser,
        ParserKind::Colon => &colon::ColonParser,
    }
}

/// A constant regex, compiled on first use.
pub(crate) struct Pattern {
    source: &'static str,
    compiled: OnceLock<Regex>,
}

impl Pattern {
    pub(crate) const fn new(source: &'static str) -> Self {
        Self {
            source,
            compiled: OnceLock::new(),
        }
    }

    pub(crate) fn get(&self) -> &Regex {
        self.compiled
            .get_or_init(|| Regex::new(self.source).expect("Invalid built-in pattern"))
    }
}

pub(crate) static ANSI_RE: Pattern = Pattern::new(r"\x1b\[[0-9;?]*[A-Za-z]");

/// Removes ANSI color and cursor escape sequences.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    if text.contains('\x1b') {
        ANSI_RE.get().replace_all(text, "")
    } else {
        Cow::Borrowed(text)
    }
}

const DEPENDENCY_PHRASES: &[&str] = &[
    "cannot find module",
    "cannot find type definition",
    "cannot find implementation or library stub",
    "library stubs not installed",
    "no module named",
    "can't find crate for",
];

/// Heuristic: does this message describe an incomplete environment rather
/// than a problem in the code?
pub fn looks_like_missing_dependency(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    DEPENDENCY_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Joins stdout and stderr into one ANSI-free document.
fn combined<'a>(stdout: &'a str, stderr: &'a str) -> Cow<'a, str> {
    match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (_, true) => strip_ansi(stdout),
        (true, false) => strip_ansi(stderr),
        (false, false) => Cow::Owned(strip_ansi(&format!("{stdout}\n{stderr}")).into_owned()),
    }
}

/// Normalizes Windows separators so paths group consistently.
fn normalize_path(path: &str) -> String {
    path.trim().replace('\\', "/")
}
