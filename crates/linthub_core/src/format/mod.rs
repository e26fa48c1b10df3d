//! Report formatters.
//!
//! Every format renders the same content: one summary row per planned or
//! skipped tool, then every issue with all of its fields, grouped the way the
//! report says. Rendering is pure; the same report always yields the same
//! bytes.

mod grid;
mod health;
mod json;
mod markdown;
mod plain;
mod table;
mod tools;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::EngineError;
use crate::aggregate::AggregatedReport;
use crate::issue::Issue;
use crate::result::{ExecutionResult, ExecutionStatus};

pub use health::{render_health, render_health_json};
pub use tools::{conflict_pairs, render_tool_list};

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Grid,
    Plain,
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Grid => "grid",
            OutputFormat::Plain => "plain",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grid" => Ok(OutputFormat::Grid),
            "plain" => Ok(OutputFormat::Plain),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!(
                "unknown output format '{}' (expected grid, plain, json or markdown)",
                other
            )),
        }
    }
}

/// Renders `report` in `format`.
pub fn render(report: &AggregatedReport, format: OutputFormat) -> Result<String, EngineError> {
    match format {
        OutputFormat::Grid => Ok(grid::render(report)),
        OutputFormat::Plain => Ok(plain::render(report)),
        OutputFormat::Json => json::render(report),
        OutputFormat::Markdown => Ok(markdown::render(report)),
    }
}

/// Each tool's captured output verbatim, under one header line per tool.
pub fn render_raw(report: &AggregatedReport) -> String {
    let mut out = String::new();
    for result in &report.results {
        out.push_str(&format!(
            "==> {} ({}) <==\n",
            result.tool,
            status_label(result.status)
        ));
        if !result.raw_output.is_empty() {
            out.push_str(&result.raw_output);
            if !result.raw_output.ends_with('\n') {
                out.push('\n');
            }
        }
        out.push('\n');
    }
    out
}

pub(crate) const SUMMARY_HEADERS: [&str; 5] = ["Tool", "Status", "Issues", "Time", "Notes"];
pub(crate) const ISSUE_HEADERS: [&str; 7] =
    ["File", "Line", "Column", "Code", "Severity", "Tool", "Message"];

/// One line of the per-tool summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SummaryRow {
    pub tool: String,
    pub label: &'static str,
    pub issues: Option<usize>,
    pub duration: Option<Duration>,
    pub notes: String,
}

impl SummaryRow {
    pub(crate) fn cells(&self) -> Vec<String> {
        vec![
            self.tool.clone(),
            self.label.to_string(),
            self.issues.map(|n| n.to_string()).unwrap_or_default(),
            self.duration.map(format_duration).unwrap_or_default(),
            self.notes.clone(),
        ]
    }
}

/// `PASS`, `FAIL`, `TIMEOUT` for results; skipped tools are `SKIP`.
pub fn status_label(status: ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::Ok => "PASS",
        ExecutionStatus::Timeout => "TIMEOUT",
        ExecutionStatus::IssuesFound
        | ExecutionStatus::ToolError
        | ExecutionStatus::NotFound
        | ExecutionStatus::DependencyMissing => "FAIL",
    }
}

fn result_notes(result: &ExecutionResult) -> String {
    let mut notes = Vec::new();
    match result.status {
        ExecutionStatus::NotFound => notes.push("not installed".to_string()),
        ExecutionStatus::DependencyMissing => notes.push("dependency missing".to_string()),
        ExecutionStatus::ToolError => notes.push("tool error".to_string()),
        _ => {}
    }
    if let Some(note) = &result.note {
        notes.push(note.clone());
    }
    if result.skipped_lines > 0 {
        notes.push(format!("{} unparsed lines", result.skipped_lines));
    }
    notes.join("; ")
}

pub(crate) fn summary_rows(report: &AggregatedReport) -> Vec<SummaryRow> {
    let ran = report.results.iter().map(|r| SummaryRow {
        tool: r.tool.clone(),
        label: status_label(r.status),
        issues: Some(r.issues.len()),
        duration: Some(r.duration),
        notes: result_notes(r),
    });
    let skipped = report.skipped.iter().map(|s| SummaryRow {
        tool: s.name.clone(),
        label: "SKIP",
        issues: None,
        duration: None,
        notes: s.reason.to_string(),
    });
    ran.chain(skipped).collect()
}

pub(crate) fn format_duration(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f64())
}

pub(crate) fn issue_cells(issue: &Issue) -> Vec<String> {
    vec![
        issue.file.clone(),
        issue.line.to_string(),
        issue.column.map(|c| c.to_string()).unwrap_or_default(),
        issue.code.clone().unwrap_or_default(),
        issue.severity.to_string(),
        issue.tool.clone(),
        issue.message.clone(),
    ]
}

/// Heading for a group, or `None` for the flat group.
pub(crate) fn group_heading(report: &AggregatedReport, key: &str) -> Option<String> {
    if key.is_empty() {
        return None;
    }
    Some(format!("{}: {}", report.group_by, key))
}

/// Closing line: totals, or a clean bill of health.
pub(crate) fn totals_line(report: &AggregatedReport) -> String {
    let summary = &report.summary;
    if summary.total_issues == 0 {
        return format!(
            "No issues found ({} tools run, {} skipped)",
            summary.tools_run, summary.tools_skipped
        );
    }
    format!(
        "Found {} issues ({} errors, {} warnings, {} info) from {} tools run, {} skipped",
        summary.total_issues,
        summary.errors,
        summary.warnings,
        summary.infos,
        summary.tools_run,
        summary.tools_skipped
    )
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_report;
    use super::*;
    use crate::aggregate::GroupBy;
    use rstest::rstest;

    #[test]
    fn test_summary_rows() {
        let rows = summary_rows(&sample_report(GroupBy::Auto));
        let labels: Vec<_> = rows.iter().map(|r| (r.tool.as_str(), r.label)).collect();
        assert_eq!(
            labels,
            vec![("ruff", "FAIL"), ("black", "PASS"), ("tsc", "SKIP")]
        );
        assert_eq!(rows[2].notes, "deferred to astro-check");
        assert_eq!(rows[0].cells()[3], "0.12s");
    }

    #[test]
    fn test_render_raw() {
        let mut report = sample_report(GroupBy::Auto);
        report.results[0].raw_output = "src/app.py:3:8: F401 `os` imported but unused".to_string();

        assert_eq!(
            render_raw(&report),
            "==> ruff (FAIL) <==\nsrc/app.py:3:8: F401 `os` imported but unused\n\n==> black (PASS) <==\n\n"
        );
    }

    #[test]
    fn test_result_notes() {
        let mut result = ExecutionResult::empty("tsc", crate::Mode::Check, ExecutionStatus::NotFound)
            .with_note("executable not found: tsc");
        assert_eq!(result_notes(&result), "not installed; executable not found: tsc");

        result.status = ExecutionStatus::IssuesFound;
        result.note = None;
        result.skipped_lines = 3;
        assert_eq!(result_notes(&result), "3 unparsed lines");
    }

    #[rstest]
    #[case(OutputFormat::Grid)]
    #[case(OutputFormat::Plain)]
    #[case(OutputFormat::Json)]
    #[case(OutputFormat::Markdown)]
    fn test_render_is_deterministic(#[case] format: OutputFormat) {
        let report = sample_report(GroupBy::File);
        assert_eq!(
            render(&report, format).unwrap(),
            render(&report, format).unwrap()
        );
    }

    #[rstest]
    #[case(OutputFormat::Grid)]
    #[case(OutputFormat::Plain)]
    #[case(OutputFormat::Json)]
    #[case(OutputFormat::Markdown)]
    fn test_every_issue_field_rendered(#[case] format: OutputFormat) {
        let report = sample_report(GroupBy::None);
        let output = render(&report, format).unwrap();
        for issue in report.issues() {
            for value in [
                issue.tool.clone(),
                issue.file.clone(),
                issue.line.to_string(),
                issue.column.unwrap().to_string(),
                issue.code.clone().unwrap(),
                issue.severity.to_string(),
                issue.message.clone(),
            ] {
                assert!(
                    output.contains(&value),
                    "{} output is missing {:?}:\n{}",
                    format,
                    value,
                    output
                );
            }
        }
        for tool in ["ruff", "black", "tsc"] {
            assert!(output.contains(tool));
        }
        assert!(output.contains("deferred to astro-check"));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("md".parse::<OutputFormat>(), Ok(OutputFormat::Markdown));
        assert!("sarif".parse::<OutputFormat>().is_err());
    }
}
