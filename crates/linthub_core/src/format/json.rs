use serde::Serialize;

use super::{status_label, summary_rows};
use crate::EngineError;
use crate::aggregate::{AggregatedReport, GroupBy, Summary};
use crate::issue::{Issue, IssueKind, Severity};
use crate::result::{ExecutionStatus, Mode};

#[derive(Serialize)]
struct ReportView<'a> {
    mode: Mode,
    exit_code: u8,
    group_by: GroupBy,
    summary: &'a Summary,
    tools: Vec<ToolView<'a>>,
    skipped: Vec<SkippedView<'a>>,
    groups: Vec<GroupView<'a>>,
}

#[derive(Serialize)]
struct ToolView<'a> {
    tool: &'a str,
    status: ExecutionStatus,
    label: &'static str,
    exit_code: Option<i32>,
    duration_ms: u128,
    issues: usize,
    skipped_lines: usize,
    note: Option<&'a str>,
    notes: String,
}

#[derive(Serialize)]
struct SkippedView<'a> {
    tool: &'a str,
    reason: String,
}

#[derive(Serialize)]
struct GroupView<'a> {
    key: Option<&'a str>,
    issues: Vec<IssueView<'a>>,
}

/// Every field, present even when empty.
#[derive(Serialize)]
struct IssueView<'a> {
    tool: &'a str,
    file: &'a str,
    line: u32,
    column: Option<u32>,
    code: Option<&'a str>,
    severity: Severity,
    kind: IssueKind,
    message: &'a str,
}

impl<'a> From<&'a Issue> for IssueView<'a> {
    fn from(issue: &'a Issue) -> Self {
        Self {
            tool: &issue.tool,
            file: &issue.file,
            line: issue.line,
            column: issue.column,
            code: issue.code.as_deref(),
            severity: issue.severity,
            kind: issue.kind,
            message: &issue.message,
        }
    }
}

pub(super) fn render(report: &AggregatedReport) -> Result<String, EngineError> {
    let rows = summary_rows(report);
    let view = ReportView {
        mode: report.mode,
        exit_code: report.exit_code,
        group_by: report.group_by,
        summary: &report.summary,
        tools: report
            .results
            .iter()
            .zip(rows)
            .map(|(result, row)| ToolView {
                tool: &result.tool,
                status: result.status,
                label: status_label(result.status),
                exit_code: result.exit_code,
                duration_ms: result.duration.as_millis(),
                issues: result.issues.len(),
                skipped_lines: result.skipped_lines,
                note: result.note.as_deref(),
                notes: row.notes,
            })
            .collect(),
        skipped: report
            .skipped
            .iter()
            .map(|s| SkippedView {
                tool: &s.name,
                reason: s.reason.to_string(),
            })
            .collect(),
        groups: report
            .groups
            .iter()
            .map(|g| GroupView {
                key: (!g.key.is_empty()).then_some(g.key.as_str()),
                issues: g.issues.iter().map(IssueView::from).collect(),
            })
            .collect(),
    };

    let mut out = serde_json::to_string_pretty(&view)
        .map_err(|e| EngineError::internal(format!("Failed to serialize report: {}", e)))?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::test_support::sample_report;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    #[test]
    fn test_json_report() {
        let output = render(&sample_report(GroupBy::File)).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["mode"], "check");
        assert_eq!(value["exit_code"], 1);
        assert_eq!(value["group_by"], "file");
        assert_eq!(value["summary"]["total_issues"], 2);
        assert_eq!(value["summary"]["by_code"], json!({ "E501": 1, "F401": 1 }));
        assert_eq!(value["tools"][0]["tool"], "ruff");
        assert_eq!(value["tools"][0]["status"], "issues_found");
        assert_eq!(value["tools"][0]["label"], "FAIL");
        assert_eq!(value["tools"][1]["duration_ms"], 450);
        assert_eq!(
            value["skipped"],
            json!([{ "tool": "tsc", "reason": "deferred to astro-check" }])
        );
        assert_eq!(value["groups"][0]["key"], "src/app.py");
        assert_eq!(
            value["groups"][0]["issues"][0],
            json!({
                "tool": "ruff",
                "file": "src/app.py",
                "line": 3,
                "column": 8,
                "code": "F401",
                "severity": "error",
                "kind": "violation",
                "message": "`os` imported but unused"
            })
        );
    }

    #[test]
    fn test_flat_group_has_null_key() {
        let output = render(&sample_report(GroupBy::None)).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["groups"][0]["key"], Value::Null);
        assert_eq!(value["groups"][0]["issues"].as_array().unwrap().len(), 2);
    }
}
