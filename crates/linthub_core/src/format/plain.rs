use super::table::Table;
use super::{group_heading, summary_rows, totals_line};
use crate::aggregate::AggregatedReport;
use crate::issue::Issue;

/// `file:line[:col]: severity [code] [tool] message`, continuation lines indented.
fn issue_line(issue: &Issue, indent: &str) -> String {
    let mut head = format!("{}{}: {}", indent, issue.location(), issue.severity);
    if let Some(code) = &issue.code {
        head.push(' ');
        head.push_str(code);
    }
    head.push_str(&format!(" [{}]", issue.tool));

    let mut lines = issue.message.lines();
    let mut out = match lines.next() {
        Some(first) => format!("{} {}", head, first),
        None => head,
    };
    for rest in lines {
        out.push('\n');
        out.push_str(indent);
        out.push_str("    ");
        out.push_str(rest);
    }
    out
}

pub(super) fn render(report: &AggregatedReport) -> String {
    let mut out = String::new();

    for group in &report.groups {
        let indent = match group_heading(report, &group.key) {
            Some(heading) => {
                out.push_str(&heading);
                out.push('\n');
                "  "
            }
            None => "",
        };
        for issue in &group.issues {
            out.push_str(&issue_line(issue, indent));
            out.push('\n');
        }
        out.push('\n');
    }

    let mut summary = Table::new(&[]);
    for row in summary_rows(report) {
        summary.push(row.cells());
    }
    out.push_str(&summary.plain());
    out.push_str(&totals_line(report));
    out.push('\n');
    out
}
