use super::table::Table;
use super::{ISSUE_HEADERS, SUMMARY_HEADERS, group_heading, issue_cells, summary_rows, totals_line};
use crate::aggregate::AggregatedReport;

fn escape(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', "<br>")
}

pub(super) fn render(report: &AggregatedReport) -> String {
    let mut out = String::from("# linthub report\n\n## Summary\n\n");

    let mut summary = Table::new(&SUMMARY_HEADERS);
    for row in summary_rows(report) {
        summary.push(row.cells().iter().map(|c| escape(c)).collect());
    }
    out.push_str(&summary.markdown());
    out.push('\n');
    out.push_str(&totals_line(report));
    out.push('\n');

    if report.groups.is_empty() {
        return out;
    }

    out.push_str("\n## Issues\n");
    for group in &report.groups {
        out.push('\n');
        if let Some(heading) = group_heading(report, &group.key) {
            out.push_str(&format!("### {}\n\n", escape(&heading)));
        }
        let mut table = Table::new(&ISSUE_HEADERS);
        for issue in &group.issues {
            table.push(issue_cells(issue).iter().map(|c| escape(c)).collect());
        }
        out.push_str(&table.markdown());
    }
    out
}
