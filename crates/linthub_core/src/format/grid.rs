use super::table::Table;
use super::{ISSUE_HEADERS, SUMMARY_HEADERS, group_heading, issue_cells, summary_rows, totals_line};
use crate::aggregate::AggregatedReport;

fn one_line(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join(" ↵ ")
}

pub(super) fn render(report: &AggregatedReport) -> String {
    let mut out = String::new();

    for group in &report.groups {
        if let Some(heading) = group_heading(report, &group.key) {
            out.push_str(&heading);
            out.push('\n');
        }
        let mut table = Table::new(&ISSUE_HEADERS);
        for issue in &group.issues {
            let mut cells = issue_cells(issue);
            if let Some(message) = cells.last_mut() {
                *message = one_line(message);
            }
            table.push(cells);
        }
        out.push_str(&table.grid());
        out.push('\n');
    }

    out.push_str("Summary\n");
    let mut summary = Table::new(&SUMMARY_HEADERS);
    for row in summary_rows(report) {
        summary.push(row.cells());
    }
    out.push_str(&summary.grid());
    out.push('\n');
    out.push_str(&totals_line(report));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::GroupBy;
    use crate::format::test_support::sample_report;

    #[test]
    fn test_grid_report() {
        let output = render(&sample_report(GroupBy::File));
        insta::assert_snapshot!(output, @r"
        file: src/app.py
        +------------+------+--------+------+----------+------+--------------------------+
        | File       | Line | Column | Code | Severity | Tool | Message                  |
        +============+======+========+======+==========+======+==========================+
        | src/app.py | 3    | 8      | F401 | error    | ruff | `os` imported but unused |
        +------------+------+--------+------+----------+------+--------------------------+

        file: tests/test_app.py
        +-------------------+------+--------+------+----------+------+-------------------------+
        | File              | Line | Column | Code | Severity | Tool | Message                 |
        +===================+======+========+======+==========+======+=========================+
        | tests/test_app.py | 1    | 89     | E501 | warning  | ruff | Line too long (99 > 88) |
        +-------------------+------+--------+------+----------+------+-------------------------+

        Summary
        +-------+--------+--------+-------+-------------------------+
        | Tool  | Status | Issues | Time  | Notes                   |
        +=======+========+========+=======+=========================+
        | ruff  | FAIL   | 2      | 0.12s |                         |
        +-------+--------+--------+-------+-------------------------+
        | black | PASS   | 0      | 0.45s |                         |
        +-------+--------+--------+-------+-------------------------+
        | tsc   | SKIP   |        |       | deferred to astro-check |
        +-------+--------+--------+-------+-------------------------+

        Found 2 issues (1 errors, 1 warnings, 0 info) from 2 tools run, 1 skipped
        ");
    }

    #[test]
    fn test_multiline_message_flattened() {
        assert_eq!(one_line("Traceback\n  File x\nError"), "Traceback ↵   File x ↵ Error");
    }
}
