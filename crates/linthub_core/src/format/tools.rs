use std::collections::BTreeSet;
use std::sync::Arc;

use linthub_manifest::ToolDescriptor;

use super::table::Table;

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

/// Conflict pairs as `(preferred, deferred)`, declared on either side, each
/// reported once. Only tools present in `tools` are considered.
pub fn conflict_pairs(tools: &[Arc<ToolDescriptor>]) -> Vec<(String, String)> {
    let mut pairs = BTreeSet::new();
    for (i, a) in tools.iter().enumerate() {
        for b in &tools[i + 1..] {
            if a.declares_conflict(&b.name) || b.declares_conflict(&a.name) {
                let (first, second) = if (a.priority, &a.name) <= (b.priority, &b.name) {
                    (a, b)
                } else {
                    (b, a)
                };
                pairs.insert((
                    (first.priority, first.name.clone()),
                    second.name.clone(),
                ));
            }
        }
    }
    pairs
        .into_iter()
        .map(|((_, first), second)| (first, second))
        .collect()
}

/// Grid listing of `tools` in the given order.
pub fn render_tool_list(tools: &[Arc<ToolDescriptor>], show_conflicts: bool) -> String {
    let mut headers = vec!["Tool", "Priority", "Check", "Fix", "Files", "Description"];
    if show_conflicts {
        headers.push("Conflicts");
    }

    let mut table = Table::new(&headers);
    for tool in tools {
        let mut row = vec![
            tool.name.clone(),
            tool.priority.to_string(),
            yes_no(tool.can_check),
            yes_no(tool.can_fix),
            tool.file_patterns.join(" "),
            tool.description.clone().unwrap_or_default(),
        ];
        if show_conflicts {
            row.push(tool.conflicts_with.join(", "));
        }
        table.push(row);
    }

    let mut out = table.grid();
    if show_conflicts {
        let pairs = conflict_pairs(tools);
        out.push('\n');
        if pairs.is_empty() {
            out.push_str("No conflicts between known tools\n");
        } else {
            out.push_str("Conflict resolution:\n");
            for (kept, deferred) in pairs {
                out.push_str(&format!("  {} runs, {} is deferred\n", kept, deferred));
            }
        }
    }
    out.push_str(&format!("\n{} tools\n", tools.len()));
    out
}
