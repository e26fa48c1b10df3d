//! Result aggregation.
//!
//! [`combine`] is a pure function: the same results always produce the same
//! report, which keeps every formatter's output byte-identical across runs.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::issue::{Issue, Severity};
use crate::planner::SkippedTool;
use crate::result::{ExecutionResult, ExecutionStatus, Mode};

/// Exit code for a clean run.
pub const EXIT_CLEAN: u8 = 0;
/// Exit code when issues were found.
pub const EXIT_ISSUES: u8 = 1;
/// Exit code for execution or configuration errors.
pub const EXIT_ERROR: u8 = 2;

/// How issues are grouped in the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    File,
    Code,
    None,
    /// By file when issues span more than one file, otherwise flat.
    #[default]
    Auto,
}

impl GroupBy {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupBy::File => "file",
            GroupBy::Code => "code",
            GroupBy::None => "none",
            GroupBy::Auto => "auto",
        }
    }

    fn resolve(self, issues: &[Issue]) -> GroupBy {
        match self {
            GroupBy::Auto => {
                let files: BTreeSet<&str> = issues.iter().map(|i| i.file.as_str()).collect();
                if files.len() > 1 {
                    GroupBy::File
                } else {
                    GroupBy::None
                }
            }
            other => other,
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(GroupBy::File),
            "code" => Ok(GroupBy::Code),
            "none" => Ok(GroupBy::None),
            "auto" => Ok(GroupBy::Auto),
            other => Err(format!(
                "unknown grouping '{}' (expected file, code, none or auto)",
                other
            )),
        }
    }
}

/// Issues sharing a file or code. `key` is empty for the flat group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueGroup {
    pub key: String,
    pub issues: Vec<Issue>,
}

/// Counts derived from the results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_issues: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub by_tool: BTreeMap<String, usize>,
    pub by_file: BTreeMap<String, usize>,
    pub by_code: BTreeMap<String, usize>,
    pub tools_run: usize,
    pub tools_skipped: usize,
}

/// Everything a formatter needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedReport {
    pub mode: Mode,
    /// In plan order.
    pub results: Vec<ExecutionResult>,
    pub skipped: Vec<SkippedTool>,
    /// Grouping actually applied; never `Auto`.
    pub group_by: GroupBy,
    pub groups: Vec<IssueGroup>,
    pub summary: Summary,
    pub exit_code: u8,
}

impl AggregatedReport {
    /// All issues in group order.
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.groups.iter().flat_map(|g| g.issues.iter())
    }

    pub fn has_issues(&self) -> bool {
        self.summary.total_issues > 0
    }
}

/// Merges per-tool results into one report.
pub fn combine(
    results: Vec<ExecutionResult>,
    skipped: Vec<SkippedTool>,
    mode: Mode,
    group_by: GroupBy,
) -> AggregatedReport {
    let issues: Vec<Issue> = results
        .iter()
        .flat_map(|r| r.issues.iter().cloned())
        .collect();

    let group_by = group_by.resolve(&issues);
    let summary = summarize(&issues, results.len(), skipped.len());
    let exit_code = exit_code(&results, mode);
    let groups = group(issues, group_by);

    AggregatedReport {
        mode,
        results,
        skipped,
        group_by,
        groups,
        summary,
        exit_code,
    }
}

/// Overall exit code.
///
/// Execution failures win; issues fail only a check run.
pub fn exit_code(results: &[ExecutionResult], mode: Mode) -> u8 {
    if results.iter().any(|r| r.status.is_execution_failure()) {
        return EXIT_ERROR;
    }
    let found = results.iter().any(|r| {
        r.has_issues()
            || matches!(
                r.status,
                ExecutionStatus::IssuesFound | ExecutionStatus::DependencyMissing
            )
    });
    if found && mode == Mode::Check {
        EXIT_ISSUES
    } else {
        EXIT_CLEAN
    }
}

fn summarize(issues: &[Issue], tools_run: usize, tools_skipped: usize) -> Summary {
    let mut summary = Summary {
        total_issues: issues.len(),
        tools_run,
        tools_skipped,
        ..Default::default()
    };
    for issue in issues {
        match issue.severity {
            Severity::Error => summary.errors += 1,
            Severity::Warning => summary.warnings += 1,
            Severity::Info => summary.infos += 1,
        }
        *summary.by_tool.entry(issue.tool.clone()).or_default() += 1;
        *summary.by_file.entry(issue.file.clone()).or_default() += 1;
        if let Some(code) = &issue.code {
            *summary.by_code.entry(code.clone()).or_default() += 1;
        }
    }
    summary
}

fn group(issues: Vec<Issue>, group_by: GroupBy) -> Vec<IssueGroup> {
    let key_of = |issue: &Issue| -> String {
        match group_by {
            GroupBy::File => issue.file.clone(),
            GroupBy::Code => issue.code.clone().unwrap_or_else(|| "-".to_string()),
            GroupBy::None | GroupBy::Auto => String::new(),
        }
    };

    if issues.is_empty() {
        return Vec::new();
    }
    if matches!(group_by, GroupBy::None | GroupBy::Auto) {
        return vec![IssueGroup {
            key: String::new(),
            issues,
        }];
    }

    let mut groups: Vec<IssueGroup> = Vec::new();
    let mut index: BTreeMap<String, usize> = BTreeMap::new();
    for issue in issues {
        let key = key_of(&issue);
        match index.get(&key) {
            Some(&i) => groups[i].issues.push(issue),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(IssueGroup {
                    key,
                    issues: vec![issue],
                });
            }
        }
    }
    for group in &mut groups {
        // stable: equal lines keep insertion order
        group.issues.sort_by_key(|issue| issue.line);
    }
    groups
}
