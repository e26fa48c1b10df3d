//! Per-tool execution results.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::issue::Issue;

/// Whether a tool is asked to report or to rewrite files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Check,
    Fix,
}

impl Mode {
    pub fn is_fix(self) -> bool {
        self == Mode::Fix
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Check => "check",
            Mode::Fix => "fix",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of running one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Ok,
    IssuesFound,
    /// The tool ran but failed without reporting anything we understand.
    ToolError,
    Timeout,
    /// The executable is not installed.
    NotFound,
    /// The project's dependencies are missing.
    DependencyMissing,
}

impl ExecutionStatus {
    /// Statuses that mean the run itself went wrong.
    pub fn is_execution_failure(self) -> bool {
        matches!(
            self,
            ExecutionStatus::ToolError | ExecutionStatus::Timeout | ExecutionStatus::NotFound
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Ok => "ok",
            ExecutionStatus::IssuesFound => "issues_found",
            ExecutionStatus::ToolError => "tool_error",
            ExecutionStatus::Timeout => "timeout",
            ExecutionStatus::NotFound => "not_found",
            ExecutionStatus::DependencyMissing => "dependency_missing",
        }
    }

    /// Derives the status of a completed run from its parsed issues.
    ///
    /// `install_failed` is set when a dependency install was attempted for
    /// this tool and did not succeed.
    pub fn classify(issues: &[Issue], exit_code: Option<i32>, install_failed: bool) -> Self {
        let succeeded = exit_code == Some(0);
        if issues.is_empty() {
            return match (succeeded, install_failed) {
                (true, _) => ExecutionStatus::Ok,
                (false, true) => ExecutionStatus::DependencyMissing,
                (false, false) => ExecutionStatus::ToolError,
            };
        }
        if issues.iter().all(Issue::is_dependency_missing) {
            ExecutionStatus::DependencyMissing
        } else if !succeeded && issues.iter().all(Issue::is_unparsed) {
            ExecutionStatus::ToolError
        } else {
            ExecutionStatus::IssuesFound
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything known about one tool's run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub tool: String,
    pub mode: Mode,
    /// `None` when the process never exited on its own.
    pub exit_code: Option<i32>,
    pub duration: Duration,
    pub issues: Vec<Issue>,
    /// Combined stdout and stderr.
    pub raw_output: String,
    pub status: ExecutionStatus,
    pub skipped_lines: usize,
    /// Extra context: install failure, timeout, missing executable.
    pub note: Option<String>,
}

impl ExecutionResult {
    /// A result for a tool that produced no output at all.
    pub fn empty(tool: impl Into<String>, mode: Mode, status: ExecutionStatus) -> Self {
        Self {
            tool: tool.into(),
            mode,
            exit_code: None,
            duration: Duration::ZERO,
            issues: Vec::new(),
            raw_output: String::new(),
            status,
            skipped_lines: 0,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueKind;
    use rstest::rstest;

    fn violation() -> Issue {
        Issue::new("t", "a.py", 1, "bad")
    }

    fn missing() -> Issue {
        Issue::new("t", "a.ts", 1, "Cannot find module 'x'").with_kind(IssueKind::DependencyMissing)
    }

    fn unparsed() -> Issue {
        Issue::new("t", "-", 0, "Traceback ...").with_kind(IssueKind::Unparsed)
    }

    #[rstest]
    #[case::clean(vec![], Some(0), false, ExecutionStatus::Ok)]
    #[case::crash(vec![], Some(2), false, ExecutionStatus::ToolError)]
    #[case::killed(vec![], None, false, ExecutionStatus::ToolError)]
    #[case::crash_after_failed_install(vec![], Some(1), true, ExecutionStatus::DependencyMissing)]
    #[case::violations(vec![violation()], Some(1), false, ExecutionStatus::IssuesFound)]
    #[case::only_missing(vec![missing(), missing()], Some(2), false, ExecutionStatus::DependencyMissing)]
    #[case::mixed(vec![missing(), violation()], Some(2), false, ExecutionStatus::IssuesFound)]
    #[case::unparsed_failure(vec![unparsed()], Some(1), false, ExecutionStatus::ToolError)]
    #[case::unparsed_success(vec![unparsed()], Some(0), false, ExecutionStatus::IssuesFound)]
    fn test_classify(
        #[case] issues: Vec<Issue>,
        #[case] exit_code: Option<i32>,
        #[case] install_failed: bool,
        #[case] expected: ExecutionStatus,
    ) {
        assert_eq!(
            ExecutionStatus::classify(&issues, exit_code, install_failed),
            expected
        );
    }

    #[test]
    fn test_execution_failures() {
        assert!(ExecutionStatus::Timeout.is_execution_failure());
        assert!(ExecutionStatus::NotFound.is_execution_failure());
        assert!(ExecutionStatus::ToolError.is_execution_failure());
        assert!(!ExecutionStatus::DependencyMissing.is_execution_failure());
        assert!(!ExecutionStatus::IssuesFound.is_execution_failure());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ExecutionStatus::DependencyMissing).unwrap();
        assert_eq!(json, "\"dependency_missing\"");
        assert_eq!(ExecutionStatus::IssuesFound.to_string(), "issues_found");
    }
}
