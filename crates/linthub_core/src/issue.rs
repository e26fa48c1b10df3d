//! The canonical issue model every tool's output is normalized into.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity level for issues.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error - must be fixed.
    #[default]
    Error,
    /// Warning - should be reviewed.
    Warning,
    /// Info - informational message.
    Info,
}

impl Severity {
    /// Maps the many spellings tools use onto the three levels.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "warning" | "warn" | "style" => Severity::Warning,
            "info" | "note" | "hint" | "help" => Severity::Info,
            _ => Severity::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an issue says about the project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The code under check is wrong.
    #[default]
    Violation,
    /// The environment is incomplete (missing module, missing type definitions).
    DependencyMissing,
    /// Output the parser could not understand, passed through verbatim.
    Unparsed,
}

/// A single finding attributed to exactly one tool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Issue {
    pub tool: String,
    pub file: String,
    /// 1-based; `0` for file-level findings such as "needs formatting".
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub kind: IssueKind,
}

impl Issue {
    /// Creates a new error-level violation.
    pub fn new(
        tool: impl Into<String>,
        file: impl Into<String>,
        line: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            file: file.into(),
            line,
            column: None,
            code: None,
            message: message.into(),
            severity: Severity::Error,
            kind: IssueKind::Violation,
        }
    }

    pub fn with_column(mut self, column: u32) -> Self {
        self.column = Some(column);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        self.code = (!code.is_empty()).then_some(code);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_kind(mut self, kind: IssueKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_dependency_missing(&self) -> bool {
        self.kind == IssueKind::DependencyMissing
    }

    pub fn is_unparsed(&self) -> bool {
        self.kind == IssueKind::Unparsed
    }

    /// `file:line[:column]` for display.
    pub fn location(&self) -> String {
        match self.column {
            Some(column) => format!("{}:{}:{}", self.file, self.line, column),
            None => format!("{}:{}", self.file, self.line),
        }
    }
}
