//! Tool health: installed versions against manifest minimums.

use std::fmt;
use std::sync::Arc;

use linthub_manifest::ToolDescriptor;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{EXIT_CLEAN, EXIT_ISSUES};
use crate::planner::ToolProbe;
use crate::version::{meets_minimum, normalize};

/// How one tool's installation looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Ok,
    Outdated,
    Missing,
    /// The manifest gives no way to ask the tool for its version.
    Unknown,
}

impl Health {
    pub fn as_str(self) -> &'static str {
        match self {
            Health::Ok => "ok",
            Health::Outdated => "outdated",
            Health::Missing => "missing",
            Health::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolHealth {
    pub tool: String,
    pub installed: Option<String>,
    pub minimum: Option<String>,
    pub health: Health,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DoctorReport {
    pub tools: Vec<ToolHealth>,
}

impl DoctorReport {
    pub fn count(&self, health: Health) -> usize {
        self.tools.iter().filter(|t| t.health == health).count()
    }

    /// Missing and outdated tools make the report unhealthy; tools without
    /// a version command do not.
    pub fn is_healthy(&self) -> bool {
        self.count(Health::Missing) == 0 && self.count(Health::Outdated) == 0
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_healthy() {
            EXIT_CLEAN
        } else {
            EXIT_ISSUES
        }
    }
}

/// Asks `probe` for every tool's version, in the given order.
pub async fn check_tools<P: ToolProbe>(
    tools: &[Arc<ToolDescriptor>],
    probe: &P,
) -> DoctorReport {
    let mut report = DoctorReport::default();
    for tool in tools {
        let minimum = tool.min_version.clone();
        let (installed, health) = if tool.version_command.is_none() {
            (None, Health::Unknown)
        } else {
            match probe.installed_version(tool).await {
                None => (None, Health::Missing),
                Some(version) => {
                    let health = match minimum.as_deref().and_then(normalize) {
                        Some(required) if !meets_minimum(&version, &required) => {
                            Health::Outdated
                        }
                        _ => Health::Ok,
                    };
                    (Some(version.to_string()), health)
                }
            }
        };
        debug!("{}: {}", tool.name, health);
        report.tools.push(ToolHealth {
            tool: tool.name.clone(),
            installed,
            minimum,
            health,
        });
    }
    report
}
