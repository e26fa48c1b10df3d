//! # linthub_core
//!
//! Tool orchestration and result aggregation for linthub.
//!
//! The pipeline is strictly downstream:
//! registry → planner → runner → parsers → aggregator → formatters.
//! [`Engine`] wires the stages together for one invocation.

pub mod aggregate;
pub mod config;
pub mod doctor;
mod engine;
pub mod environment;
mod error;
pub mod files;
pub mod format;
pub mod install;
pub mod issue;
pub mod parsers;
pub mod planner;
pub mod process;
pub mod registry;
pub mod result;
pub mod runner;
pub mod version;

pub use aggregate::{AggregatedReport, EXIT_CLEAN, EXIT_ERROR, EXIT_ISSUES, GroupBy, combine};
pub use config::{Config, OptionValue};
pub use doctor::{DoctorReport, Health, check_tools};
pub use engine::Engine;
pub use environment::Environment;
pub use error::EngineError;
pub use files::FileFinder;
pub use format::{OutputFormat, render};
pub use install::{InstallPolicy, PackageManager};
pub use issue::{Issue, IssueKind, Severity};
pub use planner::{ExecutionPlan, SkipReason, SkippedTool, SystemProbe, ToolProbe};
pub use registry::{ManifestSource, ToolRegistry};
pub use result::{ExecutionResult, ExecutionStatus, Mode};
