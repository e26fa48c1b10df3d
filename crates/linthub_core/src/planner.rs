//! Execution planning.
//!
//! Turns the applicable tool set into an ordered, conflict-free plan. Every
//! tool that was considered and left out is recorded with a reason, so the
//! summary can explain why something did not run.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use linthub_manifest::{DependencySpec, ToolDescriptor};
use semver::Version;
use tracing::{debug, info};

use crate::EngineError;
use crate::install::needs_install;
use crate::registry::{ToolRegistry, by_priority};
use crate::result::Mode;
use crate::version::{meets_minimum, normalize, query_version};

/// Why a tool is not part of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoMatchingFiles,
    CannotFix,
    CannotCheck,
    DisabledByConfig,
    NotEnabled,
    DependencyMissing { install_dir: String },
    VersionCheckFailed { installed: Version, required: Version },
    DeferredTo(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoMatchingFiles => f.write_str("no matching files"),
            SkipReason::CannotFix => f.write_str("cannot fix"),
            SkipReason::CannotCheck => f.write_str("cannot check"),
            SkipReason::DisabledByConfig => f.write_str("disabled by configuration"),
            SkipReason::NotEnabled => f.write_str("not enabled"),
            SkipReason::DependencyMissing { install_dir } => {
                write!(f, "{} not found", install_dir)
            }
            SkipReason::VersionCheckFailed {
                installed,
                required,
            } => write!(
                f,
                "version check failed ({} < {})",
                installed, required
            ),
            SkipReason::DeferredTo(tool) => write!(f, "deferred to {}", tool),
        }
    }
}

/// A tool that will run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTool {
    pub descriptor: Arc<ToolDescriptor>,
    pub mode: Mode,
}

impl PlannedTool {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// A tool that was considered and left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTool {
    pub name: String,
    pub priority: i32,
    pub reason: SkipReason,
}

impl SkippedTool {
    fn new(tool: &ToolDescriptor, reason: SkipReason) -> Self {
        Self {
            name: tool.name.clone(),
            priority: tool.priority,
            reason,
        }
    }
}

/// The ordered list of tools to run plus everything excluded.
///
/// Built once per invocation and shared read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub mode: Mode,
    pub run: Vec<PlannedTool>,
    pub skipped: Vec<SkippedTool>,
}

impl ExecutionPlan {
    pub fn is_empty(&self) -> bool {
        self.run.is_empty()
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.run.iter().map(PlannedTool::name).collect()
    }
}

/// What the user asked for.
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    pub mode: Mode,
    /// Explicitly requested tools; `None` means every applicable tool.
    pub tools: Option<Vec<String>>,
    /// Configured allow list.
    pub enabled: Option<Vec<String>>,
    /// Configured deny list.
    pub disabled: Vec<String>,
    pub auto_install: bool,
    /// Run conflicting tools side by side instead of deferring.
    pub ignore_conflicts: bool,
}

/// Questions the planner asks about the machine it runs on.
pub trait ToolProbe: Sync {
    /// The installed version of `tool`, if it can be determined.
    fn installed_version(
        &self,
        tool: &ToolDescriptor,
    ) -> impl Future<Output = Option<Version>> + Send;

    /// Whether the project satisfies `dep` without an install.
    fn dependency_ready(&self, dep: &DependencySpec) -> bool;
}

/// Probes the real system: runs version commands, inspects the project tree.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    root: PathBuf,
}

impl SystemProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ToolProbe for SystemProbe {
    fn installed_version(
        &self,
        tool: &ToolDescriptor,
    ) -> impl Future<Output = Option<Version>> + Send {
        let argv = tool.version_command.clone();
        let root = self.root.clone();
        async move { query_version(&argv?, &root).await }
    }

    fn dependency_ready(&self, dep: &DependencySpec) -> bool {
        !needs_install(&self.root, dep)
    }
}

/// Computes the execution plan.
///
/// `applicable` is the registry's answer for the discovered files. Requested
/// names unknown to the registry, and tools named explicitly for a mode they
/// do not support, are configuration errors.
pub async fn compute_plan<P: ToolProbe>(
    request: &PlanRequest,
    registry: &ToolRegistry,
    applicable: &[Arc<ToolDescriptor>],
    probe: &P,
) -> Result<ExecutionPlan, EngineError> {
    let mut skipped = Vec::new();
    let applicable_names: BTreeSet<&str> = applicable.iter().map(|t| t.name.as_str()).collect();

    // 1. requested tools against applicable ones, then mode support
    let candidates: Vec<Arc<ToolDescriptor>> = match &request.tools {
        Some(names) => {
            let mut picked = Vec::new();
            let mut seen = BTreeSet::new();
            for name in names {
                if !seen.insert(name.as_str()) {
                    continue;
                }
                let tool = registry
                    .get(name)
                    .ok_or_else(|| EngineError::config(format!("Unknown tool '{}'", name)))?;
                if let Some(reason) = unsupported(tool, request.mode) {
                    return Err(EngineError::config(format!("Tool '{}' {}", name, reason)));
                }
                if applicable_names.contains(name.as_str()) {
                    picked.push(Arc::clone(tool));
                } else {
                    skipped.push(SkippedTool::new(tool, SkipReason::NoMatchingFiles));
                }
            }
            picked
        }
        None => applicable
            .iter()
            .filter(|tool| match unsupported(tool, request.mode) {
                Some(reason) => {
                    skipped.push(SkippedTool::new(tool, reason));
                    false
                }
                None => true,
            })
            .cloned()
            .collect(),
    };

    let mut survivors = Vec::with_capacity(candidates.len());
    for tool in candidates {
        // 2. configuration overrides
        if request.disabled.iter().any(|d| *d == tool.name) {
            skipped.push(SkippedTool::new(&tool, SkipReason::DisabledByConfig));
            continue;
        }
        if let Some(enabled) = &request.enabled
            && !enabled.iter().any(|e| *e == tool.name)
        {
            skipped.push(SkippedTool::new(&tool, SkipReason::NotEnabled));
            continue;
        }

        // 3. dependency readiness
        if let Some(dep) = &tool.dependency
            && !request.auto_install
            && !probe.dependency_ready(dep)
        {
            skipped.push(SkippedTool::new(
                &tool,
                SkipReason::DependencyMissing {
                    install_dir: dep.install_dir.clone(),
                },
            ));
            continue;
        }

        // 4. minimum version
        if let Some(required) = tool.min_version.as_deref().and_then(normalize)
            && let Some(installed) = probe.installed_version(&tool).await
            && !meets_minimum(&installed, &required)
        {
            skipped.push(SkippedTool::new(
                &tool,
                SkipReason::VersionCheckFailed {
                    installed,
                    required,
                },
            ));
            continue;
        }

        survivors.push(tool);
    }

    // 5. conflicts, 6. ordering
    let (kept, deferred) = if request.ignore_conflicts {
        let mut kept = survivors;
        kept.sort_by(|a, b| by_priority(a, b));
        (kept, Vec::new())
    } else {
        resolve_conflicts(survivors)
    };
    skipped.extend(deferred);
    skipped.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.name.cmp(&b.name))
    });

    for skip in &skipped {
        debug!("Skipping {}: {}", skip.name, skip.reason);
    }
    info!(
        "Planned {} tool(s), skipped {}",
        kept.len(),
        skipped.len()
    );

    Ok(ExecutionPlan {
        mode: request.mode,
        run: kept
            .into_iter()
            .map(|descriptor| PlannedTool {
                descriptor,
                mode: request.mode,
            })
            .collect(),
        skipped,
    })
}

fn unsupported(tool: &ToolDescriptor, mode: Mode) -> Option<SkipReason> {
    match mode {
        Mode::Fix if !tool.can_fix => Some(SkipReason::CannotFix),
        Mode::Check if !tool.can_check => Some(SkipReason::CannotCheck),
        _ => None,
    }
}

/// Keeps one tool per connected component of the conflict graph: the one
/// with the lowest `(priority, name)`. Returns the kept tools sorted by
/// priority then name, and the deferred ones.
///
/// A conflict declared on either side counts.
pub fn resolve_conflicts(
    tools: Vec<Arc<ToolDescriptor>>,
) -> (Vec<Arc<ToolDescriptor>>, Vec<SkippedTool>) {
    let mut tools = tools;
    tools.sort_by(|a, b| by_priority(a, b));
    tools.dedup_by(|a, b| a.name == b.name);

    // Union-find over indices; the root of each set is its smallest index,
    // which after sorting is the preferred tool.
    let mut parent: Vec<usize> = (0..tools.len()).collect();
    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..tools.len() {
        for j in (i + 1)..tools.len() {
            if tools[i].declares_conflict(&tools[j].name)
                || tools[j].declares_conflict(&tools[i].name)
            {
                let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                if a != b {
                    parent[a.max(b)] = a.min(b);
                }
            }
        }
    }

    let mut kept = Vec::new();
    let mut deferred = Vec::new();
    let mut winners: BTreeMap<usize, String> = BTreeMap::new();
    for i in 0..tools.len() {
        let root = find(&mut parent, i);
        if root == i {
            winners.insert(i, tools[i].name.clone());
            kept.push(Arc::clone(&tools[i]));
        } else {
            let winner = winners
                .get(&root)
                .cloned()
                .unwrap_or_else(|| tools[root].name.clone());
            deferred.push(SkippedTool::new(&tools[i], SkipReason::DeferredTo(winner)));
        }
    }
    (kept, deferred)
}
