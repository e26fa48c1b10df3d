//! Orchestration: plan once, run every planned tool, aggregate.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use linthub_manifest::DependencySpec;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::EngineError;
use crate::aggregate::{AggregatedReport, GroupBy, combine};
use crate::config::Config;
use crate::environment::Environment;
use crate::install::{InstallGate, needs_install};
use crate::planner::{ExecutionPlan, PlanRequest, PlannedTool, ToolProbe, compute_plan};
use crate::registry::ToolRegistry;
use crate::result::{ExecutionResult, ExecutionStatus, Mode};
use crate::runner::{ToolRunner, prepare};

/// Runs tools from a registry under one configuration.
pub struct Engine {
    registry: Arc<ToolRegistry>,
    config: Arc<Config>,
    env: Environment,
    root: PathBuf,
    ignore_conflicts: bool,
}

impl Engine {
    pub fn new(registry: ToolRegistry, config: Config, env: Environment) -> Self {
        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
            env,
            root: PathBuf::from("."),
            ignore_conflicts: false,
        }
    }

    /// Sets the directory tools run in and dependencies are installed to.
    /// Target paths are passed to tools unchanged, so they must be valid
    /// relative to this directory.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Overrides the auto-install decision, e.g. after the user declined the
    /// install prompt.
    pub fn set_auto_install(&mut self, enabled: bool) {
        Arc::make_mut(&mut self.config).auto_install = Some(enabled);
    }

    /// Runs conflicting tools together instead of deferring all but one.
    #[must_use]
    pub fn with_ignore_conflicts(mut self, ignore: bool) -> Self {
        self.ignore_conflicts = ignore;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configuration wins; otherwise enabled only inside containers.
    pub fn auto_install(&self) -> bool {
        self.config
            .auto_install
            .unwrap_or_else(|| self.env.default_auto_install())
    }

    pub fn max_workers(&self) -> usize {
        self.config
            .max_workers
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(4)
            .max(1)
    }

    /// Dependencies an auto-install would have to fetch for `files`, one
    /// entry per install directory.
    pub fn pending_installs(&self, files: &[PathBuf]) -> Vec<DependencySpec> {
        let mut pending: BTreeMap<String, DependencySpec> = BTreeMap::new();
        for tool in self.registry.applicable(files) {
            if let Some(dep) = &tool.dependency
                && needs_install(&self.root, dep)
            {
                pending
                    .entry(dep.install_dir.clone())
                    .or_insert_with(|| dep.clone());
            }
        }
        pending.into_values().collect()
    }

    /// Computes the execution plan for `files`.
    ///
    /// Also validates per-tool options for every planned tool, so option
    /// mistakes fail before anything runs.
    pub async fn plan<P: ToolProbe>(
        &self,
        mode: Mode,
        tools: Option<Vec<String>>,
        files: &[PathBuf],
        probe: &P,
    ) -> Result<Arc<ExecutionPlan>, EngineError> {
        for name in self.config.tool_options.keys() {
            if !self.registry.contains(name) {
                return Err(EngineError::config(format!(
                    "Options given for unknown tool '{}'",
                    name
                )));
            }
        }
        for name in self.config.timeouts.keys() {
            if !self.registry.contains(name) {
                return Err(EngineError::config(format!(
                    "Timeout given for unknown tool '{}'",
                    name
                )));
            }
        }

        let applicable = self.registry.applicable(files);
        debug!(
            "{} of {} tools apply to {} files",
            applicable.len(),
            self.registry.len(),
            files.len()
        );

        let request = PlanRequest {
            mode,
            tools,
            enabled: self.config.enabled.clone(),
            disabled: self.config.disabled.clone(),
            auto_install: self.auto_install(),
            ignore_conflicts: self.ignore_conflicts,
        };
        let plan = compute_plan(&request, &self.registry, &applicable, probe).await?;

        for planned in &plan.run {
            prepare(Arc::clone(&planned.descriptor), planned.mode, Vec::new(), &self.config)?;
        }
        Ok(Arc::new(plan))
    }

    /// Runs every planned tool, at most `max_workers` at a time, and
    /// aggregates the results in plan order.
    ///
    /// Dropping the returned future aborts all running tools.
    pub async fn execute(
        &self,
        plan: Arc<ExecutionPlan>,
        files: &[PathBuf],
        group_by: GroupBy,
    ) -> Result<AggregatedReport, EngineError> {
        let installer = self
            .auto_install()
            .then(|| Arc::new(InstallGate::new(&self.root, self.config.install.clone())));
        let runner = Arc::new(ToolRunner::new(&self.root, installer));
        let semaphore = Arc::new(Semaphore::new(self.max_workers()));

        let mut set = JoinSet::new();
        for (index, planned) in plan.run.iter().enumerate() {
            let paths = self.registry.matching_files(planned.name(), files);
            let invocation = prepare(
                Arc::clone(&planned.descriptor),
                planned.mode,
                paths,
                &self.config,
            )?;
            let runner = Arc::clone(&runner);
            let semaphore = Arc::clone(&semaphore);
            set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    let result = ExecutionResult::empty(
                        &invocation.tool.name,
                        invocation.mode,
                        ExecutionStatus::ToolError,
                    )
                    .with_note("worker pool closed");
                    return (index, result);
                };
                (index, runner.run(&invocation).await)
            });
        }

        let results = collect_results(set, &plan.run).await;

        info!("Finished {} tool(s)", results.len());
        Ok(combine(results, plan.skipped.clone(), plan.mode, group_by))
    }
}

/// Drains `set` into one result per planned tool, in plan order. A task that
/// panicked or was cancelled becomes a `ToolError` for its tool.
async fn collect_results(
    mut set: JoinSet<(usize, ExecutionResult)>,
    planned: &[PlannedTool],
) -> Vec<ExecutionResult> {
    let mut slots: Vec<Option<ExecutionResult>> = vec![None; planned.len()];
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => error!("Tool task failed: {}", e),
        }
    }
    slots
        .into_iter()
        .zip(planned)
        .map(|(slot, tool)| {
            slot.unwrap_or_else(|| {
                ExecutionResult::empty(tool.name(), tool.mode, ExecutionStatus::ToolError)
                    .with_note("tool task failed")
            })
        })
        .collect()
}
