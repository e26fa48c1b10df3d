//! Project dependency installation.
//!
//! Some tools need project dependencies on disk before they can run (`tsc`
//! needs `node_modules`). When auto-install is on, the first tool needing a
//! given install directory triggers one install through the configured
//! package-manager chain; every other tool waits on the same result.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use linthub_manifest::DependencySpec;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::process::{self, CommandSpec, ProcessError};

/// Entries ignored when deciding whether an install directory is populated.
const IGNORED_ENTRIES: &[&str] = &[".bin"];

/// Why an install attempt did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstallError {
    #[error("no package manager found (tried {0})")]
    NoPackageManager(String),

    #[error("{program} install failed: {message}")]
    Failed { program: String, message: String },

    #[error("{program} install timed out after {seconds}s")]
    TimedOut { program: String, seconds: u64 },
}

/// One package manager: a lockfile-respecting command and a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManager {
    pub program: String,
    #[serde(default)]
    pub frozen_args: Vec<String>,
    pub install_args: Vec<String>,
}

/// Ordered package-manager chain plus the install timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallPolicy {
    #[serde(default = "default_managers")]
    pub managers: Vec<PackageManager>,
    /// Seconds.
    #[serde(default = "default_install_timeout")]
    pub timeout: u64,
}

fn default_install_timeout() -> u64 {
    120
}

fn default_managers() -> Vec<PackageManager> {
    let args = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
    vec![
        PackageManager {
            program: "bun".to_string(),
            frozen_args: args(&["install", "--frozen-lockfile", "--ignore-scripts"]),
            install_args: args(&["install", "--ignore-scripts"]),
        },
        PackageManager {
            program: "npm".to_string(),
            frozen_args: args(&["ci", "--ignore-scripts"]),
            install_args: args(&["install", "--ignore-scripts"]),
        },
    ]
}

impl Default for InstallPolicy {
    fn default() -> Self {
        Self {
            managers: default_managers(),
            timeout: default_install_timeout(),
        }
    }
}

/// True when the project declares dependencies (`dep.manifest` exists) but
/// the install directory is missing or holds nothing but ignored entries.
pub fn needs_install(root: &Path, dep: &DependencySpec) -> bool {
    if !root.join(&dep.manifest).is_file() {
        return false;
    }
    let dir = root.join(&dep.install_dir);
    match fs::read_dir(&dir) {
        Ok(entries) => !entries.flatten().any(|entry| {
            let name = entry.file_name();
            !IGNORED_ENTRIES.iter().any(|ignored| name == *ignored)
        }),
        Err(_) => true,
    }
}

enum Attempt {
    Succeeded,
    Missing,
    Failed(InstallError),
}

async fn attempt(root: &Path, program: &str, args: &[String], timeout: Duration) -> Attempt {
    let spec = CommandSpec::new(program).args(args).cwd(root);
    match process::run(&spec, timeout).await {
        Ok(output) if output.success() => Attempt::Succeeded,
        Ok(output) if output.timed_out => Attempt::Failed(InstallError::TimedOut {
            program: program.to_string(),
            seconds: timeout.as_secs(),
        }),
        Ok(output) => {
            let message = if output.stderr.trim().is_empty() {
                output.stdout.trim().to_string()
            } else {
                output.stderr.trim().to_string()
            };
            Attempt::Failed(InstallError::Failed {
                program: program.to_string(),
                message,
            })
        }
        Err(ProcessError::NotFound { .. }) => Attempt::Missing,
        Err(e) => Attempt::Failed(InstallError::Failed {
            program: program.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Installs dependencies in `root` with the first available manager,
/// trying its frozen command before the mutable one.
pub async fn install(root: &Path, policy: &InstallPolicy) -> Result<(), InstallError> {
    let timeout = Duration::from_secs(policy.timeout);

    for manager in &policy.managers {
        let mut last_failure = None;
        for args in [&manager.frozen_args, &manager.install_args] {
            if args.is_empty() {
                continue;
            }
            info!("Installing dependencies: {} {}", manager.program, args.join(" "));
            match attempt(root, &manager.program, args, timeout).await {
                Attempt::Succeeded => return Ok(()),
                Attempt::Missing => {
                    debug!("{} is not installed", manager.program);
                    last_failure = None;
                    break;
                }
                Attempt::Failed(e) => {
                    debug!("{}", e);
                    last_failure = Some(e);
                }
            }
        }
        if let Some(e) = last_failure {
            return Err(e);
        }
    }

    let tried: Vec<&str> = policy.managers.iter().map(|m| m.program.as_str()).collect();
    Err(InstallError::NoPackageManager(tried.join(", ")))
}

/// Run-once barrier for installs, keyed by install directory.
pub struct InstallGate {
    root: PathBuf,
    policy: InstallPolicy,
    cells: Mutex<HashMap<PathBuf, Arc<OnceCell<Result<(), InstallError>>>>>,
}

impl InstallGate {
    pub fn new(root: impl Into<PathBuf>, policy: InstallPolicy) -> Self {
        Self {
            root: root.into(),
            policy,
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Makes sure `dep` is satisfied, installing at most once per run.
    ///
    /// Concurrent callers for the same install directory wait for the first
    /// caller's attempt and share its result.
    pub async fn ensure(&self, dep: &DependencySpec) -> Result<(), InstallError> {
        let key = self.root.join(&dep.install_dir);
        let cell = {
            let mut cells = self.cells.lock();
            Arc::clone(cells.entry(key).or_default())
        };

        cell.get_or_init(|| async {
            if !needs_install(&self.root, dep) {
                return Ok(());
            }
            let result = install(&self.root, &self.policy).await;
            match &result {
                Ok(()) => info!("Installed dependencies into {}", dep.install_dir),
                Err(e) => warn!("Dependency install failed: {}", e),
            }
            result
        })
        .await
        .clone()
    }
}
