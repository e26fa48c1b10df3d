//! Runtime environment signals.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

const CGROUP_MARKERS: &[&str] = &["docker", "lxc", "containerd", "kubepods"];

/// Facts about the host that change engine defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Environment {
    /// Running inside a container. Enables auto-install and skips prompts.
    pub in_container: bool,
}

impl Environment {
    /// Probes the real host.
    pub fn detect() -> Self {
        let detector = ContainerDetector {
            root: PathBuf::from("/"),
            container_var: std::env::var("CONTAINER").ok(),
        };
        let in_container = detector.is_container();
        debug!("Container environment: {}", in_container);
        Self { in_container }
    }

    /// Whether dependencies are installed when no explicit choice was made.
    pub fn default_auto_install(&self) -> bool {
        self.in_container
    }

    /// Whether the install confirmation prompt is skipped.
    pub fn skips_prompts(&self) -> bool {
        self.in_container
    }
}

/// Container detection rooted at an arbitrary filesystem root.
#[derive(Debug, Clone)]
pub struct ContainerDetector {
    pub root: PathBuf,
    pub container_var: Option<String>,
}

impl ContainerDetector {
    pub fn is_container(&self) -> bool {
        if self.root.join(".dockerenv").exists() {
            return true;
        }
        if self.root.join("run/.containerenv").exists() {
            return true;
        }
        if self
            .container_var
            .as_deref()
            .is_some_and(|value| !value.is_empty())
        {
            return true;
        }
        cgroup_mentions_runtime(&self.root.join("proc/1/cgroup"))
    }
}

fn cgroup_mentions_runtime(path: &Path) -> bool {
    match fs::read(path) {
        Ok(bytes) => {
            let content = String::from_utf8_lossy(&bytes);
            CGROUP_MARKERS.iter().any(|marker| content.contains(marker))
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn detector(root: &Path, var: Option<&str>) -> ContainerDetector {
        ContainerDetector {
            root: root.to_path_buf(),
            container_var: var.map(str::to_string),
        }
    }

    #[test]
    fn test_bare_host_is_not_container() {
        let temp = TempDir::new().unwrap();
        assert!(!detector(temp.path(), None).is_container());
        assert!(!detector(temp.path(), Some("")).is_container());
    }

    #[rstest]
    #[case::dockerenv(".dockerenv")]
    #[case::podman("run/.containerenv")]
    fn test_marker_files(#[case] marker: &str) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(marker);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "").unwrap();
        assert!(detector(temp.path(), None).is_container());
    }

    #[test]
    fn test_container_env_var() {
        let temp = TempDir::new().unwrap();
        assert!(detector(temp.path(), Some("podman")).is_container());
    }

    #[rstest]
    #[case::docker("0::/system.slice/docker-abc.scope\n", true)]
    #[case::kubepods("0::/kubepods/besteffort/pod1\n", true)]
    #[case::plain_host("0::/init.scope\n", false)]
    fn test_cgroup_markers(#[case] content: &str, #[case] expected: bool) {
        let temp = TempDir::new().unwrap();
        let cgroup = temp.path().join("proc/1/cgroup");
        fs::create_dir_all(cgroup.parent().unwrap()).unwrap();
        fs::write(&cgroup, content).unwrap();
        assert_eq!(detector(temp.path(), None).is_container(), expected);
    }

    #[test]
    fn test_defaults_follow_container_flag() {
        let host = Environment::default();
        assert!(!host.default_auto_install());
        assert!(!host.skips_prompts());

        let container = Environment { in_container: true };
        assert!(container.default_auto_install());
        assert!(container.skips_prompts());
    }
}
