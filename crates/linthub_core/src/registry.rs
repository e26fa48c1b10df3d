//! Tool registry.
//!
//! Holds every known [`ToolDescriptor`] together with its compiled file
//! matcher, and answers which tools apply to a set of files.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use linthub_manifest::{ToolDescriptor, ToolManifest};
use rayon::prelude::*;
use tracing::debug;

use crate::EngineError;

/// Where descriptors are loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    /// The manifest compiled into the binary.
    Builtin,
    /// A user-supplied manifest file.
    File(PathBuf),
}

struct RegisteredTool {
    descriptor: Arc<ToolDescriptor>,
    matcher: GlobSet,
}

impl RegisteredTool {
    fn matches(&self, path: &Path) -> bool {
        if self.matcher.is_match(path) {
            return true;
        }
        path.file_name()
            .is_some_and(|name| self.matcher.is_match(Path::new(name)))
    }
}

/// Orders descriptors by priority, then by name.
pub fn by_priority(a: &ToolDescriptor, b: &ToolDescriptor) -> Ordering {
    a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name))
}

/// Registry of known tools keyed by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every descriptor from `source`.
    ///
    /// A malformed manifest is a configuration error.
    pub fn discover(source: &ManifestSource) -> Result<Self, EngineError> {
        let manifest = match source {
            ManifestSource::Builtin => ToolManifest::builtin(),
            ManifestSource::File(path) => ToolManifest::from_file(path),
        }
        .map_err(|e| EngineError::config(e.to_string()))?;

        let mut registry = Self::new();
        for descriptor in manifest.tools {
            registry.register(descriptor)?;
        }
        debug!("Registered {} tools from {:?}", registry.len(), source);
        Ok(registry)
    }

    /// Registers a descriptor. Re-registering a name replaces the previous entry.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), EngineError> {
        let matcher = build_matcher(&descriptor)?;
        if self.tools.contains_key(&descriptor.name) {
            debug!("Replacing registered tool {}", descriptor.name);
        }
        self.tools.insert(
            descriptor.name.clone(),
            RegisteredTool {
                descriptor: Arc::new(descriptor),
                matcher,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ToolDescriptor>> {
        self.tools.get(name).map(|tool| &tool.descriptor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// All descriptors, sorted by priority then name.
    pub fn descriptors(&self) -> Vec<Arc<ToolDescriptor>> {
        let mut all: Vec<_> = self
            .tools
            .values()
            .map(|tool| Arc::clone(&tool.descriptor))
            .collect();
        all.sort_by(|a, b| by_priority(a, b));
        all
    }

    /// Descriptors whose file patterns match at least one of `files`,
    /// sorted by priority then name.
    pub fn applicable(&self, files: &[PathBuf]) -> Vec<Arc<ToolDescriptor>> {
        let mut matched: Vec<_> = self
            .tools
            .values()
            .collect::<Vec<_>>()
            .par_iter()
            .filter(|tool| files.iter().any(|file| tool.matches(file)))
            .map(|tool| Arc::clone(&tool.descriptor))
            .collect();
        matched.sort_by(|a, b| by_priority(a, b));
        matched
    }

    /// The subset of `files` that `name` applies to, in input order.
    pub fn matching_files(&self, name: &str, files: &[PathBuf]) -> Vec<PathBuf> {
        match self.tools.get(name) {
            Some(tool) => files
                .iter()
                .filter(|file| tool.matches(file))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }
}

fn build_matcher(descriptor: &ToolDescriptor) -> Result<GlobSet, EngineError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in &descriptor.file_patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            EngineError::config(format!(
                "Invalid file pattern {:?} for {}: {}",
                pattern, descriptor.name, e
            ))
        })?;
        builder.add(glob);
        // Directory patterns also match below any root, e.g. absolute paths.
        if pattern.contains('/')
            && !pattern.starts_with("**")
            && !pattern.starts_with('/')
            && let Ok(anchored) = Glob::new(&format!("**/{}", pattern))
        {
            builder.add(anchored);
        }
    }
    builder.build().map_err(|e| {
        EngineError::config(format!(
            "Failed to build file matcher for {}: {}",
            descriptor.name, e
        ))
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use linthub_manifest::{ParserKind, ToolCommand, ToolDescriptor};

    /// Minimal descriptor for tests.
    pub fn descriptor(name: &str, priority: i32, patterns: &[&str]) -> ToolDescriptor {
        ToolDescriptor {
            name: name.to_string(),
            description: None,
            priority,
            can_check: true,
            can_fix: false,
            conflicts_with: Vec::new(),
            file_patterns: patterns.iter().map(|p| p.to_string()).collect(),
            default_timeout: 30,
            min_version: None,
            command: ToolCommand {
                program: name.to_string(),
                check_args: vec!["{paths}".to_string()],
                fix_args: Vec::new(),
            },
            version_command: None,
            parser: ParserKind::Colon,
            dependency: None,
            options: Default::default(),
        }
    }
}
