//! Target file discovery.
//!
//! Expands the paths given on the command line into a sorted list of files
//! using the `ignore` crate's parallel walker:
//! - `.gitignore` support
//! - hidden entries skipped, except directories tools target (`.github`)
//! - user and default exclude globs, pruned at directory level

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, Error, ParallelVisitor, ParallelVisitorBuilder, WalkBuilder, WalkState};
use tracing::{debug, info};

use crate::EngineError;

/// Directory names never descended into.
pub const DEFAULT_EXCLUDES: &[&str] = &["node_modules", ".git", ".venv", "venv", "target"];

/// Hidden directories that are still walked because tools target them.
pub const VISIBLE_HIDDEN_DIRS: &[&str] = &[".github"];

/// Finds the files a run should consider.
pub struct FileFinder {
    excludes: Arc<ExcludeMatcher>,
}

impl FileFinder {
    /// Creates a finder with the default excludes plus `patterns`.
    pub fn new(patterns: &[String]) -> Result<Self, EngineError> {
        Ok(Self {
            excludes: Arc::new(ExcludeMatcher::new(patterns)?),
        })
    }

    /// Expands `paths` into files. Files given directly are kept unless
    /// excluded; directories are walked.
    pub fn discover(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, EngineError> {
        let mut found = BTreeSet::new();
        let mut dirs = Vec::new();

        for path in paths {
            if !path.exists() {
                return Err(EngineError::config(format!(
                    "Path does not exist: {}",
                    path.display()
                )));
            }
            if path.is_dir() {
                dirs.push(path.clone());
            } else if !self.excludes.is_excluded(path) {
                found.insert(clean(path));
            }
        }

        if !dirs.is_empty() {
            found.extend(self.walk(&dirs));
        }

        info!("Discovered {} files", found.len());
        Ok(found.into_iter().collect())
    }

    fn walk(&self, dirs: &[PathBuf]) -> Vec<PathBuf> {
        let (tx, rx) = crossbeam_channel::bounded::<PathBuf>(1024);

        let mut builder = WalkBuilder::new(&dirs[0]);
        for dir in &dirs[1..] {
            builder.add(dir);
        }
        builder
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .hidden(false)
            .follow_links(false);

        // Collect concurrently so workers never block on a full channel.
        let receiver = spawn_receiver(rx);

        let mut visitor_builder = FileVisitorBuilder {
            tx,
            excludes: Arc::clone(&self.excludes),
        };
        builder.build_parallel().visit(&mut visitor_builder);
        drop(visitor_builder);

        receiver.join().unwrap_or_default()
    }
}

fn spawn_receiver(rx: Receiver<PathBuf>) -> thread::JoinHandle<Vec<PathBuf>> {
    thread::spawn(move || rx.iter().collect())
}

/// Drops a leading `./` so reported paths read naturally.
fn clean(path: &Path) -> PathBuf {
    path.strip_prefix(".").unwrap_or(path).to_path_buf()
}

struct FileVisitorBuilder {
    tx: Sender<PathBuf>,
    excludes: Arc<ExcludeMatcher>,
}

impl<'s> ParallelVisitorBuilder<'s> for FileVisitorBuilder {
    fn build(&mut self) -> Box<dyn ParallelVisitor + 's> {
        Box::new(FileVisitor {
            tx: self.tx.clone(),
            excludes: Arc::clone(&self.excludes),
        })
    }
}

struct FileVisitor {
    tx: Sender<PathBuf>,
    excludes: Arc<ExcludeMatcher>,
}

impl ParallelVisitor for FileVisitor {
    fn visit(&mut self, entry: Result<DirEntry, Error>) -> WalkState {
        match entry {
            Ok(dir_entry) => {
                let path = dir_entry.path();
                let is_dir = dir_entry.file_type().is_some_and(|ft| ft.is_dir());
                // Roots are always entered.
                if dir_entry.depth() > 0
                    && (is_skipped_hidden(&dir_entry, is_dir) || self.excludes.is_excluded(path))
                {
                    return if is_dir {
                        WalkState::Skip
                    } else {
                        WalkState::Continue
                    };
                }
                if dir_entry.file_type().is_some_and(|ft| ft.is_file())
                    && self.tx.send(clean(path)).is_err()
                {
                    return WalkState::Quit;
                }
            }
            Err(e) => debug!("Walk error: {}", e),
        }
        WalkState::Continue
    }
}

/// Dot entries are skipped, except the directories in [`VISIBLE_HIDDEN_DIRS`].
fn is_skipped_hidden(entry: &DirEntry, is_dir: bool) -> bool {
    let name = entry.file_name().to_string_lossy();
    if !name.starts_with('.') {
        return false;
    }
    !(is_dir && VISIBLE_HIDDEN_DIRS.iter().any(|dir| *dir == name))
}

struct ExcludeMatcher {
    set: GlobSet,
}

impl ExcludeMatcher {
    fn new(patterns: &[String]) -> Result<Self, EngineError> {
        let mut builder = GlobSetBuilder::new();
        let defaults = DEFAULT_EXCLUDES.iter().map(|s| s.to_string());
        for pattern in defaults.chain(patterns.iter().cloned()) {
            let glob = Glob::new(&pattern).map_err(|e| {
                EngineError::config(format!("Invalid exclude pattern {:?}: {}", pattern, e))
            })?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| EngineError::config(format!("Failed to build exclude set: {}", e)))?;
        Ok(Self { set })
    }

    /// A path is excluded if the whole path, the path without a leading
    /// `./`, or its final component matches. Walks prune excluded
    /// directories, so ancestors never need checking.
    fn is_excluded(&self, path: &Path) -> bool {
        let cleaned = clean(path);
        if self.set.is_match(path) || self.set.is_match(&cleaned) {
            return true;
        }
        path.file_name()
            .is_some_and(|name| self.set.is_match(Path::new(name)))
    }
}
