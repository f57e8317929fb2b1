//! Subscribed files and the directories that must be watched for them.
//!
//! `notify` is most reliable when watching a file's parent directory: many
//! editors replace a file by renaming a temporary over it, which drops a
//! watch placed on the file itself. Several subscribed files can share a
//! directory, so directories are reference-counted.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Tracks subscribed file paths and their watched parent directories.
#[derive(Debug, Default)]
pub struct PathRegistry {
    /// Subscribed file paths.
    paths: HashSet<PathBuf>,
    /// Watched directory -> number of subscribed files inside it.
    watch_dirs: HashMap<PathBuf, usize>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, returning its directory if that directory is newly needed.
    pub fn add_path(&mut self, path: PathBuf) -> Option<PathBuf> {
        let dir = Self::watch_dir(&path);
        if !self.paths.insert(path) {
            return None;
        }

        let count = self.watch_dirs.entry(dir.clone()).or_insert(0);
        *count += 1;
        (*count == 1).then_some(dir)
    }

    /// Remove a file, returning its directory if nothing else needs it.
    pub fn remove_path(&mut self, path: &Path) -> Option<PathBuf> {
        if !self.paths.remove(path) {
            return None;
        }

        let dir = Self::watch_dir(path);
        let count = self.watch_dirs.get_mut(&dir)?;
        *count -= 1;
        if *count == 0 {
            self.watch_dirs.remove(&dir);
            Some(dir)
        } else {
            None
        }
    }

    /// Remove everything, returning the directories that were watched.
    pub fn clear(&mut self) -> Vec<PathBuf> {
        self.paths.clear();
        self.watch_dirs.drain().map(|(dir, _)| dir).collect()
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn dir_count(&self) -> usize {
        self.watch_dirs.len()
    }

    /// Directory to watch for a file. Bare file names map to `.`.
    pub fn watch_dir(path: &Path) -> PathBuf {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
