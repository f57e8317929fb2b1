//! Debouncing of file change events.
//!
//! Editors often write a file several times per save (truncate, write,
//! rename, touch). Reloading on each event would apply half-written content,
//! so changes are held until the path has been quiet for a while.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Debounces file change events by path.
///
/// Records change timestamps and returns paths that have been stable
/// for the configured duration.
#[derive(Debug)]
pub struct Debouncer {
    /// Pending changes: path -> last change timestamp.
    pending: HashMap<PathBuf, Instant>,
    /// How long a file must be stable before it is reported.
    duration: Duration,
}

impl Debouncer {
    /// Create a new debouncer with the given duration.
    pub fn new(duration: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            duration,
        }
    }

    /// Record a file change event, resetting the timer for this path.
    pub fn record(&mut self, path: PathBuf) {
        self.pending.insert(path, Instant::now());
    }

    /// Forget a pending path, e.g. after its file was unsubscribed.
    pub fn remove(&mut self, path: &Path) {
        self.pending.remove(path);
    }

    /// Take all paths that have been stable for the debounce duration.
    pub fn take_ready(&mut self) -> Vec<PathBuf> {
        let now = Instant::now();
        let mut ready = Vec::new();

        self.pending.retain(|path, last_change| {
            if now.duration_since(*last_change) >= self.duration {
                ready.push(path.clone());
                false
            } else {
                true
            }
        });

        ready
    }

    /// Time until the earliest pending path settles, if any are pending.
    pub fn next_deadline(&self) -> Option<Duration> {
        let now = Instant::now();
        self.pending
            .values()
            .map(|last| (*last + self.duration).saturating_duration_since(now))
            .min()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
