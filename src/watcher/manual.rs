//! Watch service driven by explicit calls instead of the file system.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use super::{ChangeCallback, WatchError, WatchService};

/// In-process [`WatchService`] whose notifications are fired by hand.
///
/// Useful for tests and for hosts that already receive file events from
/// elsewhere (an asset pipeline, an editor plugin).
#[derive(Default)]
pub struct ManualWatch {
    subscriptions: RwLock<HashMap<PathBuf, ChangeCallback>>,
}

impl ManualWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke the callback subscribed to `path`.
    ///
    /// Returns false when nothing is subscribed to it.
    pub fn trigger(&self, path: &Path) -> bool {
        let subscriptions = self.subscriptions.read();
        match subscriptions.get(path) {
            Some(callback) => {
                callback(path);
                true
            }
            None => false,
        }
    }

    pub fn is_subscribed(&self, path: &Path) -> bool {
        self.subscriptions.read().contains_key(path)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }
}

impl WatchService for ManualWatch {
    fn subscribe(&self, path: &Path, on_change: ChangeCallback) -> Result<(), WatchError> {
        self.subscriptions
            .write()
            .insert(path.to_path_buf(), on_change);
        Ok(())
    }

    fn unsubscribe(&self, path: &Path) {
        self.subscriptions.write().remove(path);
    }

    fn unsubscribe_all(&self) {
        self.subscriptions.write().clear();
    }
}

impl std::fmt::Debug for ManualWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualWatch")
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}
