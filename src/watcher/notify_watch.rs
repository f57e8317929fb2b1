//! `notify`-backed watch service with per-path debouncing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, unbounded};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::{Mutex, RwLock};

use super::debouncer::Debouncer;
use super::path_registry::PathRegistry;
use super::{ChangeCallback, WatchError, WatchService};

/// Default quiet period before a change is reported.
pub const DEFAULT_DEBOUNCE_MS: u64 = 50;

/// Upper bound on how long the worker blocks when nothing is pending.
const IDLE_TICK: Duration = Duration::from_millis(250);

/// State shared between the service handle and its worker thread.
#[derive(Default)]
struct Shared {
    /// Canonical file path -> subscriber.
    subscriptions: RwLock<HashMap<PathBuf, ChangeCallback>>,
    /// Unsubscribed paths the worker still has to drop from its debouncer.
    forgotten: Mutex<Vec<PathBuf>>,
}

impl Shared {
    fn is_subscribed(&self, path: &Path) -> bool {
        self.subscriptions.read().contains_key(path)
    }

    fn take_forgotten(&self) -> Vec<PathBuf> {
        std::mem::take(&mut *self.forgotten.lock())
    }

    /// Invoke the subscriber for `path`.
    ///
    /// The read lock is held across the call so that `unsubscribe` (which
    /// takes the write lock) waits for an in-flight notification.
    fn dispatch(&self, path: &Path) {
        let subscriptions = self.subscriptions.read();
        if let Some(callback) = subscriptions.get(path) {
            crate::debug_event!("watcher", "changed", "{}", path.display());
            callback(path);
        }
    }
}

/// Everything touched by subscribe/unsubscribe, behind one lock.
#[derive(Default)]
struct Watched {
    watcher: Option<RecommendedWatcher>,
    dirs: PathRegistry,
    /// Path as passed to `subscribe` -> canonical key. Lets a path be
    /// unsubscribed after its file has been deleted.
    keys: HashMap<PathBuf, PathBuf>,
}

/// [`WatchService`] backed by the platform's recommended `notify` watcher.
///
/// The OS watcher and worker thread are started lazily on the first
/// subscription and stop when the service is dropped.
pub struct NotifyWatchService {
    shared: Arc<Shared>,
    watched: Mutex<Watched>,
    debounce: Duration,
}

impl NotifyWatchService {
    /// Create a service that reports a change after `debounce_ms` of quiet.
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            watched: Mutex::new(Watched::default()),
            debounce: Duration::from_millis(debounce_ms),
        }
    }

    pub fn is_running(&self) -> bool {
        self.watched.lock().watcher.is_some()
    }

    pub fn subscription_count(&self) -> usize {
        self.shared.subscriptions.read().len()
    }

    /// Number of directories currently registered with the OS watcher.
    pub fn watched_dir_count(&self) -> usize {
        self.watched.lock().dirs.dir_count()
    }

    fn start(&self) -> Result<RecommendedWatcher, WatchError> {
        let (tx, rx) = unbounded();

        // The sender lives inside the watcher; dropping the watcher
        // disconnects the channel and ends the worker.
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        })?;

        let shared = self.shared.clone();
        let debounce = self.debounce;
        thread::Builder::new()
            .name("livevar-watch".to_string())
            .spawn(move || run_worker(rx, shared, debounce))?;

        crate::log_event!("watcher", "started");
        Ok(watcher)
    }

    /// Drop the subscription for `key` unless another caller path still
    /// maps to it. Caller holds the `watched` lock.
    fn release(&self, watched: &mut Watched, key: &Path) {
        if watched.keys.values().any(|k| k == key) {
            return;
        }
        if self.shared.subscriptions.write().remove(key).is_none() {
            return;
        }
        self.shared.forgotten.lock().push(key.to_path_buf());

        if let Some(dir) = watched.dirs.remove_path(key) {
            if let Some(watcher) = watched.watcher.as_mut() {
                if let Err(e) = watcher.unwatch(&dir) {
                    tracing::warn!("[watcher] failed to unwatch {}: {e}", dir.display());
                }
            }
        }
        crate::log_event!("watcher", "unsubscribed", "{}", key.display());
    }
}

impl Default for NotifyWatchService {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

impl WatchService for NotifyWatchService {
    fn subscribe(&self, path: &Path, on_change: ChangeCallback) -> Result<(), WatchError> {
        let key = path
            .canonicalize()
            .map_err(|e| WatchError::PathWatchFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut guard = self.watched.lock();
        let watched = &mut *guard;
        if watched.watcher.is_none() {
            watched.watcher = Some(self.start()?);
        }

        if let Some(dir) = watched.dirs.add_path(key.clone()) {
            let watcher = watched.watcher.as_mut().ok_or_else(|| WatchError::InitFailed {
                reason: "watcher unavailable".to_string(),
            })?;
            if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
                watched.dirs.remove_path(&key);
                return Err(WatchError::PathWatchFailed {
                    path: dir,
                    reason: e.to_string(),
                });
            }
            crate::debug_event!("watcher", "watching", "{}", dir.display());
        }

        // Same caller path now resolving elsewhere, e.g. a replaced symlink
        if let Some(previous) = watched.keys.insert(path.to_path_buf(), key.clone()) {
            if previous != key {
                self.release(watched, &previous);
            }
        }

        self.shared.subscriptions.write().insert(key.clone(), on_change);
        crate::log_event!("watcher", "subscribed", "{}", key.display());
        Ok(())
    }

    fn unsubscribe(&self, path: &Path) {
        let mut guard = self.watched.lock();
        let watched = &mut *guard;

        let key = match watched.keys.remove(path) {
            Some(key) => key,
            None => {
                // Caller may pass another spelling of a live file
                let Ok(key) = path.canonicalize() else {
                    crate::debug_event!("watcher", "not subscribed", "{}", path.display());
                    return;
                };
                watched.keys.retain(|_, k| *k != key);
                key
            }
        };
        self.release(watched, &key);
    }

    fn unsubscribe_all(&self) {
        let mut guard = self.watched.lock();
        let watched = &mut *guard;

        watched.keys.clear();
        let removed: Vec<PathBuf> = self
            .shared
            .subscriptions
            .write()
            .drain()
            .map(|(key, _)| key)
            .collect();
        self.shared.forgotten.lock().extend(removed);

        let dirs = watched.dirs.clear();
        if let Some(watcher) = watched.watcher.as_mut() {
            for dir in &dirs {
                if let Err(e) = watcher.unwatch(dir) {
                    tracing::warn!("[watcher] failed to unwatch {}: {e}", dir.display());
                }
            }
        }
        crate::debug_event!("watcher", "unsubscribed all", "{} directories", dirs.len());
    }
}

impl std::fmt::Debug for NotifyWatchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let watched = self.watched.lock();
        f.debug_struct("NotifyWatchService")
            .field("files", &watched.dirs.path_count())
            .field("dirs", &watched.dirs.dir_count())
            .field("running", &watched.watcher.is_some())
            .field("debounce", &self.debounce)
            .finish()
    }
}

/// Worker loop: collect raw events, debounce, dispatch.
fn run_worker(rx: Receiver<notify::Result<Event>>, shared: Arc<Shared>, debounce: Duration) {
    let mut debouncer = Debouncer::new(debounce);

    loop {
        let timeout = debouncer.next_deadline().unwrap_or(IDLE_TICK);

        match rx.recv_timeout(timeout) {
            Ok(Ok(event)) => record_event(&mut debouncer, &shared, event),
            Ok(Err(e)) => tracing::error!("[watcher] file watch error: {e}"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let forgotten = shared.take_forgotten();
        if !forgotten.is_empty() {
            for path in &forgotten {
                debouncer.remove(path);
            }
            crate::debug_event!(
                "watcher",
                "dropped pending",
                "{} paths, {} still pending",
                forgotten.len(),
                debouncer.pending_count()
            );
        }

        for path in debouncer.take_ready() {
            shared.dispatch(&path);
        }
    }

    crate::debug_event!("watcher", "stopped");
}

fn record_event(debouncer: &mut Debouncer, shared: &Shared, event: Event) {
    // Content changes arrive as modify, or as create when an editor renames
    // a temporary file over the original.
    if !matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Any
    ) {
        return;
    }

    for path in event.paths {
        let key = path.canonicalize().unwrap_or(path);
        if shared.is_subscribed(&key) {
            debouncer.record(key);
        }
    }
}
