//! The watch contract consumed by the registry.

use std::path::Path;
use std::sync::Arc;

use super::WatchError;

/// Callback invoked with the changed path.
///
/// Runs on the watch service's own thread, so it should only hand the event
/// off (post to a channel, set a flag) rather than touch shared state.
pub type ChangeCallback = Arc<dyn Fn(&Path) + Send + Sync>;

/// A service that reports content changes of individual files.
///
/// Delivery is at-least-once and eventual. Implementations must guarantee
/// that once `unsubscribe`/`unsubscribe_all` returns, the removed callbacks
/// are never invoked again.
pub trait WatchService: Send + Sync {
    /// Start (or replace) the subscription for `path`.
    fn subscribe(&self, path: &Path, on_change: ChangeCallback) -> Result<(), WatchError>;

    /// Drop the subscription for `path`. Unknown paths are ignored.
    fn unsubscribe(&self, path: &Path);

    /// Drop every subscription held by this service.
    fn unsubscribe_all(&self);
}
