//! Live variable registry.
//!
//! Variables register themselves under `(group, name)` when created and
//! deregister when dropped. The registry saves every registered variable to
//! its backing file and pushes file contents back into them on load.
//!
//! # Threads
//!
//! File-change notifications arrive on the watch service's thread. They are
//! only queued there; [`Registry::process_reloads`] applies them on whichever
//! thread calls it, normally the application's frame loop. Values and the
//! item map are still lock-protected, so an explicit `load()` from any
//! thread is safe.

mod error;
mod store;
mod var;

use std::sync::{Arc, OnceLock};

pub use error::{RegistryError, RegistryResult};
pub use store::{LoadReport, Registry, VarId, VarInfo};
pub use var::{ChangeFn, DEFAULT_GROUP, Var, VarBuilder, VarType};

/// The process-wide registry, created on first use.
///
/// Initialisation is exactly-once regardless of which thread gets here
/// first. Tests that need isolation should build their own registry with
/// [`Registry::with_watch`] instead.
pub fn bag() -> &'static Arc<Registry> {
    static BAG: OnceLock<Arc<Registry>> = OnceLock::new();
    BAG.get_or_init(Registry::new)
}
