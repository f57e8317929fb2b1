//! File watch service used for live reloading.
//!
//! The registry only needs "tell me when file P changes". That contract is
//! the [`WatchService`] trait; [`NotifyWatchService`] implements it on top of
//! `notify`, and [`ManualWatch`] lets callers fire changes by hand.
//!
//! # Architecture
//!
//! ```text
//! notify::RecommendedWatcher (per parent directory)
//!         |  raw events
//!         v
//!   worker thread
//!     - PathRegistry (subscribed files -> watched dirs)
//!     - Debouncer (coalesce save bursts)
//!         |  one call per settled change
//!         v
//!   subscriber callback
//! ```

mod debouncer;
mod error;
mod manual;
mod notify_watch;
mod path_registry;
mod service;

pub use debouncer::Debouncer;
pub use error::WatchError;
pub use manual::ManualWatch;
pub use notify_watch::{DEFAULT_DEBOUNCE_MS, NotifyWatchService};
pub use path_registry::PathRegistry;
pub use service::{ChangeCallback, WatchService};
