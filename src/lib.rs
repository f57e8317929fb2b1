//! Live-tunable variables.
//!
//! Named, typed values that an application reads every frame, that are saved
//! to a JSON file, and that reload on their own when the file is edited.
//!
//! # Architecture
//!
//! - [`Var`] - a typed value cell registered under `(group, name)`
//! - [`Registry`] - owns the name mapping, save/load and the file watch;
//!   [`bag()`] returns the process-wide instance
//! - [`codec`] - per-type encoding into the JSON [`Document`]
//! - [`watcher`] - the [`WatchService`] contract and its `notify` backend
//!
//! ```no_run
//! use livevar::{Color, Var, bag};
//!
//! bag().set_filepath("assets/live_vars.json")?;
//! let radius = Var::grouped(10.0_f32, "radius", "disk");
//! let color = Var::grouped(Color::WHITE, "color", "disk");
//! bag().load()?;
//!
//! loop {
//!     // Apply edits made to the file since the last frame
//!     bag().process_reloads()?;
//!     let r = radius.get();
//!     let c = color.get();
//!     # let _ = (r, c);
//!     # break;
//! }
//! # Ok::<(), livevar::RegistryError>(())
//! ```

pub mod codec;
pub mod config;
pub mod logging;
pub mod registry;
pub mod watcher;

pub use codec::{CodecError, Color, Document, ValueKind, VarValue};
pub use config::Settings;
pub use registry::{
    ChangeFn, DEFAULT_GROUP, LoadReport, Registry, RegistryError, RegistryResult, Var, VarBuilder,
    VarId, VarInfo, VarType, bag,
};
pub use watcher::{ManualWatch, NotifyWatchService, WatchError, WatchService};

// Math types used by vector and quaternion variables
pub use glam::{Quat, Vec2, Vec3, Vec4};
