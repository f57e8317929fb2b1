//! Encoding of variable values into the persisted JSON document.
//!
//! Two layers live here:
//!
//! - [`VarValue`] is the closed set of value types a variable can hold, with
//!   per-variant encode/decode against a single document node.
//! - [`Document`] is the whole backing file: one object per group, one node
//!   per variable, plus a top-level `version` leaf.
//!
//! ```text
//! {
//!   "disk": {
//!     "color": { "r": "1", "g": "0.5", "b": "0" },
//!     "radius": "12.5"
//!   },
//!   "version": "0"
//! }
//! ```

mod document;
mod error;
mod value;

pub use document::{Document, GroupNode, VERSION_KEY};
pub use error::CodecError;
pub use value::{Color, ValueKind, VarValue};
