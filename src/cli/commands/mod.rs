//! Command implementations.

pub mod dump;
pub mod init;
pub mod watch;

pub use dump::run_dump;
pub use init::{run_config, run_init};
pub use watch::run_watch;
