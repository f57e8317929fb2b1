//! Command-line interface for inspecting and watching backing files.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
