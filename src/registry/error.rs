use std::path::PathBuf;
use thiserror::Error;

use super::store::VarId;
use crate::codec::CodecError;
use crate::watcher::WatchError;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("already contains '{name}' in group '{group}', not adding")]
    Duplicate { group: String, name: String },

    #[error("group name '{0}' is reserved")]
    ReservedGroup(String),

    #[error("target not found: {0}")]
    UnknownTarget(VarId),

    #[error("no backing file configured")]
    NoFilepath,

    #[error("backing file {} does not exist", path.display())]
    MissingBackingFile { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Document { path: PathBuf, source: CodecError },

    #[error("watch error: {0}")]
    Watch(#[from] WatchError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
