use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tripleops_core::Notation;

use crate::Interrupted;

/// Domain failure raised by a storage collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error on {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("{}:{line}: {message}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("notation {0} is not supported")]
    UnsupportedNotation(Notation),
    #[error("{} is not a valid container: {message}", path.display())]
    InvalidContainer { path: PathBuf, message: String },
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

impl StorageError {
    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::File {
            path: path.into(),
            source,
        }
    }
}

/// Faults in the operation protocol itself, as opposed to collaborator errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("internal fault: {0}")]
    ProtocolViolation(String),
    #[error("could not start worker: {0}")]
    WorkerSpawn(String),
}
