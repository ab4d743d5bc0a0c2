use std::{io, path::PathBuf};

use thiserror::Error;

/// Failure while copying the source into the staging file.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unsupported source scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Source size mismatch: expected {expected} bytes, received {received}")]
    Incomplete { expected: u64, received: u64 },
}

/// The error handed to the completion callback.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("Transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("Transfer cancelled")]
    Cancelled,

    #[error("Failed to replace {}: {source}", .path.display())]
    Commit {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transfer,
    Cancelled,
    Commit,
}

impl UpdateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UpdateError::Transfer(_) => ErrorKind::Transfer,
            UpdateError::Cancelled => ErrorKind::Cancelled,
            UpdateError::Commit { .. } => ErrorKind::Commit,
        }
    }
}

/// Rejected before any work starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Target path has no file name: {}", .0.display())]
    NoFileName(PathBuf),

    #[error("Staging path would overwrite the target: {}", .0.display())]
    StagingIsTarget(PathBuf),
}
