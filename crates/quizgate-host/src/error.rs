//! Record store error types.

use std::path::PathBuf;

use thiserror::Error;

use quizgate_core::error::HostError;

/// Errors from the file-backed record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing or replacing the record file failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The record file is not valid JSON for a host record.
    #[error("invalid record file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<StoreError> for HostError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Read { .. } => HostError::Unavailable(err.to_string()),
            StoreError::Parse { .. } => HostError::Corrupt(err.to_string()),
            StoreError::Write { .. } | StoreError::Encode(_) => {
                HostError::WriteFailed(err.to_string())
            }
        }
    }
}
