//! Activity logger error types.

use thiserror::Error;
use warden_storage::StorageError;

/// Errors raised by the [`ActivityLogger`](crate::ActivityLogger).
#[derive(Debug, Error)]
pub enum ActivityError {
    /// Export format other than `json`, `csv` or `txt`.
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// The persistent store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Entries could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for activity logger operations.
pub type ActivityResult<T> = Result<T, ActivityError>;
