//! Executor error types.

use thiserror::Error;

/// Errors raised by a [`HostExecutor`](crate::HostExecutor).
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The file or directory does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// Path that was looked up.
        path: String,
    },

    /// The path cannot be used for this operation.
    #[error("invalid path {path}: {reason}")]
    InvalidPath {
        /// Offending path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The file exceeds the configured size limit.
    #[error("{path} is {size} bytes, exceeding the {limit} byte limit")]
    TooLarge {
        /// Offending path.
        path: String,
        /// Actual size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// A command did not finish within its time budget.
    #[error("command timed out after {timeout_secs}s: {command}")]
    Timeout {
        /// The command line.
        command: String,
        /// The budget that was exceeded.
        timeout_secs: u64,
    },

    /// The shell could not be started.
    #[error("failed to spawn command {command}: {source}")]
    Spawn {
        /// The command line.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A filesystem operation failed.
    #[error("io error on {path}: {source}")]
    Io {
        /// Path involved.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Any other host failure.
    #[error("{0}")]
    Other(String),
}

impl ExecutorError {
    /// Map an I/O error on `path`, turning `NotFound` into [`Self::NotFound`].
    #[must_use]
    pub fn from_io(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }

    /// Whether this error means the target does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for executor operations.
pub type ExecutorResult<T> = Result<T, ExecutorError>;
