//! Undo manager error types.

use thiserror::Error;
use warden_core::OperationId;
use warden_executor::ExecutorError;

/// Errors raised by the [`UndoManager`](crate::UndoManager).
#[derive(Debug, Error)]
pub enum UndoError {
    /// The undo stack is empty.
    #[error("nothing to undo")]
    NothingToUndo,

    /// The redo stack is empty.
    #[error("nothing to redo")]
    NothingToRedo,

    /// The backup a file record depends on is gone.
    #[error("backup for {id} is unavailable, cannot undo")]
    BackupUnavailable {
        /// Record whose backup is missing.
        id: OperationId,
    },

    /// The record has no automatic inverse.
    #[error("cannot undo automatically: {description}")]
    UndoNotSupported {
        /// Description of the record.
        description: String,
    },

    /// No record with this id is on the undo stack.
    #[error("operation not found: {0}")]
    OperationNotFound(OperationId),

    /// An inverse or replayed command exited unsuccessfully.
    #[error("command `{command}` exited with code {exit_code}: {stderr}")]
    CommandFailed {
        /// The command line.
        command: String,
        /// Exit code reported by the executor.
        exit_code: i32,
        /// Captured standard error.
        stderr: String,
    },

    /// The executor failed.
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

/// Result type for undo operations.
pub type UndoResult<T> = Result<T, UndoError>;
