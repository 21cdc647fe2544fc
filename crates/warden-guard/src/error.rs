use thiserror::Error;
use warden_core::{OperationId, RiskLevel};
use warden_executor::ExecutorError;
use warden_undo::UndoError;

/// Errors raised by the [`SafetyGuard`](crate::SafetyGuard).
#[derive(Debug, Error)]
pub enum GuardError {
    /// The operation needs approval and has not been approved yet.
    #[error("operation {id} requires approval ({level} risk)")]
    ApprovalRequired {
        /// Ledger id of the pending operation.
        id: OperationId,
        /// Classified risk.
        level: RiskLevel,
    },

    /// The user denied the operation.
    #[error("operation {id} was denied")]
    Denied {
        /// Ledger id of the denied operation.
        id: OperationId,
    },

    /// No such operation in the ledger.
    #[error("unknown operation: {0}")]
    UnknownOperation(OperationId),

    /// The host executor failed.
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// Undo or redo failed.
    #[error(transparent)]
    Undo(#[from] UndoError),
}

/// Result type for guard operations.
pub type GuardResult<T> = Result<T, GuardError>;
