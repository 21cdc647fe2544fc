//! Warden Undo - bounded undo/redo history for host mutations.
//!
//! Callers record each mutation with the [`UndoManager`] *before* performing
//! it. File writes and deletes are snapshotted through the
//! [`HostExecutor`](warden_executor::HostExecutor) at record time, so undo
//! can restore the previous content or remove a file that did not exist.
//!
//! | kind | undo | redo |
//! |---|---|---|
//! | file write | restore backup, or delete if the file was new | write new content |
//! | file delete | restore backup, nothing if the file was absent | delete again |
//! | file rename | rename back | rename again |
//! | command | run the undo command if one was given | run the command again |
//! | directory change | change to the old directory | change to the new directory |

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod manager;
mod record;

pub use error::{UndoError, UndoResult};
pub use manager::{DEFAULT_CAPACITY, DEFAULT_HISTORY_LIMIT, UndoManager};
pub use record::{
    ActionResult, Backup, RecordedAction, RollbackReport, UndoOutcome, UndoRecord, UndoStats,
    UndoableOperation,
};
