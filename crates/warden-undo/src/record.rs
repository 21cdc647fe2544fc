//! Undo records, backups and outcome types.

use std::fmt;

use serde::{Deserialize, Serialize};
use warden_core::{OperationId, Timestamp};
use warden_executor::CommandOutput;

/// An operation handed to the manager for recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UndoableOperation {
    /// A file was (or is about to be) written.
    FileWrite {
        /// Target path.
        path: String,
        /// Content written.
        new_content: String,
        /// Previous content as known to the caller. Informational only; undo
        /// restores from the backup taken at record time.
        old_content: Option<String>,
    },
    /// A file was (or is about to be) deleted.
    FileDelete {
        /// Target path.
        path: String,
    },
    /// A file was renamed.
    FileRename {
        /// Path before the rename.
        old_path: String,
        /// Path after the rename.
        new_path: String,
    },
    /// A shell command ran.
    CommandExecute {
        /// The command line.
        command: String,
        /// Where it ran.
        working_dir: Option<String>,
        /// A command reversing its effect, if the caller knows one.
        undo_command: Option<String>,
    },
    /// A session's working directory changed.
    DirectoryChange {
        /// Directory before the change.
        old_dir: String,
        /// Directory after the change.
        new_dir: String,
        /// Session whose directory changed.
        session_id: String,
    },
}

impl UndoableOperation {
    /// Path whose content must be backed up before recording, if any.
    #[must_use]
    pub fn backup_path(&self) -> Option<&str> {
        match self {
            Self::FileWrite { path, .. } | Self::FileDelete { path } => Some(path),
            _ => None,
        }
    }

    /// Human-readable description stored on the record.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::FileWrite { path, .. } => format!("write file: {path}"),
            Self::FileDelete { path } => format!("delete file: {path}"),
            Self::FileRename { old_path, new_path } => {
                format!("rename file: {old_path} -> {new_path}")
            },
            Self::CommandExecute { command, .. } => format!("execute command: {command}"),
            Self::DirectoryChange {
                old_dir, new_dir, ..
            } => format!("change directory: {old_dir} -> {new_dir}"),
        }
    }
}

/// The recorded form of an [`UndoableOperation`].
///
/// File writes and deletes always carry the id of their backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordedAction {
    /// See [`UndoableOperation::FileWrite`].
    FileWrite {
        /// Target path.
        path: String,
        /// Content written.
        new_content: String,
        /// Previous content as known to the caller.
        old_content: Option<String>,
        /// Key of the backup taken at record time.
        backup_id: OperationId,
    },
    /// See [`UndoableOperation::FileDelete`].
    FileDelete {
        /// Target path.
        path: String,
        /// Key of the backup taken at record time.
        backup_id: OperationId,
    },
    /// See [`UndoableOperation::FileRename`].
    FileRename {
        /// Path before the rename.
        old_path: String,
        /// Path after the rename.
        new_path: String,
    },
    /// See [`UndoableOperation::CommandExecute`].
    CommandExecute {
        /// The command line.
        command: String,
        /// Where it ran.
        working_dir: Option<String>,
        /// Inverse command, if any.
        undo_command: Option<String>,
    },
    /// See [`UndoableOperation::DirectoryChange`].
    DirectoryChange {
        /// Directory before the change.
        old_dir: String,
        /// Directory after the change.
        new_dir: String,
        /// Session whose directory changed.
        session_id: String,
    },
}

impl RecordedAction {
    pub(crate) fn from_operation(operation: UndoableOperation, backup_id: OperationId) -> Self {
        match operation {
            UndoableOperation::FileWrite {
                path,
                new_content,
                old_content,
            } => Self::FileWrite {
                path,
                new_content,
                old_content,
                backup_id,
            },
            UndoableOperation::FileDelete { path } => Self::FileDelete { path, backup_id },
            UndoableOperation::FileRename { old_path, new_path } => {
                Self::FileRename { old_path, new_path }
            },
            UndoableOperation::CommandExecute {
                command,
                working_dir,
                undo_command,
            } => Self::CommandExecute {
                command,
                working_dir,
                undo_command,
            },
            UndoableOperation::DirectoryChange {
                old_dir,
                new_dir,
                session_id,
            } => Self::DirectoryChange {
                old_dir,
                new_dir,
                session_id,
            },
        }
    }

    /// Backup this action depends on.
    #[must_use]
    pub fn backup_id(&self) -> Option<OperationId> {
        match self {
            Self::FileWrite { backup_id, .. } | Self::FileDelete { backup_id, .. } => {
                Some(*backup_id)
            },
            _ => None,
        }
    }

    /// Snake-case kind name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileWrite { .. } => "file_write",
            Self::FileDelete { .. } => "file_delete",
            Self::FileRename { .. } => "file_rename",
            Self::CommandExecute { .. } => "command_execute",
            Self::DirectoryChange { .. } => "directory_change",
        }
    }
}

/// An entry on the undo or redo stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoRecord {
    /// Record id, also the key of its backup.
    pub id: OperationId,
    /// When it was recorded.
    pub timestamp: Timestamp,
    /// Human-readable description.
    pub description: String,
    /// What to reverse or replay.
    pub action: RecordedAction,
}

impl fmt::Display for UndoRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.timestamp, self.description, self.id)
    }
}

/// Snapshot of a file taken before it was written or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backup {
    /// Whether the file could be read at record time.
    pub existed: bool,
    /// Its content, when it existed.
    pub content: Option<String>,
    /// When the snapshot was taken.
    pub timestamp: Timestamp,
}

impl Backup {
    pub(crate) fn of(content: Option<String>) -> Self {
        Self {
            existed: content.is_some(),
            content,
            timestamp: Timestamp::now(),
        }
    }
}

/// What an undo or redo step did on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionResult {
    /// A file was written.
    Written {
        /// Path written.
        path: String,
    },
    /// A file was deleted.
    Deleted {
        /// Path deleted.
        path: String,
    },
    /// A file was renamed.
    Renamed {
        /// Source path.
        from: String,
        /// Destination path.
        to: String,
    },
    /// A command ran.
    Command {
        /// Its output.
        output: CommandOutput,
    },
    /// A session directory changed.
    DirectoryChanged {
        /// The resolved directory.
        path: String,
    },
    /// Nothing needed doing.
    Skipped {
        /// Why.
        reason: String,
    },
}

/// Result of a successful [`undo`](crate::UndoManager::undo) or
/// [`redo`](crate::UndoManager::redo).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoOutcome {
    /// Always `true`; failures are returned as errors.
    pub success: bool,
    /// The record that was reversed or replayed.
    pub operation: UndoRecord,
    /// What happened on the host.
    pub result: ActionResult,
}

/// Result of [`rollback_to`](crate::UndoManager::rollback_to).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackReport {
    /// Whether every step succeeded.
    pub success: bool,
    /// Steps completed before stopping.
    pub completed: usize,
    /// Steps that were attempted in total.
    pub total: usize,
    /// Message of the failing step.
    pub error: Option<String>,
    /// Outcomes of the completed steps, in execution order.
    pub results: Vec<UndoOutcome>,
}

/// Counters from [`get_stats`](crate::UndoManager::get_stats).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoStats {
    /// Records on the undo stack.
    pub undo_count: usize,
    /// Records on the redo stack.
    pub redo_count: usize,
    /// Backups held.
    pub backup_count: usize,
    /// Timestamp of the oldest undoable record.
    pub oldest: Option<Timestamp>,
    /// Timestamp of the newest undoable record.
    pub newest: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_actions_carry_backup_id() {
        let id = OperationId::new();
        let action = RecordedAction::from_operation(
            UndoableOperation::FileDelete {
                path: "/tmp/a".into(),
            },
            id,
        );
        assert_eq!(action.backup_id(), Some(id));
        assert_eq!(action.kind(), "file_delete");

        let rename = RecordedAction::from_operation(
            UndoableOperation::FileRename {
                old_path: "/a".into(),
                new_path: "/b".into(),
            },
            id,
        );
        assert_eq!(rename.backup_id(), None);
    }

    #[test]
    fn test_descriptions() {
        let op = UndoableOperation::CommandExecute {
            command: "make".into(),
            working_dir: None,
            undo_command: None,
        };
        assert_eq!(op.description(), "execute command: make");
        assert_eq!(op.backup_path(), None);

        let write = UndoableOperation::FileWrite {
            path: "/tmp/a".into(),
            new_content: String::new(),
            old_content: None,
        };
        assert_eq!(write.backup_path(), Some("/tmp/a"));
    }

    #[test]
    fn test_backup_existence_follows_content() {
        assert!(Backup::of(Some(String::new())).existed);
        assert!(!Backup::of(None).existed);
    }
}
