//! The undo/redo manager.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use warden_core::{OperationId, Timestamp};
use warden_executor::HostExecutor;

use crate::error::{UndoError, UndoResult};
use crate::record::{
    ActionResult, Backup, RecordedAction, RollbackReport, UndoOutcome, UndoRecord, UndoStats,
    UndoableOperation,
};

/// Default number of records kept on the undo stack.
pub const DEFAULT_CAPACITY: usize = 50;

/// Default number of records returned by [`UndoManager::get_history`].
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Default)]
struct State {
    undo: VecDeque<UndoRecord>,
    redo: Vec<UndoRecord>,
    backups: HashMap<OperationId, Backup>,
}

impl State {
    /// Push a record and its backup in one step, invalidating redo and
    /// evicting beyond `capacity`.
    fn insert(&mut self, record: UndoRecord, backup: Option<Backup>, capacity: usize) {
        if let Some(backup) = backup {
            self.backups.insert(record.id, backup);
        }

        for stale in self.redo.drain(..) {
            if let Some(backup_id) = stale.action.backup_id() {
                self.backups.remove(&backup_id);
            }
        }

        self.undo.push_back(record);

        while self.undo.len() > capacity {
            let Some(evicted) = self.undo.pop_front() else {
                break;
            };
            if let Some(backup_id) = evicted.action.backup_id() {
                self.backups.remove(&backup_id);
            }
            tracing::debug!(id = %evicted.id, "evicted oldest undo record");
        }
    }

    fn backup_for(&self, record: &UndoRecord) -> Option<Backup> {
        record
            .action
            .backup_id()
            .and_then(|id| self.backups.get(&id).cloned())
    }
}

/// Bounded history of host mutations that can be reversed and replayed.
///
/// File writes and deletes are snapshotted through the executor when they
/// are recorded, so record *before* performing the mutation. The undo stack
/// holds at most `capacity` records; the redo stack is unbounded but cleared
/// by every new record.
///
/// Undo and redo hold the internal lock across the executor call, so steps
/// on one manager never interleave.
pub struct UndoManager {
    executor: Arc<dyn HostExecutor>,
    capacity: usize,
    state: Mutex<State>,
}

impl fmt::Debug for UndoManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoManager")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl UndoManager {
    /// Create a manager with the default capacity.
    #[must_use]
    pub fn new(executor: Arc<dyn HostExecutor>) -> Self {
        Self::with_capacity(executor, DEFAULT_CAPACITY)
    }

    /// Create a manager keeping at most `capacity` undoable records.
    #[must_use]
    pub fn with_capacity(executor: Arc<dyn HostExecutor>, capacity: usize) -> Self {
        Self {
            executor,
            capacity,
            state: Mutex::new(State::default()),
        }
    }

    /// Maximum number of undoable records.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record an operation and return its id.
    ///
    /// For file writes and deletes the current file content is read first.
    /// Only a missing file is recorded as "did not exist".
    ///
    /// # Errors
    ///
    /// Returns [`UndoError::Executor`] when the file exists but cannot be
    /// backed up, for example because it is not UTF-8 or too large. Nothing
    /// is recorded in that case.
    pub async fn record_operation(&self, operation: UndoableOperation) -> UndoResult<OperationId> {
        let id = OperationId::new();

        let backup = match operation.backup_path() {
            Some(path) => Some(self.snapshot(path).await?),
            None => None,
        };

        let record = UndoRecord {
            id,
            timestamp: Timestamp::now(),
            description: operation.description(),
            action: RecordedAction::from_operation(operation, id),
        };
        tracing::debug!(%id, kind = record.action.kind(), "recording undoable operation");

        self.state.lock().await.insert(record, backup, self.capacity);
        Ok(id)
    }

    async fn snapshot(&self, path: &str) -> UndoResult<Backup> {
        match self.executor.read_file(path).await {
            Ok(content) => Ok(Backup::of(Some(content))),
            Err(e) if e.is_not_found() => {
                tracing::debug!(path, "no existing file to back up");
                Ok(Backup::of(None))
            },
            Err(e) => {
                tracing::warn!(path, error = %e, "cannot back up file, not recording");
                Err(e.into())
            },
        }
    }

    /// Drop a record from the undo stack without reversing it, along with
    /// its backup. Used when the mutation it guards never happened.
    ///
    /// Returns `false` if `id` is not on the undo stack.
    pub async fn discard(&self, id: &OperationId) -> bool {
        let mut state = self.state.lock().await;
        let Some(index) = state.undo.iter().position(|r| r.id == *id) else {
            return false;
        };
        let Some(record) = state.undo.remove(index) else {
            return false;
        };
        if let Some(backup_id) = record.action.backup_id() {
            state.backups.remove(&backup_id);
        }
        tracing::debug!(%id, "discarded undo record");
        true
    }

    /// Record a file write.
    ///
    /// # Errors
    ///
    /// See [`UndoManager::record_operation`].
    pub async fn record_file_write(
        &self,
        path: impl Into<String>,
        new_content: impl Into<String>,
        old_content: Option<String>,
    ) -> UndoResult<OperationId> {
        self.record_operation(UndoableOperation::FileWrite {
            path: path.into(),
            new_content: new_content.into(),
            old_content,
        })
        .await
    }

    /// Record a file deletion.
    ///
    /// # Errors
    ///
    /// See [`UndoManager::record_operation`].
    pub async fn record_file_delete(&self, path: impl Into<String>) -> UndoResult<OperationId> {
        self.record_operation(UndoableOperation::FileDelete { path: path.into() })
            .await
    }

    /// Record a command execution, with an optional inverse command.
    ///
    /// # Errors
    ///
    /// Never fails; commands take no backup.
    pub async fn record_command(
        &self,
        command: impl Into<String>,
        working_dir: Option<String>,
        undo_command: Option<String>,
    ) -> UndoResult<OperationId> {
        self.record_operation(UndoableOperation::CommandExecute {
            command: command.into(),
            working_dir,
            undo_command,
        })
        .await
    }

    /// Reverse the newest record.
    ///
    /// # Errors
    ///
    /// Returns [`UndoError::NothingToUndo`] on an empty stack, otherwise the
    /// error of the inverse action. A failed record stays on the undo stack.
    pub async fn undo(&self) -> UndoResult<UndoOutcome> {
        let mut state = self.state.lock().await;
        self.undo_locked(&mut state).await
    }

    async fn undo_locked(&self, state: &mut State) -> UndoResult<UndoOutcome> {
        let record = state.undo.pop_back().ok_or(UndoError::NothingToUndo)?;
        let backup = state.backup_for(&record);

        match self.perform_undo(&record, backup).await {
            Ok(result) => {
                tracing::info!(id = %record.id, description = %record.description, "undone");
                state.redo.push(record.clone());
                Ok(UndoOutcome {
                    success: true,
                    operation: record,
                    result,
                })
            },
            Err(e) => {
                tracing::warn!(id = %record.id, error = %e, "undo failed");
                state.undo.push_back(record);
                Err(e)
            },
        }
    }

    /// Replay the most recently undone record.
    ///
    /// # Errors
    ///
    /// Returns [`UndoError::NothingToRedo`] on an empty stack, otherwise the
    /// error of the replayed action. A failed record stays on the redo stack.
    pub async fn redo(&self) -> UndoResult<UndoOutcome> {
        let mut state = self.state.lock().await;
        let record = state.redo.pop().ok_or(UndoError::NothingToRedo)?;

        match self.perform_redo(&record).await {
            Ok(result) => {
                tracing::info!(id = %record.id, description = %record.description, "redone");
                state.undo.push_back(record.clone());
                Ok(UndoOutcome {
                    success: true,
                    operation: record,
                    result,
                })
            },
            Err(e) => {
                tracing::warn!(id = %record.id, error = %e, "redo failed");
                state.redo.push(record);
                Err(e)
            },
        }
    }

    /// Undo every record newer than `id`, newest first. The record `id`
    /// itself stays applied.
    ///
    /// Stops at the first failure and reports how far it got.
    ///
    /// # Errors
    ///
    /// Returns [`UndoError::OperationNotFound`] if `id` is not on the undo
    /// stack. Step failures are reported in the [`RollbackReport`].
    pub async fn rollback_to(&self, id: &OperationId) -> UndoResult<RollbackReport> {
        let mut state = self.state.lock().await;
        let index = state
            .undo
            .iter()
            .position(|r| r.id == *id)
            .ok_or(UndoError::OperationNotFound(*id))?;
        let total = state.undo.len().saturating_sub(index).saturating_sub(1);

        let mut results = Vec::with_capacity(total);
        for _ in 0..total {
            match self.undo_locked(&mut state).await {
                Ok(outcome) => results.push(outcome),
                Err(e) => {
                    return Ok(RollbackReport {
                        success: false,
                        completed: results.len(),
                        total,
                        error: Some(e.to_string()),
                        results,
                    });
                },
            }
        }

        tracing::info!(target_id = %id, undone = total, "rolled back");
        Ok(RollbackReport {
            success: true,
            completed: results.len(),
            total,
            error: None,
            results,
        })
    }

    /// Up to `limit` undoable records, newest first. `None` uses
    /// [`DEFAULT_HISTORY_LIMIT`].
    pub async fn get_history(&self, limit: Option<usize>) -> Vec<UndoRecord> {
        let state = self.state.lock().await;
        state
            .undo
            .iter()
            .rev()
            .take(limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
            .cloned()
            .collect()
    }

    /// Redoable records, next to redo first.
    pub async fn get_redoable_operations(&self) -> Vec<UndoRecord> {
        let state = self.state.lock().await;
        state.redo.iter().rev().cloned().collect()
    }

    /// Stack and backup counters.
    pub async fn get_stats(&self) -> UndoStats {
        let state = self.state.lock().await;
        UndoStats {
            undo_count: state.undo.len(),
            redo_count: state.redo.len(),
            backup_count: state.backups.len(),
            oldest: state.undo.front().map(|r| r.timestamp),
            newest: state.undo.back().map(|r| r.timestamp),
        }
    }

    /// Drop all records and backups.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        *state = State::default();
        tracing::debug!("undo history cleared");
    }

    async fn perform_undo(
        &self,
        record: &UndoRecord,
        backup: Option<Backup>,
    ) -> UndoResult<ActionResult> {
        match &record.action {
            RecordedAction::FileWrite {
                path, backup_id, ..
            } => {
                let backup = backup.ok_or(UndoError::BackupUnavailable { id: *backup_id })?;
                match backup.content {
                    Some(content) if backup.existed => self.write(path, &content).await,
                    _ => self.delete(path).await,
                }
            },
            RecordedAction::FileDelete { path, backup_id } => {
                let backup = backup.ok_or(UndoError::BackupUnavailable { id: *backup_id })?;
                match backup.content {
                    Some(content) if backup.existed => self.write(path, &content).await,
                    _ => Ok(ActionResult::Skipped {
                        reason: format!("{path} did not exist before deletion"),
                    }),
                }
            },
            RecordedAction::FileRename { old_path, new_path } => {
                self.rename(new_path, old_path).await
            },
            RecordedAction::CommandExecute {
                working_dir,
                undo_command,
                ..
            } => {
                let Some(undo_command) = undo_command else {
                    return Err(UndoError::UndoNotSupported {
                        description: record.description.clone(),
                    });
                };
                self.run(undo_command, working_dir.as_deref()).await
            },
            RecordedAction::DirectoryChange {
                old_dir,
                session_id,
                ..
            } => self.change_dir(old_dir, session_id).await,
        }
    }

    async fn perform_redo(&self, record: &UndoRecord) -> UndoResult<ActionResult> {
        match &record.action {
            RecordedAction::FileWrite {
                path, new_content, ..
            } => self.write(path, new_content).await,
            RecordedAction::FileDelete { path, .. } => self.delete(path).await,
            RecordedAction::FileRename { old_path, new_path } => {
                self.rename(old_path, new_path).await
            },
            RecordedAction::CommandExecute {
                command,
                working_dir,
                ..
            } => self.run(command, working_dir.as_deref()).await,
            RecordedAction::DirectoryChange {
                new_dir,
                session_id,
                ..
            } => self.change_dir(new_dir, session_id).await,
        }
    }

    async fn write(&self, path: &str, content: &str) -> UndoResult<ActionResult> {
        self.executor.write_file(path, content).await?;
        Ok(ActionResult::Written {
            path: path.to_string(),
        })
    }

    async fn delete(&self, path: &str) -> UndoResult<ActionResult> {
        self.executor.delete_file(path).await?;
        Ok(ActionResult::Deleted {
            path: path.to_string(),
        })
    }

    async fn rename(&self, from: &str, to: &str) -> UndoResult<ActionResult> {
        self.executor.rename_file(from, to).await?;
        Ok(ActionResult::Renamed {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    async fn run(&self, command: &str, working_dir: Option<&str>) -> UndoResult<ActionResult> {
        let output = self.executor.execute_command(command, working_dir).await?;
        if !output.success {
            return Err(UndoError::CommandFailed {
                command: command.to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }
        Ok(ActionResult::Command { output })
    }

    async fn change_dir(&self, path: &str, session_id: &str) -> UndoResult<ActionResult> {
        let path = self.executor.change_directory(path, session_id).await?;
        Ok(ActionResult::DirectoryChanged { path })
    }
}
