//! The safety guard: classify, gate, record, execute, log.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use serde_json::{Value, json};
use warden_activity::ActivityLogger;
use warden_core::{OperationId, RiskLevel};
use warden_executor::{CommandOutput, HostExecutor};
use warden_safety::{
    CommandCheckResult, NewPendingOperation, OperationLedger, OperationStatus, PathCheckResult,
    PathOperation, Preview, PreviewGenerator, ProposedOperation, RiskClassifier, RiskFinding,
};
use warden_undo::{UndoManager, UndoOutcome};

use crate::error::{GuardError, GuardResult};

/// Classifier verdict attached to a [`Proposal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyCheck {
    /// A shell command was classified.
    Command(CommandCheckResult),
    /// A file path was classified.
    Path(PathCheckResult),
    /// The operation kind has no classifier and is treated as safe.
    Unclassified,
}

impl SafetyCheck {
    /// Aggregated risk level.
    #[must_use]
    pub fn level(&self) -> RiskLevel {
        match self {
            Self::Command(c) => c.level,
            Self::Path(p) => p.level,
            Self::Unclassified => RiskLevel::Safe,
        }
    }

    /// Whether the user must approve before execution.
    #[must_use]
    pub fn needs_approval(&self) -> bool {
        self.level().requires_approval()
    }

    /// Every finding behind the level.
    #[must_use]
    pub fn findings(&self) -> &[RiskFinding] {
        match self {
            Self::Command(c) => &c.findings,
            Self::Path(p) => &p.findings,
            Self::Unclassified => &[],
        }
    }
}

/// A classified operation, ready to be executed once the gate allows it.
#[derive(Debug, Clone)]
pub struct Proposal {
    tool_name: String,
    operation: ProposedOperation,
    check: SafetyCheck,
    preview: Option<Preview>,
    operation_id: Option<OperationId>,
}

impl Proposal {
    /// Tool that proposed the operation.
    #[must_use]
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// The proposed operation.
    #[must_use]
    pub fn operation(&self) -> &ProposedOperation {
        &self.operation
    }

    /// Classifier verdict.
    #[must_use]
    pub fn check(&self) -> &SafetyCheck {
        &self.check
    }

    /// Preview, rendered only when approval is needed.
    #[must_use]
    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    /// Ledger id, present only when approval is needed.
    #[must_use]
    pub fn operation_id(&self) -> Option<OperationId> {
        self.operation_id
    }

    /// Whether the user must approve before execution.
    #[must_use]
    pub fn needs_approval(&self) -> bool {
        self.operation_id.is_some()
    }
}

/// What [`SafetyGuard::execute`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
    /// A file was written.
    FileWritten {
        /// Target path.
        path: String,
        /// Undo record id.
        undo_id: OperationId,
    },
    /// A file was deleted.
    FileDeleted {
        /// Target path.
        path: String,
        /// Undo record id.
        undo_id: OperationId,
    },
    /// A command ran to completion (possibly with a non-zero exit). Commands
    /// have no known inverse and are not recorded for undo.
    Command {
        /// Captured output.
        output: CommandOutput,
    },
    /// The operation kind is not executed by the guard. The caller runs it.
    Unhandled {
        /// Tool kind.
        kind: String,
    },
}

/// Content returned by [`SafetyGuard::read_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRead {
    /// File content.
    pub content: String,
    /// Classification of the read.
    pub check: PathCheckResult,
}

/// Orchestrates classification, approval, undo recording, execution and
/// activity logging for every host operation.
///
/// All components are constructed once and shared; the guard never creates
/// hidden global state.
pub struct SafetyGuard {
    executor: Arc<dyn HostExecutor>,
    previews: PreviewGenerator,
    ledger: Arc<OperationLedger>,
    undo: Arc<UndoManager>,
    activity: Arc<ActivityLogger>,
    ledger_max_age: Duration,
}

impl fmt::Debug for SafetyGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafetyGuard")
            .field("previews", &self.previews)
            .field("ledger", &self.ledger)
            .field("undo", &self.undo)
            .finish_non_exhaustive()
    }
}

impl SafetyGuard {
    /// Create a guard with fresh, memory-only components.
    #[must_use]
    pub fn new(executor: Arc<dyn HostExecutor>) -> Self {
        let undo = Arc::new(UndoManager::new(Arc::clone(&executor)));
        Self::with_components(
            executor,
            Arc::new(OperationLedger::new()),
            undo,
            Arc::new(ActivityLogger::new()),
        )
    }

    /// Create a guard over existing components.
    #[must_use]
    pub fn with_components(
        executor: Arc<dyn HostExecutor>,
        ledger: Arc<OperationLedger>,
        undo: Arc<UndoManager>,
        activity: Arc<ActivityLogger>,
    ) -> Self {
        Self {
            executor,
            previews: PreviewGenerator::default(),
            ledger,
            undo,
            activity,
            ledger_max_age: warden_safety::ledger::DEFAULT_MAX_AGE,
        }
    }

    /// Use a custom preview generator.
    #[must_use]
    pub fn with_preview_generator(mut self, previews: PreviewGenerator) -> Self {
        self.previews = previews;
        self
    }

    /// Age after which decided ledger entries are dropped by
    /// [`cleanup_ledger`](Self::cleanup_ledger).
    #[must_use]
    pub fn with_ledger_max_age(mut self, max_age: Duration) -> Self {
        self.ledger_max_age = max_age;
        self
    }

    /// The approval ledger.
    #[must_use]
    pub fn ledger(&self) -> &Arc<OperationLedger> {
        &self.ledger
    }

    /// The undo manager.
    #[must_use]
    pub fn undo_manager(&self) -> &Arc<UndoManager> {
        &self.undo
    }

    /// The activity logger.
    #[must_use]
    pub fn activity(&self) -> &Arc<ActivityLogger> {
        &self.activity
    }

    /// Classify an operation and, if it needs approval, render a preview and
    /// add it to the ledger.
    pub fn propose(&self, tool_name: &str, operation: ProposedOperation) -> Proposal {
        let check = classify(&operation);
        let level = check.level();

        self.activity.log_tool_call(
            tool_name,
            serde_json::to_value(&operation).unwrap_or(Value::Null),
            json!({
                "risk_level": level,
                "needs_approval": check.needs_approval(),
                "findings": check.findings().len(),
            }),
        );

        if !check.needs_approval() {
            tracing::debug!(tool = tool_name, "operation allowed without approval");
            return Proposal {
                tool_name: tool_name.to_string(),
                operation,
                check,
                preview: None,
                operation_id: None,
            };
        }

        let preview = self.previews.generate_preview(&operation);
        let id = self.ledger.add_pending_operation(NewPendingOperation::new(
            tool_name,
            operation.clone(),
            level,
            preview.clone(),
        ));
        tracing::info!(%id, tool = tool_name, %level, summary = %operation.summary(), "approval required");

        Proposal {
            tool_name: tool_name.to_string(),
            operation,
            check,
            preview: Some(preview),
            operation_id: Some(id),
        }
    }

    /// Approve a pending operation.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::UnknownOperation`] if `id` is not in the ledger.
    pub fn approve(&self, id: &OperationId) -> GuardResult<()> {
        self.decide(id, true)
    }

    /// Deny a pending operation.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::UnknownOperation`] if `id` is not in the ledger.
    pub fn deny(&self, id: &OperationId) -> GuardResult<()> {
        self.decide(id, false)
    }

    fn decide(&self, id: &OperationId, approve: bool) -> GuardResult<()> {
        let entry = self.ledger.get(id).ok_or(GuardError::UnknownOperation(*id))?;
        if approve {
            self.ledger.approve_operation(id);
        } else {
            self.ledger.deny_operation(id);
        }
        let action = if approve {
            "approved operation"
        } else {
            "denied operation"
        };
        self.activity.log_user_action(
            action,
            json!({
                "operation_id": id.to_string(),
                "tool_name": entry.tool_name,
                "summary": entry.operation.summary(),
            }),
        );
        Ok(())
    }

    fn enforce_gate(&self, proposal: &Proposal) -> GuardResult<()> {
        let Some(id) = proposal.operation_id else {
            return Ok(());
        };
        match self.ledger.status(&id) {
            Some(OperationStatus::Approved) => Ok(()),
            Some(OperationStatus::Denied) => Err(GuardError::Denied { id }),
            Some(OperationStatus::Pending) => Err(GuardError::ApprovalRequired {
                id,
                level: proposal.check.level(),
            }),
            None => Err(GuardError::UnknownOperation(id)),
        }
    }

    /// Execute a proposal once the approval gate allows it.
    ///
    /// File writes and deletes are recorded with the undo manager before the
    /// executor is called, and the record is discarded if the call fails.
    /// Commands are not recorded. Refusals are logged like failures.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::ApprovalRequired`] while the proposal is pending,
    /// [`GuardError::Denied`] after a denial, [`GuardError::Undo`] if the
    /// target file cannot be backed up, and [`GuardError::Executor`] if the
    /// host operation fails.
    pub async fn execute(&self, proposal: &Proposal) -> GuardResult<Execution> {
        if let Err(e) = self.enforce_gate(proposal) {
            tracing::warn!(tool = %proposal.tool_name, error = %e, "execution blocked");
            self.activity.log_error(
                &e,
                json!({
                    "tool_name": proposal.tool_name,
                    "summary": proposal.operation.summary(),
                    "blocked": true,
                }),
            );
            return Err(e);
        }

        let started = std::time::Instant::now();
        let result = self.perform(&proposal.operation).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &result {
            Ok(execution) => {
                let success = !matches!(
                    execution,
                    Execution::Command { output, .. } if !output.success
                );
                self.activity.log_tool_result(
                    &proposal.tool_name,
                    execution_summary(execution),
                    success,
                    duration_ms,
                );
            },
            Err(e) => {
                self.activity.log_error(
                    e,
                    json!({
                        "tool_name": proposal.tool_name,
                        "summary": proposal.operation.summary(),
                    }),
                );
            },
        }
        result
    }

    async fn perform(&self, operation: &ProposedOperation) -> GuardResult<Execution> {
        match operation {
            ProposedOperation::WriteFile {
                path,
                content,
                old_content,
            } => {
                let undo_id = self
                    .undo
                    .record_file_write(path.as_str(), content.as_str(), old_content.clone())
                    .await?;
                if let Err(e) = self.executor.write_file(path, content).await {
                    self.undo.discard(&undo_id).await;
                    return Err(e.into());
                }
                self.activity.log_file_operation(
                    "write",
                    path,
                    json!({ "bytes": content.len(), "undo_id": undo_id.to_string() }),
                );
                Ok(Execution::FileWritten {
                    path: path.clone(),
                    undo_id,
                })
            },
            ProposedOperation::DeleteFile { path } => {
                let undo_id = self.undo.record_file_delete(path.as_str()).await?;
                if let Err(e) = self.executor.delete_file(path).await {
                    self.undo.discard(&undo_id).await;
                    return Err(e.into());
                }
                self.activity.log_file_operation(
                    "delete",
                    path,
                    json!({ "undo_id": undo_id.to_string() }),
                );
                Ok(Execution::FileDeleted {
                    path: path.clone(),
                    undo_id,
                })
            },
            ProposedOperation::ExecuteCommand {
                command,
                working_dir,
            } => {
                let output = self
                    .executor
                    .execute_command(command, working_dir.as_deref())
                    .await?;
                self.activity.log_command(
                    command,
                    working_dir.as_deref(),
                    serde_json::to_value(&output).ok(),
                );
                Ok(Execution::Command { output })
            },
            ProposedOperation::Other { kind, .. } => Ok(Execution::Unhandled { kind: kind.clone() }),
        }
    }

    /// Read a file. Reads are classified and logged but never gated or
    /// recorded for undo.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::Executor`] if the read fails.
    pub async fn read_file(&self, path: &str) -> GuardResult<FileRead> {
        let check = RiskClassifier::check_file_path(path, PathOperation::Read);
        if !check.is_safe {
            tracing::info!(path, level = %check.level, "reading sensitive path");
        }

        match self.executor.read_file(path).await {
            Ok(content) => {
                self.activity.log_file_operation(
                    "read",
                    path,
                    json!({ "bytes": content.len(), "risk_level": check.level }),
                );
                Ok(FileRead { content, check })
            },
            Err(e) => {
                let err = GuardError::from(e);
                self.activity.log_error(&err, json!({ "path": path }));
                Err(err)
            },
        }
    }

    /// Undo the most recent recorded operation.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::Undo`] with the undo manager's error.
    pub async fn undo(&self) -> GuardResult<UndoOutcome> {
        self.step("undo", self.undo.undo().await)
    }

    /// Redo the most recently undone operation.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::Undo`] with the undo manager's error.
    pub async fn redo(&self) -> GuardResult<UndoOutcome> {
        self.step("redo", self.undo.redo().await)
    }

    fn step(
        &self,
        action: &str,
        result: warden_undo::UndoResult<UndoOutcome>,
    ) -> GuardResult<UndoOutcome> {
        match result {
            Ok(outcome) => {
                self.activity.log_user_action(
                    action,
                    json!({
                        "operation_id": outcome.operation.id.to_string(),
                        "description": outcome.operation.description,
                    }),
                );
                Ok(outcome)
            },
            Err(e) => {
                let err = GuardError::from(e);
                self.activity.log_error(&err, json!({ "action": action }));
                Err(err)
            },
        }
    }

    /// Drop decided ledger entries older than the configured max age.
    pub fn cleanup_ledger(&self) -> usize {
        self.ledger.cleanup(self.ledger_max_age)
    }
}

fn classify(operation: &ProposedOperation) -> SafetyCheck {
    match operation {
        ProposedOperation::ExecuteCommand { command, .. } => {
            SafetyCheck::Command(RiskClassifier::check_command(command))
        },
        ProposedOperation::WriteFile { path, .. } => {
            SafetyCheck::Path(RiskClassifier::check_file_path(path, PathOperation::Write))
        },
        ProposedOperation::DeleteFile { path } => {
            SafetyCheck::Path(RiskClassifier::check_file_path(path, PathOperation::Delete))
        },
        ProposedOperation::Other { .. } => SafetyCheck::Unclassified,
    }
}

fn execution_summary(execution: &Execution) -> Value {
    match execution {
        Execution::FileWritten { path, undo_id } => {
            json!({ "written": path, "undo_id": undo_id.to_string() })
        },
        Execution::FileDeleted { path, undo_id } => {
            json!({ "deleted": path, "undo_id": undo_id.to_string() })
        },
        Execution::Command { output } => json!({
            "exit_code": output.exit_code,
            "stdout": output.stdout,
            "stderr": output.stderr,
        }),
        Execution::Unhandled { kind } => json!({ "unhandled": kind }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_test::MockExecutor;

    fn guard() -> SafetyGuard {
        SafetyGuard::new(Arc::new(MockExecutor::new()))
    }

    #[test]
    fn test_classify_dispatch() {
        let cmd = classify(&ProposedOperation::ExecuteCommand {
            command: "ls".into(),
            working_dir: None,
        });
        assert!(matches!(cmd, SafetyCheck::Command(_)));
        assert_eq!(cmd.level(), RiskLevel::Safe);

        let write = classify(&ProposedOperation::WriteFile {
            path: "/tmp/x".into(),
            content: String::new(),
            old_content: None,
        });
        assert_eq!(write.level(), RiskLevel::Low);

        let delete = classify(&ProposedOperation::DeleteFile {
            path: "/tmp/x".into(),
        });
        assert_eq!(delete.level(), RiskLevel::High);

        let other = classify(&ProposedOperation::from_tool_call("search", json!({})));
        assert_eq!(other, SafetyCheck::Unclassified);
        assert!(other.findings().is_empty());
    }

    #[test]
    fn test_safe_proposal_skips_ledger() {
        let guard = guard();
        let proposal = guard.propose(
            "execute_command",
            ProposedOperation::ExecuteCommand {
                command: "ls -la".into(),
                working_dir: None,
            },
        );
        assert!(!proposal.needs_approval());
        assert!(proposal.preview().is_none());
        assert_eq!(guard.ledger().count(), 0);
    }

    #[test]
    fn test_risky_proposal_is_pending() {
        let guard = guard();
        let proposal = guard.propose(
            "execute_command",
            ProposedOperation::ExecuteCommand {
                command: "sudo rm -rf /".into(),
                working_dir: None,
            },
        );
        let id = proposal.operation_id().unwrap();
        assert_eq!(proposal.check().level(), RiskLevel::Critical);
        assert!(matches!(proposal.preview(), Some(Preview::Command(_))));
        assert_eq!(guard.ledger().status(&id), Some(OperationStatus::Pending));
    }

    #[test]
    fn test_decide_unknown_id() {
        let guard = guard();
        let id = OperationId::new();
        assert!(matches!(guard.approve(&id), Err(GuardError::UnknownOperation(_))));
        assert!(matches!(guard.deny(&id), Err(GuardError::UnknownOperation(_))));
    }

    #[test]
    fn test_cleanup_ledger_keeps_recent() {
        let guard = guard().with_ledger_max_age(Duration::hours(1));
        let proposal = guard.propose(
            "delete_file",
            ProposedOperation::DeleteFile {
                path: "/tmp/x".into(),
            },
        );
        guard.deny(&proposal.operation_id().unwrap()).unwrap();
        assert_eq!(guard.cleanup_ledger(), 0);
        assert_eq!(guard.ledger().count(), 1);
    }
}
