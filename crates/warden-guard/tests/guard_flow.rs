//! End-to-end tests of the propose / approve / execute / undo flow.

use std::sync::Arc;

use warden_activity::{LogLevel, LogType};
use warden_core::RiskLevel;
use warden_guard::{Execution, GuardError, SafetyGuard};
use warden_safety::{OperationStatus, Preview, ProposedOperation};
use warden_test::{
    ExecutorCall, FailOn, MockExecutor, test_command_params, test_failed_output,
    test_write_params,
};
use warden_undo::ActionResult;

fn setup() -> (MockExecutor, SafetyGuard) {
    let executor = MockExecutor::new().with_file("/project/README.md", "# old\n");
    let guard = SafetyGuard::new(Arc::new(executor.clone()));
    (executor, guard)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_read_is_never_gated_or_recorded() {
    let executor = MockExecutor::new().with_file("/home/user/notes.txt", "hello");
    let guard = SafetyGuard::new(Arc::new(executor.clone()));

    let read = guard.read_file("/home/user/notes.txt").await.unwrap();
    assert_eq!(read.content, "hello");
    assert!(read.check.is_safe);
    assert_eq!(read.check.level, RiskLevel::Safe);

    assert_eq!(guard.ledger().count(), 0);
    assert_eq!(guard.undo_manager().get_stats().await.undo_count, 0);
    assert!(executor.mutations().is_empty());

    let logs = guard.activity().get_logs_by_type(LogType::FileOperation, None);
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].data["operation"], "read");
}

#[tokio::test]
async fn test_sensitive_read_is_flagged_but_allowed() {
    let executor = MockExecutor::new().with_file("~/.ssh/id_rsa", "key");
    let guard = SafetyGuard::new(Arc::new(executor));

    let read = guard.read_file("~/.ssh/id_rsa").await.unwrap();
    assert_eq!(read.content, "key");
    assert_eq!(read.check.level, RiskLevel::Medium);
    assert_eq!(guard.ledger().count(), 0);
}

#[tokio::test]
async fn test_missing_read_is_logged_as_error() {
    let (_executor, guard) = setup();

    let err = guard.read_file("/nope").await.unwrap_err();
    assert!(matches!(err, GuardError::Executor(e) if e.is_not_found()));
    assert_eq!(guard.activity().get_logs_by_level(LogLevel::Error, None).len(), 1);
}

// ---------------------------------------------------------------------------
// Approval gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_pending_operation_is_refused() {
    let (executor, guard) = setup();
    let proposal = guard.propose(
        "write_file",
        ProposedOperation::from_tool_call("write_file", test_write_params("/project/a.txt", "x")),
    );
    assert!(proposal.needs_approval());
    assert_eq!(proposal.check().level(), RiskLevel::Low);

    let err = guard.execute(&proposal).await.unwrap_err();
    assert!(matches!(
        err,
        GuardError::ApprovalRequired { level: RiskLevel::Low, .. }
    ));
    assert!(executor.mutations().is_empty());
    assert_eq!(guard.undo_manager().get_stats().await.undo_count, 0);

    let errors = guard.activity().get_logs_by_type(LogType::Error, None);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].data["context"]["tool_name"], "write_file");
    assert_eq!(errors[0].data["context"]["blocked"], true);
}

#[tokio::test]
async fn test_denied_operation_is_refused() {
    let (executor, guard) = setup();
    let proposal = guard.propose(
        "delete_file",
        ProposedOperation::DeleteFile {
            path: "/project/README.md".into(),
        },
    );
    let id = proposal.operation_id().unwrap();
    assert!(matches!(proposal.preview(), Some(Preview::FileDelete(_))));

    guard.deny(&id).unwrap();
    assert_eq!(guard.ledger().status(&id), Some(OperationStatus::Denied));

    let err = guard.execute(&proposal).await.unwrap_err();
    assert!(matches!(err, GuardError::Denied { id: denied } if denied == id));
    assert!(executor.has_file("/project/README.md"));

    let actions = guard.activity().get_logs_by_type(LogType::UserAction, None);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].message, "denied operation");

    let errors = guard.activity().get_logs_by_type(LogType::Error, None);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("was denied"));
}

#[tokio::test]
async fn test_unknown_operation_is_refused_and_logged() {
    let (executor, guard) = setup();
    let (_, other) = setup();
    let proposal = other.propose(
        "delete_file",
        ProposedOperation::DeleteFile {
            path: "/project/README.md".into(),
        },
    );

    let err = guard.execute(&proposal).await.unwrap_err();
    assert!(matches!(err, GuardError::UnknownOperation(_)));
    assert!(executor.has_file("/project/README.md"));
    assert_eq!(guard.activity().get_logs_by_type(LogType::Error, None).len(), 1);
}

#[tokio::test]
async fn test_safe_command_runs_without_approval() {
    let (executor, guard) = setup();
    let proposal = guard.propose(
        "execute_command",
        ProposedOperation::from_tool_call("execute_command", test_command_params("ls -la")),
    );
    assert!(!proposal.needs_approval());

    let execution = guard.execute(&proposal).await.unwrap();
    let Execution::Command { output, .. } = execution else {
        panic!("expected command execution");
    };
    assert!(output.success);
    assert_eq!(
        executor.mutations(),
        vec![ExecutorCall::ExecuteCommand {
            command: "ls -la".into(),
            working_dir: None,
        }]
    );
    assert_eq!(guard.activity().get_logs_by_type(LogType::Command, None).len(), 1);
    assert_eq!(guard.undo_manager().get_stats().await.undo_count, 0);
}

#[tokio::test]
async fn test_failed_command_logs_error_result() {
    let executor = MockExecutor::new().with_command_output(test_failed_output(2, "boom"));
    let guard = SafetyGuard::new(Arc::new(executor));
    let proposal = guard.propose(
        "execute_command",
        ProposedOperation::ExecuteCommand {
            command: "make".into(),
            working_dir: None,
        },
    );

    let execution = guard.execute(&proposal).await.unwrap();
    assert!(matches!(execution, Execution::Command { ref output, .. } if output.exit_code == 2));

    let results = guard.activity().get_logs_by_type(LogType::ToolResult, None);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].level, LogLevel::Error);
}

#[tokio::test]
async fn test_unhandled_kind_passes_through() {
    let (executor, guard) = setup();
    let proposal = guard.propose(
        "web_search",
        ProposedOperation::from_tool_call("web_search", serde_json::json!({"q": "rust"})),
    );
    assert!(!proposal.needs_approval());

    let execution = guard.execute(&proposal).await.unwrap();
    assert_eq!(
        execution,
        Execution::Unhandled {
            kind: "web_search".into()
        }
    );
    assert!(executor.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Execute and undo
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_approved_write_can_be_undone_and_redone() {
    let (executor, guard) = setup();
    let proposal = guard.propose(
        "write_file",
        ProposedOperation::WriteFile {
            path: "/project/README.md".into(),
            content: "# new\n".into(),
            old_content: Some("# old\n".into()),
        },
    );
    let Some(Preview::FileWrite(preview)) = proposal.preview() else {
        panic!("expected file write preview");
    };
    assert!(!preview.is_new_file);

    guard.approve(&proposal.operation_id().unwrap()).unwrap();
    let execution = guard.execute(&proposal).await.unwrap();
    assert!(matches!(execution, Execution::FileWritten { .. }));
    assert_eq!(executor.file("/project/README.md").as_deref(), Some("# new\n"));

    let undone = guard.undo().await.unwrap();
    assert!(matches!(undone.result, ActionResult::Written { .. }));
    assert_eq!(executor.file("/project/README.md").as_deref(), Some("# old\n"));

    guard.redo().await.unwrap();
    assert_eq!(executor.file("/project/README.md").as_deref(), Some("# new\n"));

    let actions: Vec<_> = guard
        .activity()
        .get_logs_by_type(LogType::UserAction, None)
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert_eq!(actions, ["approved operation", "undo", "redo"]);
}

#[tokio::test]
async fn test_undo_of_new_file_removes_it() {
    let (executor, guard) = setup();
    let proposal = guard.propose(
        "write_file",
        ProposedOperation::from_tool_call("write_file", test_write_params("/project/new.rs", "fn main() {}")),
    );
    guard.approve(&proposal.operation_id().unwrap()).unwrap();
    guard.execute(&proposal).await.unwrap();
    assert!(executor.has_file("/project/new.rs"));

    guard.undo().await.unwrap();
    assert!(!executor.has_file("/project/new.rs"));
}

#[tokio::test]
async fn test_approved_delete_can_be_undone() {
    let (executor, guard) = setup();
    let proposal = guard.propose(
        "delete_file",
        ProposedOperation::DeleteFile {
            path: "/project/README.md".into(),
        },
    );
    guard.approve(&proposal.operation_id().unwrap()).unwrap();

    let execution = guard.execute(&proposal).await.unwrap();
    assert!(matches!(execution, Execution::FileDeleted { .. }));
    assert!(!executor.has_file("/project/README.md"));

    guard.undo().await.unwrap();
    assert_eq!(executor.file("/project/README.md").as_deref(), Some("# old\n"));
}

#[tokio::test]
async fn test_commands_do_not_block_earlier_undo() {
    let (executor, guard) = setup();
    let write = guard.propose(
        "write_file",
        ProposedOperation::from_tool_call("write_file", test_write_params("/project/a.txt", "x")),
    );
    guard.approve(&write.operation_id().unwrap()).unwrap();
    guard.execute(&write).await.unwrap();

    let ls = guard.propose(
        "execute_command",
        ProposedOperation::from_tool_call("execute_command", test_command_params("ls")),
    );
    guard.execute(&ls).await.unwrap();

    guard.undo().await.unwrap();
    assert!(!executor.has_file("/project/a.txt"));
}

#[tokio::test]
async fn test_executor_failure_discards_undo_record() {
    let (executor, guard) = setup();
    let first = guard.propose(
        "write_file",
        ProposedOperation::from_tool_call("write_file", test_write_params("/project/a.txt", "x")),
    );
    guard.approve(&first.operation_id().unwrap()).unwrap();
    guard.execute(&first).await.unwrap();

    let second = guard.propose(
        "write_file",
        ProposedOperation::from_tool_call("write_file", test_write_params("/project/b.txt", "y")),
    );
    guard.approve(&second.operation_id().unwrap()).unwrap();
    executor.fail_next(FailOn::Write);

    let err = guard.execute(&second).await.unwrap_err();
    assert!(matches!(err, GuardError::Executor(_)));
    assert_eq!(guard.undo_manager().get_stats().await.undo_count, 1);
    assert_eq!(guard.activity().get_logs_by_type(LogType::Error, None).len(), 1);

    guard.undo().await.unwrap();
    assert!(!executor.has_file("/project/a.txt"));
}

#[tokio::test]
async fn test_write_over_unreadable_file_is_refused() {
    let (executor, guard) = setup();
    let proposal = guard.propose(
        "write_file",
        ProposedOperation::from_tool_call("write_file", test_write_params("/project/README.md", "x")),
    );
    guard.approve(&proposal.operation_id().unwrap()).unwrap();
    executor.fail_next(FailOn::Read);

    let err = guard.execute(&proposal).await.unwrap_err();
    assert!(matches!(err, GuardError::Undo(warden_undo::UndoError::Executor(_))));
    assert_eq!(executor.file("/project/README.md").as_deref(), Some("# old\n"));
    assert_eq!(guard.undo_manager().get_stats().await.undo_count, 0);
}

#[tokio::test]
async fn test_undo_on_empty_history_is_logged() {
    let (_executor, guard) = setup();

    let err = guard.undo().await.unwrap_err();
    assert!(matches!(err, GuardError::Undo(warden_undo::UndoError::NothingToUndo)));
    assert_eq!(guard.activity().get_logs_by_level(LogLevel::Error, None).len(), 1);
}
