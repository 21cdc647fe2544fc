//! Test fixtures for common types.

use serde_json::{Value, json};
use warden_core::{OperationId, SessionId};
use warden_executor::CommandOutput;

/// Create a test operation ID.
#[must_use]
pub fn test_operation_id() -> OperationId {
    OperationId::new()
}

/// Create a test session ID.
#[must_use]
pub fn test_session_id() -> SessionId {
    SessionId::new()
}

/// A successful command output with the given stdout.
#[must_use]
pub fn test_command_output(stdout: impl Into<String>) -> CommandOutput {
    CommandOutput {
        stdout: stdout.into(),
        stderr: String::new(),
        exit_code: 0,
        success: true,
        duration_ms: 5,
        working_dir: "/tmp".to_string(),
    }
}

/// A failed command output with the given exit code and stderr.
#[must_use]
pub fn test_failed_output(exit_code: i32, stderr: impl Into<String>) -> CommandOutput {
    CommandOutput {
        stdout: String::new(),
        stderr: stderr.into(),
        exit_code,
        success: false,
        duration_ms: 5,
        working_dir: "/tmp".to_string(),
    }
}

/// Tool parameters for a `write_file` call.
#[must_use]
pub fn test_write_params(path: &str, content: &str) -> Value {
    json!({ "path": path, "content": content })
}

/// Tool parameters for an `execute_command` call.
#[must_use]
pub fn test_command_params(command: &str) -> Value {
    json!({ "command": command })
}

/// Tool parameters for a `delete_file` call.
#[must_use]
pub fn test_delete_params(path: &str) -> Value {
    json!({ "path": path })
}

/// `lines` numbered lines joined by `\n`, each prefixed with `prefix`.
#[must_use]
pub fn numbered_lines(prefix: &str, lines: usize) -> String {
    (0..lines)
        .map(|i| format!("{prefix} {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}
