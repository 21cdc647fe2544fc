//! The host capability trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExecutorResult;

/// Outcome of a shell command that ran to completion.
///
/// A non-zero exit status is still `Ok` at the trait level; `success`
/// carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Exit code, `-1` if the process was terminated by a signal.
    pub exit_code: i32,
    /// Whether the exit status was success.
    pub success: bool,
    /// Wall-clock duration.
    pub duration_ms: u64,
    /// Directory the command ran in.
    pub working_dir: String,
}

/// Host side effects the safety subsystem may request.
///
/// Paths are plain strings as supplied by the caller. Implementations decide
/// how to resolve them (tilde expansion, relative paths).
#[async_trait]
pub trait HostExecutor: Send + Sync {
    /// Read a UTF-8 file.
    async fn read_file(&self, path: &str) -> ExecutorResult<String>;

    /// Create or overwrite a file.
    async fn write_file(&self, path: &str, content: &str) -> ExecutorResult<()>;

    /// Delete a file.
    async fn delete_file(&self, path: &str) -> ExecutorResult<()>;

    /// Rename `from` to `to`.
    async fn rename_file(&self, from: &str, to: &str) -> ExecutorResult<()>;

    /// Run a shell command, optionally in `working_dir`.
    async fn execute_command(
        &self,
        command: &str,
        working_dir: Option<&str>,
    ) -> ExecutorResult<CommandOutput>;

    /// Change the working directory tracked for `session_id`. Returns the
    /// resolved directory.
    async fn change_directory(&self, path: &str, session_id: &str) -> ExecutorResult<String>;
}
