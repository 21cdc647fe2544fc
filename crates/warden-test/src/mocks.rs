//! Mock implementations for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use warden_executor::{CommandOutput, ExecutorError, ExecutorResult, HostExecutor};

/// Which executor method a scripted failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailOn {
    /// [`HostExecutor::read_file`].
    Read,
    /// [`HostExecutor::write_file`].
    Write,
    /// [`HostExecutor::delete_file`].
    Delete,
    /// [`HostExecutor::rename_file`].
    Rename,
    /// [`HostExecutor::execute_command`].
    Command,
    /// [`HostExecutor::change_directory`].
    ChangeDirectory,
}

/// A recorded call on [`MockExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorCall {
    /// `read_file(path)`.
    ReadFile {
        /// Path argument.
        path: String,
    },
    /// `write_file(path, content)`.
    WriteFile {
        /// Path argument.
        path: String,
        /// Content argument.
        content: String,
    },
    /// `delete_file(path)`.
    DeleteFile {
        /// Path argument.
        path: String,
    },
    /// `rename_file(from, to)`.
    RenameFile {
        /// Source path.
        from: String,
        /// Destination path.
        to: String,
    },
    /// `execute_command(command, working_dir)`.
    ExecuteCommand {
        /// Command line.
        command: String,
        /// Working directory argument.
        working_dir: Option<String>,
    },
    /// `change_directory(path, session_id)`.
    ChangeDirectory {
        /// Target directory.
        path: String,
        /// Session argument.
        session_id: String,
    },
}

impl ExecutorCall {
    /// Whether the call mutates host state.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::ReadFile { .. })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory [`HostExecutor`].
///
/// Files live in a map keyed by the path string exactly as given. Every call
/// is appended to a log, and failures can be scripted per method with
/// [`MockExecutor::fail_next`]. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockExecutor {
    files: Arc<Mutex<HashMap<String, String>>>,
    directories: Arc<Mutex<HashMap<String, String>>>,
    calls: Arc<Mutex<Vec<ExecutorCall>>>,
    failures: Arc<Mutex<HashMap<FailOn, usize>>>,
    command_outputs: Arc<Mutex<VecDeque<CommandOutput>>>,
}

impl MockExecutor {
    /// Create an executor with an empty file system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file.
    #[must_use]
    pub fn with_file(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        lock(&self.files).insert(path.into(), content.into());
        self
    }

    /// Queue the output returned by the next `execute_command` call.
    ///
    /// With an empty queue, commands succeed with empty output.
    #[must_use]
    pub fn with_command_output(self, output: CommandOutput) -> Self {
        lock(&self.command_outputs).push_back(output);
        self
    }

    /// Make the next call of `method` fail.
    pub fn fail_next(&self, method: FailOn) {
        self.fail_times(method, 1);
    }

    /// Make the next `times` calls of `method` fail.
    pub fn fail_times(&self, method: FailOn, times: usize) {
        let mut failures = lock(&self.failures);
        let remaining = failures.entry(method).or_insert(0);
        *remaining = remaining.saturating_add(times);
    }

    /// Current content of a file.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<String> {
        lock(&self.files).get(path).cloned()
    }

    /// Whether a file exists.
    #[must_use]
    pub fn has_file(&self, path: &str) -> bool {
        lock(&self.files).contains_key(path)
    }

    /// Number of files present.
    #[must_use]
    pub fn file_count(&self) -> usize {
        lock(&self.files).len()
    }

    /// Directory last set for a session.
    #[must_use]
    pub fn directory(&self, session_id: &str) -> Option<String> {
        lock(&self.directories).get(session_id).cloned()
    }

    /// All calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ExecutorCall> {
        lock(&self.calls).clone()
    }

    /// Calls that mutated host state.
    #[must_use]
    pub fn mutations(&self) -> Vec<ExecutorCall> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn record(&self, call: ExecutorCall) {
        lock(&self.calls).push(call);
    }

    fn check_failure(&self, method: FailOn) -> ExecutorResult<()> {
        let mut failures = lock(&self.failures);
        match failures.get_mut(&method) {
            Some(remaining) if *remaining > 0 => {
                *remaining = remaining.saturating_sub(1);
                Err(ExecutorError::Other(format!("injected {method:?} failure")))
            },
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl HostExecutor for MockExecutor {
    async fn read_file(&self, path: &str) -> ExecutorResult<String> {
        self.record(ExecutorCall::ReadFile {
            path: path.to_string(),
        });
        self.check_failure(FailOn::Read)?;
        self.file(path).ok_or_else(|| ExecutorError::NotFound {
            path: path.to_string(),
        })
    }

    async fn write_file(&self, path: &str, content: &str) -> ExecutorResult<()> {
        self.record(ExecutorCall::WriteFile {
            path: path.to_string(),
            content: content.to_string(),
        });
        self.check_failure(FailOn::Write)?;
        lock(&self.files).insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> ExecutorResult<()> {
        self.record(ExecutorCall::DeleteFile {
            path: path.to_string(),
        });
        self.check_failure(FailOn::Delete)?;
        lock(&self.files)
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| ExecutorError::NotFound {
                path: path.to_string(),
            })
    }

    async fn rename_file(&self, from: &str, to: &str) -> ExecutorResult<()> {
        self.record(ExecutorCall::RenameFile {
            from: from.to_string(),
            to: to.to_string(),
        });
        self.check_failure(FailOn::Rename)?;
        let mut files = lock(&self.files);
        let content = files.remove(from).ok_or_else(|| ExecutorError::NotFound {
            path: from.to_string(),
        })?;
        files.insert(to.to_string(), content);
        Ok(())
    }

    async fn execute_command(
        &self,
        command: &str,
        working_dir: Option<&str>,
    ) -> ExecutorResult<CommandOutput> {
        self.record(ExecutorCall::ExecuteCommand {
            command: command.to_string(),
            working_dir: working_dir.map(str::to_string),
        });
        self.check_failure(FailOn::Command)?;
        let scripted = lock(&self.command_outputs).pop_front();
        Ok(scripted.unwrap_or_else(|| CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
            success: true,
            duration_ms: 0,
            working_dir: working_dir.unwrap_or("/").to_string(),
        }))
    }

    async fn change_directory(&self, path: &str, session_id: &str) -> ExecutorResult<String> {
        self.record(ExecutorCall::ChangeDirectory {
            path: path.to_string(),
            session_id: session_id.to_string(),
        });
        self.check_failure(FailOn::ChangeDirectory)?;
        lock(&self.directories).insert(session_id.to_string(), path.to_string());
        Ok(path.to_string())
    }
}
