//! [`HostExecutor`] backed by the local file system and `sh -c`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{ExecutorError, ExecutorResult};
use crate::executor::{CommandOutput, HostExecutor};

/// Expand a leading `~` to the user's home directory.
///
/// Only `~` and `~/...` are expanded. `~user` forms are returned unchanged.
///
/// # Errors
///
/// Returns [`ExecutorError::Other`] if the path needs expansion and no home
/// directory can be determined.
pub fn expand_tilde(path: &str) -> ExecutorResult<PathBuf> {
    let rest = if path == "~" {
        ""
    } else if let Some(rest) = path.strip_prefix("~/") {
        rest
    } else {
        return Ok(PathBuf::from(path));
    };
    let base = directories::BaseDirs::new()
        .ok_or_else(|| ExecutorError::Other("could not determine home directory".into()))?;
    Ok(base.home_dir().join(rest))
}

/// Limits for [`LocalExecutor`].
#[derive(Debug, Clone)]
pub struct LocalExecutorConfig {
    /// Wall-clock limit for each command.
    pub command_timeout: Duration,
    /// Largest file the executor reads or writes, in bytes.
    pub max_file_size: u64,
    /// Directory used for relative paths and commands without a working dir.
    pub base_dir: PathBuf,
}

impl Default for LocalExecutorConfig {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(300),
            max_file_size: 10_485_760,
            base_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

/// Executes operations directly on the local machine.
pub struct LocalExecutor {
    config: LocalExecutorConfig,
    sessions: RwLock<HashMap<String, PathBuf>>,
}

impl std::fmt::Debug for LocalExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new(LocalExecutorConfig::default())
    }
}

impl LocalExecutor {
    /// Create an executor with the given limits.
    #[must_use]
    pub fn new(config: LocalExecutorConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The directory currently tracked for `session_id`, if any.
    #[must_use]
    pub fn session_dir(&self, session_id: &str) -> Option<PathBuf> {
        self.sessions
            .read()
            .ok()
            .and_then(|sessions| sessions.get(session_id).cloned())
    }

    fn resolve(&self, path: &str) -> ExecutorResult<PathBuf> {
        if path.trim().is_empty() {
            return Err(ExecutorError::InvalidPath {
                path: path.to_string(),
                reason: "path is empty".into(),
            });
        }
        let expanded = expand_tilde(path)?;
        if expanded.is_absolute() {
            Ok(expanded)
        } else {
            Ok(self.config.base_dir.join(expanded))
        }
    }

    fn check_size(&self, path: &str, size: u64) -> ExecutorResult<()> {
        if size > self.config.max_file_size {
            return Err(ExecutorError::TooLarge {
                path: path.to_string(),
                size,
                limit: self.config.max_file_size,
            });
        }
        Ok(())
    }

    async fn require_dir(path: &Path, raw: &str) -> ExecutorResult<()> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| ExecutorError::from_io(raw, e))?;
        if !metadata.is_dir() {
            return Err(ExecutorError::InvalidPath {
                path: raw.to_string(),
                reason: "not a directory".into(),
            });
        }
        Ok(())
    }

    fn shell_command(command: &str) -> Command {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl HostExecutor for LocalExecutor {
    async fn read_file(&self, path: &str) -> ExecutorResult<String> {
        let resolved = self.resolve(path)?;
        let metadata = tokio::fs::metadata(&resolved)
            .await
            .map_err(|e| ExecutorError::from_io(path, e))?;
        if !metadata.is_file() {
            return Err(ExecutorError::InvalidPath {
                path: path.to_string(),
                reason: "not a regular file".into(),
            });
        }
        self.check_size(path, metadata.len())?;
        tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|e| ExecutorError::from_io(path, e))
    }

    async fn write_file(&self, path: &str, content: &str) -> ExecutorResult<()> {
        self.check_size(path, u64::try_from(content.len()).unwrap_or(u64::MAX))?;
        let resolved = self.resolve(path)?;
        if let Some(parent) = resolved.parent().filter(|p| !p.as_os_str().is_empty()) {
            Self::require_dir(parent, &parent.display().to_string()).await?;
        }
        tokio::fs::write(&resolved, content)
            .await
            .map_err(|e| ExecutorError::from_io(path, e))?;
        debug!(path = %resolved.display(), bytes = content.len(), "wrote file");
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> ExecutorResult<()> {
        let resolved = self.resolve(path)?;
        tokio::fs::remove_file(&resolved)
            .await
            .map_err(|e| ExecutorError::from_io(path, e))?;
        debug!(path = %resolved.display(), "deleted file");
        Ok(())
    }

    async fn rename_file(&self, from: &str, to: &str) -> ExecutorResult<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        tokio::fs::rename(&source, &target)
            .await
            .map_err(|e| ExecutorError::from_io(from, e))?;
        debug!(from = %source.display(), to = %target.display(), "renamed file");
        Ok(())
    }

    async fn execute_command(
        &self,
        command: &str,
        working_dir: Option<&str>,
    ) -> ExecutorResult<CommandOutput> {
        let dir = match working_dir {
            Some(dir) => self.resolve(dir)?,
            None => self.config.base_dir.clone(),
        };
        let dir_display = dir.display().to_string();
        Self::require_dir(&dir, &dir_display).await?;

        info!(command = %command, working_dir = %dir_display, "executing command");
        let start = Instant::now();
        let mut cmd = Self::shell_command(command);
        cmd.current_dir(&dir);

        let output = match tokio::time::timeout(self.config.command_timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(ExecutorError::Spawn {
                    command: command.to_string(),
                    source,
                });
            },
            Err(_) => {
                warn!(command = %command, "command timed out");
                return Err(ExecutorError::Timeout {
                    command: command.to_string(),
                    timeout_secs: self.config.command_timeout.as_secs(),
                });
            },
        };

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let exit_code = output.status.code().unwrap_or(-1);
        let success = output.status.success();
        if success {
            debug!(exit_code, duration_ms, "command finished");
        } else {
            warn!(command = %command, exit_code, duration_ms, "command failed");
        }

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
            success,
            duration_ms,
            working_dir: dir_display,
        })
    }

    async fn change_directory(&self, path: &str, session_id: &str) -> ExecutorResult<String> {
        let expanded = expand_tilde(path)?;
        let joined = if expanded.is_absolute() {
            expanded
        } else {
            self.session_dir(session_id)
                .unwrap_or_else(|| self.config.base_dir.clone())
                .join(expanded)
        };
        let canonical = tokio::fs::canonicalize(&joined)
            .await
            .map_err(|e| ExecutorError::from_io(path, e))?;
        Self::require_dir(&canonical, path).await?;

        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| ExecutorError::Other(e.to_string()))?;
        sessions.insert(session_id.to_string(), canonical.clone());
        Ok(canonical.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor_in(dir: &Path) -> LocalExecutor {
        LocalExecutor::new(LocalExecutorConfig {
            command_timeout: Duration::from_secs(5),
            max_file_size: 64,
            base_dir: dir.to_path_buf(),
        })
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/tmp/x").unwrap(), PathBuf::from("/tmp/x"));
        assert_eq!(expand_tilde("~other").unwrap(), PathBuf::from("~other"));
        if directories::BaseDirs::new().is_some() {
            assert!(expand_tilde("~/notes.txt").unwrap().is_absolute());
        }
    }

    #[tokio::test]
    async fn test_write_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let exec = executor_in(dir.path());

        exec.write_file("a.txt", "hello").await.unwrap();
        assert_eq!(exec.read_file("a.txt").await.unwrap(), "hello");

        exec.delete_file("a.txt").await.unwrap();
        assert!(exec.read_file("a.txt").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_write_requires_parent() {
        let dir = tempfile::tempdir().unwrap();
        let exec = executor_in(dir.path());
        let err = exec.write_file("missing/a.txt", "x").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let exec = executor_in(dir.path());
        let big = "x".repeat(65);
        assert!(matches!(
            exec.write_file("big.txt", &big).await,
            Err(ExecutorError::TooLarge { .. })
        ));

        std::fs::write(dir.path().join("big.txt"), &big).unwrap();
        assert!(matches!(
            exec.read_file("big.txt").await,
            Err(ExecutorError::TooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_rename() {
        let dir = tempfile::tempdir().unwrap();
        let exec = executor_in(dir.path());
        exec.write_file("old.txt", "data").await.unwrap();
        exec.rename_file("old.txt", "new.txt").await.unwrap();
        assert_eq!(exec.read_file("new.txt").await.unwrap(), "data");
        assert!(exec.read_file("old.txt").await.unwrap_err().is_not_found());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_command() {
        let dir = tempfile::tempdir().unwrap();
        let exec = executor_in(dir.path());

        let out = exec.execute_command("echo hi", None).await.unwrap();
        assert!(out.success);
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout.trim(), "hi");

        let out = exec.execute_command("exit 3", None).await.unwrap();
        assert!(!out.success);
        assert_eq!(out.exit_code, 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_command_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let exec = LocalExecutor::new(LocalExecutorConfig {
            command_timeout: Duration::from_millis(100),
            max_file_size: 64,
            base_dir: dir.path().to_path_buf(),
        });
        assert!(matches!(
            exec.execute_command("sleep 5", None).await,
            Err(ExecutorError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_execute_command_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let exec = executor_in(dir.path());
        let err = exec
            .execute_command("echo hi", Some("does-not-exist"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_change_directory_per_session() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let exec = executor_in(dir.path());

        let resolved = exec.change_directory("sub", "s1").await.unwrap();
        assert!(resolved.ends_with("sub"));
        assert!(exec.session_dir("s1").is_some());
        assert!(exec.session_dir("s2").is_none());

        assert!(exec.change_directory("nope", "s1").await.is_err());
    }
}
