//! `run` - execute a command through the guard.

use std::process::ExitCode;

use anyhow::Result;
use dialoguer::{Confirm, theme::ColorfulTheme};
use warden_guard::{Execution, GuardError, SafetyGuard};
use warden_safety::ProposedOperation;

use crate::commands::preview::render_preview;
use crate::theme::Theme;
use crate::{EXIT_FAILURE, EXIT_SUCCESS};

fn confirm() -> bool {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Run this command?")
        .default(false)
        .interact()
        .unwrap_or(false)
}

/// Classify, confirm if needed, and execute `command`.
pub(crate) async fn run_command(
    guard: &SafetyGuard,
    command: &str,
    working_dir: Option<String>,
    assume_yes: bool,
) -> Result<ExitCode> {
    let proposal = guard.propose(
        "execute_command",
        ProposedOperation::ExecuteCommand {
            command: command.to_string(),
            working_dir,
        },
    );

    if let (Some(id), Some(preview)) = (proposal.operation_id(), proposal.preview()) {
        println!(
            "{}",
            Theme::approval_box(
                "Approval required",
                &render_preview(preview),
                proposal.check().level()
            )
        );

        if assume_yes || confirm() {
            guard.approve(&id)?;
        } else {
            guard.deny(&id)?;
        }
    }

    let code = match guard.execute(&proposal).await {
        Ok(Execution::Command { output, .. }) => {
            print!("{}", output.stdout);
            eprint!("{}", output.stderr);
            if output.success {
                EXIT_SUCCESS
            } else {
                eprintln!(
                    "{}",
                    Theme::error(&format!("command exited with code {}", output.exit_code))
                );
                EXIT_FAILURE
            }
        },
        Ok(other) => {
            tracing::warn!(?other, "unexpected execution result");
            EXIT_FAILURE
        },
        Err(GuardError::Denied { .. }) => {
            eprintln!("{}", Theme::warning("command denied, nothing was run"));
            EXIT_FAILURE
        },
        Err(e) => {
            guard.activity().flush().await?;
            return Err(e.into());
        },
    };

    guard.activity().flush().await?;
    Ok(ExitCode::from(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use warden_executor::{LocalExecutor, LocalExecutorConfig};

    fn guard(dir: &std::path::Path) -> SafetyGuard {
        SafetyGuard::new(Arc::new(LocalExecutor::new(LocalExecutorConfig {
            base_dir: dir.to_path_buf(),
            ..Default::default()
        })))
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_safe_command_runs() {
        let dir = tempfile::tempdir().unwrap();
        let guard = guard(dir.path());

        let code = run_command(&guard, "echo hi", None, false).await.unwrap();
        assert_eq!(code, ExitCode::from(EXIT_SUCCESS));
        assert_eq!(guard.ledger().count(), 0);
        assert_eq!(guard.undo_manager().get_stats().await.undo_count, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_risky_command_runs_with_assume_yes() {
        let dir = tempfile::tempdir().unwrap();
        let guard = guard(dir.path());
        let target = dir.path().join("victim");
        std::fs::create_dir(&target).unwrap();

        let command = format!("rm -rf {}", target.display());
        let code = run_command(&guard, &command, None, true).await.unwrap();
        assert_eq!(code, ExitCode::from(EXIT_SUCCESS));
        assert!(!target.exists());
        assert_eq!(guard.ledger().get_pending_operations().len(), 0);
        assert_eq!(guard.ledger().count(), 1);
    }
}
