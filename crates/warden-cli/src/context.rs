//! Wiring of the safety components from the loaded configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use warden_activity::{ActivityLogger, ActivitySettings};
use warden_config::Config;
use warden_executor::{HostExecutor, LocalExecutor, LocalExecutorConfig};
use warden_guard::SafetyGuard;
use warden_safety::{OperationLedger, PreviewGenerator};
use warden_storage::{FileKvStore, KvStore};
use warden_undo::UndoManager;

pub(crate) fn activity_settings(config: &Config) -> ActivitySettings {
    ActivitySettings {
        capacity: config.activity.capacity,
        persist_limit: config.activity.persist_limit,
        text_truncate: config.activity.text_truncate,
        result_truncate: config.activity.result_truncate,
    }
}

pub(crate) fn preview_generator(config: &Config) -> PreviewGenerator {
    PreviewGenerator::new(config.safety.max_diff_lines)
}

/// Activity logger backed by the configured data directory, or memory-only
/// when no data directory can be determined.
pub(crate) async fn open_activity(config: &Config) -> Result<ActivityLogger> {
    let settings = activity_settings(config);
    let Some(dir) = config.data_dir() else {
        tracing::warn!("no data directory available, activity log will not be persisted");
        return Ok(ActivityLogger::with_settings(settings));
    };

    let store = FileKvStore::open(&dir)
        .await
        .with_context(|| format!("failed to open data directory {}", dir.display()))?;
    let backend: Arc<dyn KvStore> = Arc::new(store);
    ActivityLogger::open(backend, settings)
        .await
        .context("failed to open activity log")
}

/// Build a guard over the local machine.
pub(crate) async fn build_guard(config: &Config) -> Result<SafetyGuard> {
    let base_dir = std::env::current_dir().context("failed to resolve current directory")?;
    let executor: Arc<dyn HostExecutor> = Arc::new(LocalExecutor::new(LocalExecutorConfig {
        command_timeout: config.command_timeout(),
        max_file_size: config.executor.max_file_size,
        base_dir,
    }));

    let undo = Arc::new(UndoManager::with_capacity(
        Arc::clone(&executor),
        config.undo.capacity,
    ));
    let activity = Arc::new(open_activity(config).await?);
    let ledger_max_age = chrono::Duration::from_std(config.ledger_max_age())
        .unwrap_or(warden_safety::ledger::DEFAULT_MAX_AGE);

    Ok(SafetyGuard::with_components(
        executor,
        Arc::new(OperationLedger::new()),
        undo,
        activity,
    )
    .with_preview_generator(preview_generator(config))
    .with_ledger_max_age(ledger_max_age))
}
