//! The activity logger.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tokio::sync::watch;
use warden_core::{LogEntryId, SessionId, Timestamp};
use warden_storage::{KvStore, ScopedKvStore};

use crate::entry::{LogEntry, LogLevel, LogType};
use crate::error::ActivityResult;
use crate::export::{ExportFormat, render};
use crate::filter::LogFilter;

/// Namespace holding the persisted log.
pub const NAMESPACE: &str = "warden:activity";

/// Key of the persisted log within [`NAMESPACE`].
pub const STORAGE_KEY: &str = "activity_logs";

/// Size and truncation limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySettings {
    /// Entries kept in memory.
    pub capacity: usize,
    /// Most recent entries written to storage.
    pub persist_limit: usize,
    /// Character limit for prompts, responses and command results.
    pub text_truncate: usize,
    /// Serialized-length limit for tool results.
    pub result_truncate: usize,
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            capacity: 1000,
            persist_limit: 200,
            text_truncate: 500,
            result_truncate: 1000,
        }
    }
}

/// Handle returned by [`ActivityLogger::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&LogEntry) + Send + Sync>;

/// Aggregate counters from [`ActivityLogger::get_stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStats {
    /// Entries held.
    pub total: usize,
    /// Count per level.
    pub by_level: BTreeMap<LogLevel, usize>,
    /// Count per kind.
    pub by_type: BTreeMap<LogType, usize>,
    /// Entries at [`LogLevel::Error`].
    pub errors: usize,
    /// Entries at [`LogLevel::Warn`].
    pub warnings: usize,
}

/// State shared with the background persister.
struct Shared {
    entries: RwLock<VecDeque<LogEntry>>,
    store: Option<ScopedKvStore>,
    persist_limit: usize,
    write_lock: tokio::sync::Mutex<()>,
}

impl Shared {
    fn tail(&self, n: usize) -> Vec<LogEntry> {
        let Ok(entries) = self.entries.read() else {
            return Vec::new();
        };
        entries
            .iter()
            .skip(entries.len().saturating_sub(n))
            .cloned()
            .collect()
    }

    async fn persist(&self) -> ActivityResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let _guard = self.write_lock.lock().await;
        let snapshot = self.tail(self.persist_limit);
        store.set_json(STORAGE_KEY, &snapshot).await?;
        tracing::trace!(entries = snapshot.len(), "activity log persisted");
        Ok(())
    }
}

/// Bounded in-memory activity log with optional persistence.
///
/// Entries beyond `capacity` are dropped oldest first. With persistence, the
/// most recent `persist_limit` entries are written to the store in the
/// background after every change. Bursts of changes coalesce into one write.
///
/// # Example
///
/// ```
/// use warden_activity::{ActivityLogger, LogType};
///
/// let logger = ActivityLogger::new();
/// logger.log_system("started", serde_json::json!({}));
/// assert_eq!(logger.get_logs_by_type(LogType::System, None).len(), 1);
/// ```
pub struct ActivityLogger {
    shared: Arc<Shared>,
    settings: ActivitySettings,
    filter: RwLock<LogFilter>,
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
    session_id: OnceLock<SessionId>,
    persist_tx: Option<watch::Sender<()>>,
}

impl fmt::Debug for ActivityLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityLogger")
            .field("settings", &self.settings)
            .field("len", &self.len())
            .field("persistent", &self.shared.store.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for ActivityLogger {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_text(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn truncate_value(value: Value, max: usize) -> Value {
    let serialized = value.to_string();
    if serialized.chars().count() <= max {
        return value;
    }
    json!({
        "__truncated": true,
        "preview": truncate_text(&serialized, max),
    })
}

impl ActivityLogger {
    /// Create a memory-only logger with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(ActivitySettings::default())
    }

    /// Create a memory-only logger.
    #[must_use]
    pub fn with_settings(settings: ActivitySettings) -> Self {
        Self::build(settings, None, VecDeque::new(), None)
    }

    /// Create a persistent logger with default settings.
    ///
    /// Restores previously persisted entries from `store`. Must be called
    /// within a Tokio runtime.
    pub async fn with_persistence(store: ScopedKvStore) -> Self {
        Self::with_persistence_settings(store, ActivitySettings::default()).await
    }

    /// Create a persistent logger over `backend`, scoped to [`NAMESPACE`].
    ///
    /// # Errors
    ///
    /// Returns a storage error if the namespace is rejected by the backend.
    pub async fn open(backend: Arc<dyn KvStore>, settings: ActivitySettings) -> ActivityResult<Self> {
        let store = ScopedKvStore::new(backend, NAMESPACE)?;
        Ok(Self::with_persistence_settings(store, settings).await)
    }

    /// Create a persistent logger.
    ///
    /// A missing or unreadable persisted log starts the logger empty.
    pub async fn with_persistence_settings(store: ScopedKvStore, settings: ActivitySettings) -> Self {
        let restored = match store.get_json::<Vec<LogEntry>>(STORAGE_KEY).await {
            Ok(Some(entries)) => {
                tracing::debug!(count = entries.len(), "restored activity log");
                entries
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to restore activity log");
                Vec::new()
            },
        };

        let mut entries: VecDeque<LogEntry> = restored.into();
        while entries.len() > settings.capacity {
            entries.pop_front();
        }

        let (tx, rx) = watch::channel(());
        let logger = Self::build(settings, Some(store), entries, Some(tx));
        tokio::spawn(run_persister(Arc::clone(&logger.shared), rx));
        logger
    }

    fn build(
        settings: ActivitySettings,
        store: Option<ScopedKvStore>,
        entries: VecDeque<LogEntry>,
        persist_tx: Option<watch::Sender<()>>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                entries: RwLock::new(entries),
                store,
                persist_limit: settings.persist_limit,
                write_lock: tokio::sync::Mutex::new(()),
            }),
            settings,
            filter: RwLock::new(LogFilter::default()),
            listeners: RwLock::new(Vec::new()),
            next_listener: AtomicU64::new(0),
            session_id: OnceLock::new(),
            persist_tx,
        }
    }

    /// Limits in effect.
    #[must_use]
    pub fn settings(&self) -> ActivitySettings {
        self.settings
    }

    /// Session id stamped on every entry from this logger.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        *self.session_id.get_or_init(SessionId::new)
    }

    /// Number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.entries.read().map_or(0, |e| e.len())
    }

    /// Whether no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn schedule_persist(&self) {
        if let Some(tx) = &self.persist_tx {
            let _ = tx.send(());
        }
    }

    /// Write the most recent entries to storage now.
    ///
    /// # Errors
    ///
    /// Returns a storage or serialization error. A memory-only logger always
    /// succeeds.
    pub async fn flush(&self) -> ActivityResult<()> {
        self.shared.persist().await
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Append an entry.
    pub fn log(
        &self,
        level: LogLevel,
        kind: LogType,
        message: impl Into<String>,
        data: Value,
    ) -> LogEntry {
        let entry = LogEntry {
            id: LogEntryId::new(),
            level,
            kind,
            message: message.into(),
            data,
            timestamp: Timestamp::now(),
            session_id: self.session_id(),
        };

        if let Ok(mut entries) = self.shared.entries.write() {
            entries.push_back(entry.clone());
            while entries.len() > self.settings.capacity {
                entries.pop_front();
            }
        }

        match level {
            LogLevel::Debug => tracing::debug!(kind = %kind, id = %entry.id, "{}", entry.message),
            LogLevel::Info | LogLevel::Success => {
                tracing::info!(kind = %kind, id = %entry.id, "{}", entry.message);
            },
            LogLevel::Warn => tracing::warn!(kind = %kind, id = %entry.id, "{}", entry.message),
            LogLevel::Error => tracing::error!(kind = %kind, id = %entry.id, "{}", entry.message),
        }

        self.notify(&entry);
        self.schedule_persist();
        entry
    }

    fn notify(&self, entry: &LogEntry) {
        let listeners: Vec<Listener> = match self.listeners.read() {
            Ok(l) => l.iter().map(|(_, f)| Arc::clone(f)).collect(),
            Err(_) => return,
        };
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(entry))).is_err() {
                tracing::error!(id = %entry.id, "activity listener panicked");
            }
        }
    }

    /// Log a prompt sent to a model.
    pub fn log_ai_request(&self, prompt: &str, model: &str, context: Value) -> LogEntry {
        self.log(
            LogLevel::Info,
            LogType::AiRequest,
            "AI request",
            json!({
                "prompt": truncate_text(prompt, self.settings.text_truncate),
                "model": model,
                "context": context,
                "tokens": prompt.chars().count(),
            }),
        )
    }

    /// Log a model response.
    pub fn log_ai_response(&self, response: &str, duration_ms: u64, tokens: u64) -> LogEntry {
        self.log(
            LogLevel::Info,
            LogType::AiResponse,
            "AI response",
            json!({
                "response": truncate_text(response, self.settings.text_truncate),
                "duration_ms": duration_ms,
                "tokens": tokens,
            }),
        )
    }

    /// Log a tool invocation.
    pub fn log_tool_call(&self, tool_name: &str, params: Value, context: Value) -> LogEntry {
        self.log(
            LogLevel::Info,
            LogType::ToolCall,
            format!("tool call: {tool_name}"),
            json!({
                "tool_name": tool_name,
                "params": params,
                "context": context,
            }),
        )
    }

    /// Log a tool result at [`LogLevel::Success`] or [`LogLevel::Error`].
    pub fn log_tool_result(
        &self,
        tool_name: &str,
        result: Value,
        success: bool,
        duration_ms: u64,
    ) -> LogEntry {
        let level = if success {
            LogLevel::Success
        } else {
            LogLevel::Error
        };
        self.log(
            level,
            LogType::ToolResult,
            format!("tool result: {tool_name}"),
            json!({
                "tool_name": tool_name,
                "result": truncate_value(result, self.settings.result_truncate),
                "success": success,
                "duration_ms": duration_ms,
            }),
        )
    }

    /// Log a shell command and, when known, its result.
    pub fn log_command(
        &self,
        command: &str,
        working_dir: Option<&str>,
        result: Option<Value>,
    ) -> LogEntry {
        self.log(
            LogLevel::Info,
            LogType::Command,
            format!("execute command: {command}"),
            json!({
                "command": command,
                "working_dir": working_dir,
                "result": result.map(|r| truncate_value(r, self.settings.text_truncate)),
            }),
        )
    }

    /// Log a file operation. Object `details` are merged into the data.
    pub fn log_file_operation(&self, operation: &str, path: &str, details: Value) -> LogEntry {
        let mut data = Map::new();
        data.insert("operation".into(), json!(operation));
        data.insert("path".into(), json!(path));
        match details {
            Value::Object(extra) => data.extend(extra),
            Value::Null => {},
            other => {
                data.insert("details".into(), other);
            },
        }
        self.log(
            LogLevel::Info,
            LogType::FileOperation,
            format!("{operation}: {path}"),
            Value::Object(data),
        )
    }

    /// Log an error with its source chain.
    pub fn log_error(&self, error: &dyn std::error::Error, context: Value) -> LogEntry {
        let mut sources = Vec::new();
        let mut current = error.source();
        while let Some(source) = current {
            sources.push(source.to_string());
            current = source.source();
        }
        self.log(
            LogLevel::Error,
            LogType::Error,
            error.to_string(),
            json!({
                "error": {
                    "message": error.to_string(),
                    "sources": sources,
                },
                "context": context,
            }),
        )
    }

    /// Log something the user did.
    pub fn log_user_action(&self, action: &str, details: Value) -> LogEntry {
        self.log(LogLevel::Info, LogType::UserAction, action, details)
    }

    /// Log an internal event.
    pub fn log_system(&self, message: &str, data: Value) -> LogEntry {
        self.log(LogLevel::Info, LogType::System, message, data)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    fn select(&self, predicate: impl Fn(&LogEntry) -> bool, limit: Option<usize>) -> Vec<LogEntry> {
        let Ok(entries) = self.shared.entries.read() else {
            return Vec::new();
        };
        let matched: Vec<&LogEntry> = entries.iter().filter(|e| predicate(e)).collect();
        let skip = limit.map_or(0, |n| matched.len().saturating_sub(n));
        matched.into_iter().skip(skip).cloned().collect()
    }

    /// Entries passing the active filter, oldest first. With `limit`, only
    /// the most recent `limit` of them.
    #[must_use]
    pub fn get_logs(&self, limit: Option<usize>) -> Vec<LogEntry> {
        let filter = self.filters();
        self.select(|e| filter.matches(e), limit)
    }

    /// The most recent `count` entries, ignoring the filter.
    #[must_use]
    pub fn get_recent_logs(&self, count: usize) -> Vec<LogEntry> {
        self.shared.tail(count)
    }

    /// Entries of `kind`, ignoring the filter.
    #[must_use]
    pub fn get_logs_by_type(&self, kind: LogType, limit: Option<usize>) -> Vec<LogEntry> {
        self.select(|e| e.kind == kind, limit)
    }

    /// Entries at `level`, ignoring the filter.
    #[must_use]
    pub fn get_logs_by_level(&self, level: LogLevel, limit: Option<usize>) -> Vec<LogEntry> {
        self.select(|e| e.level == level, limit)
    }

    /// Case-insensitive search over message and data, ignoring the filter.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<LogEntry> {
        let query = query.to_lowercase();
        self.select(|e| e.matches_query(&query), None)
    }

    /// Overlay the set fields of `filter` onto the active filter.
    pub fn set_filters(&self, filter: LogFilter) {
        if let Ok(mut active) = self.filter.write() {
            *active = std::mem::take(&mut *active).merge(filter);
        }
    }

    /// Reset the active filter.
    pub fn clear_filters(&self) {
        if let Ok(mut active) = self.filter.write() {
            *active = LogFilter::default();
        }
    }

    /// The active filter.
    #[must_use]
    pub fn filters(&self) -> LogFilter {
        self.filter.read().map(|f| f.clone()).unwrap_or_default()
    }

    /// Counters over all held entries.
    #[must_use]
    pub fn get_stats(&self) -> ActivityStats {
        let Ok(entries) = self.shared.entries.read() else {
            return ActivityStats::default();
        };
        let mut stats = ActivityStats {
            total: entries.len(),
            ..ActivityStats::default()
        };
        for entry in entries.iter() {
            let by_level = stats.by_level.entry(entry.level).or_insert(0);
            *by_level = by_level.saturating_add(1);
            let by_type = stats.by_type.entry(entry.kind).or_insert(0);
            *by_type = by_type.saturating_add(1);
        }
        stats.errors = stats.by_level.get(&LogLevel::Error).copied().unwrap_or(0);
        stats.warnings = stats.by_level.get(&LogLevel::Warn).copied().unwrap_or(0);
        stats
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.shared.entries.write() {
            entries.clear();
        }
        self.schedule_persist();
    }

    /// Render [`get_logs`](Self::get_logs) as `json`, `csv` or `txt`.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::UnsupportedFormat`](crate::ActivityError::UnsupportedFormat)
    /// for any other format name.
    pub fn export(&self, format: &str) -> ActivityResult<String> {
        let format: ExportFormat = format.parse()?;
        render(&self.get_logs(None), format)
    }

    // -----------------------------------------------------------------------
    // Listeners
    // -----------------------------------------------------------------------

    /// Call `listener` synchronously for every new entry.
    ///
    /// A panicking listener is logged and does not affect other listeners.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.push((id, Arc::new(listener)));
        }
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let Ok(mut listeners) = self.listeners.write() else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }
}

async fn run_persister(shared: Arc<Shared>, mut rx: watch::Receiver<()>) {
    while rx.changed().await.is_ok() {
        if let Err(e) = shared.persist().await {
            tracing::warn!(error = %e, "failed to persist activity log");
        }
    }
    tracing::trace!("activity persister stopped");
}
