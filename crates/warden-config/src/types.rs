//! Configuration types for Warden.
//!
//! Every struct implements [`Default`] with the values shipped in
//! `defaults.toml`, so a bare `[section]` header produces a working
//! configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Classifier, ledger and preview settings.
    pub safety: SafetySection,
    /// Undo/redo manager settings.
    pub undo: UndoSection,
    /// Activity logger settings.
    pub activity: ActivitySection,
    /// Host executor limits.
    pub executor: ExecutorSection,
    /// Tracing output.
    pub logging: LoggingSection,
    /// Persistence location.
    pub storage: StorageSection,
}

// ---------------------------------------------------------------------------
// SafetySection
// ---------------------------------------------------------------------------

/// Classifier, ledger and preview settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetySection {
    /// Age in seconds after which decided ledger entries are dropped.
    pub ledger_max_age_secs: u64,
    /// Maximum number of diff lines in a file-write preview.
    pub max_diff_lines: usize,
}

impl Default for SafetySection {
    fn default() -> Self {
        Self {
            ledger_max_age_secs: 3600,
            max_diff_lines: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// UndoSection
// ---------------------------------------------------------------------------

/// Undo/redo manager settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndoSection {
    /// Maximum undo stack depth.
    pub capacity: usize,
}

impl Default for UndoSection {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

// ---------------------------------------------------------------------------
// ActivitySection
// ---------------------------------------------------------------------------

/// Activity logger settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivitySection {
    /// Entries kept in memory.
    pub capacity: usize,
    /// Most recent entries written to storage.
    pub persist_limit: usize,
    /// Character limit for prompts, responses and command output.
    pub text_truncate: usize,
    /// Serialized-size limit for tool results.
    pub result_truncate: usize,
}

impl Default for ActivitySection {
    fn default() -> Self {
        Self {
            capacity: 1000,
            persist_limit: 200,
            text_truncate: 500,
            result_truncate: 1000,
        }
    }
}

// ---------------------------------------------------------------------------
// ExecutorSection
// ---------------------------------------------------------------------------

/// Host executor limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSection {
    /// Wall-clock limit for a shell command.
    pub command_timeout_secs: u64,
    /// Largest file, in bytes, the executor will read or write.
    pub max_file_size: u64,
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            command_timeout_secs: 300,
            max_file_size: 10_485_760,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["warden_undo=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// StorageSection
// ---------------------------------------------------------------------------

/// Persistence location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory for persisted state. Falls back to the platform data
    /// directory when unset.
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Directory where persisted state lives.
    ///
    /// `storage.data_dir` when set, otherwise the platform data directory
    /// for `warden` (e.g. `~/.local/share/warden`). `None` only if neither
    /// is available.
    #[must_use]
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.storage.data_dir.clone().or_else(|| {
            directories::ProjectDirs::from("", "", "warden")
                .map(|dirs| dirs.data_dir().to_path_buf())
        })
    }

    /// Ledger max age as a [`std::time::Duration`].
    #[must_use]
    pub fn ledger_max_age(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.safety.ledger_max_age_secs)
    }

    /// Command timeout as a [`std::time::Duration`].
    #[must_use]
    pub fn command_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.executor.command_timeout_secs)
    }
}
