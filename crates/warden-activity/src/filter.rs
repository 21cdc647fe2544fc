//! Filters applied by [`ActivityLogger::get_logs`](crate::ActivityLogger::get_logs).

use serde::{Deserialize, Serialize};
use warden_core::Timestamp;

use crate::entry::{LogEntry, LogLevel, LogType};

/// Active filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    /// Exact level.
    pub level: Option<LogLevel>,
    /// Exact kind.
    pub kind: Option<LogType>,
    /// Case-insensitive substring over message and data.
    pub search: Option<String>,
    /// Inclusive lower time bound.
    pub start: Option<Timestamp>,
    /// Inclusive upper time bound.
    pub end: Option<Timestamp>,
}

impl LogFilter {
    /// Filter matching everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only entries at `level`.
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Only entries of `kind`.
    #[must_use]
    pub fn with_kind(mut self, kind: LogType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Only entries mentioning `query`.
    #[must_use]
    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    /// Only entries logged in `[start, end]`.
    #[must_use]
    pub fn with_time_range(mut self, start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Whether no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay the fields set in `other` onto `self`.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            level: other.level.or(self.level),
            kind: other.kind.or(self.kind),
            search: other.search.or(self.search),
            start: other.start.or(self.start),
            end: other.end.or(self.end),
        }
    }

    /// Whether `entry` passes every set criterion.
    #[must_use]
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if self.level.is_some_and(|l| l != entry.level) {
            return false;
        }
        if self.kind.is_some_and(|k| k != entry.kind) {
            return false;
        }
        if let Some(query) = self.search.as_deref().filter(|q| !q.is_empty())
            && !entry.matches_query(&query.to_lowercase())
        {
            return false;
        }
        if self.start.is_some_and(|start| entry.timestamp < start) {
            return false;
        }
        if self.end.is_some_and(|end| entry.timestamp > end) {
            return false;
        }
        true
    }
}
