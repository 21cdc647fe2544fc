//! Log entry types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use warden_core::{LogEntryId, SessionId, Timestamp};

/// Severity of an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal activity.
    Info,
    /// Something unexpected but recoverable.
    Warn,
    /// A failure.
    Error,
    /// A completed step.
    Success,
}

impl LogLevel {
    /// Lowercase name, as serialized.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Success => "success",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of activity an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    /// A prompt sent to a model.
    AiRequest,
    /// A model response.
    AiResponse,
    /// A tool invocation.
    ToolCall,
    /// A tool's result.
    ToolResult,
    /// A shell command.
    Command,
    /// A file read, write, delete or rename.
    FileOperation,
    /// An error.
    Error,
    /// Something the user did.
    UserAction,
    /// Internal lifecycle event.
    System,
}

impl LogType {
    /// Snake-case name, as serialized.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AiRequest => "ai_request",
            Self::AiResponse => "ai_response",
            Self::ToolCall => "tool_call",
            Self::ToolResult => "tool_result",
            Self::Command => "command",
            Self::FileOperation => "file_operation",
            Self::Error => "error",
            Self::UserAction => "user_action",
            Self::System => "system",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One activity log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Time-ordered id.
    pub id: LogEntryId,
    /// Severity.
    pub level: LogLevel,
    /// Activity kind.
    #[serde(rename = "type")]
    pub kind: LogType,
    /// One-line message.
    pub message: String,
    /// Structured payload.
    pub data: Value,
    /// When it was logged.
    pub timestamp: Timestamp,
    /// Logger session that produced it.
    pub session_id: SessionId,
}

impl LogEntry {
    /// Case-insensitive substring match over the message and the serialized
    /// data. `query_lower` must already be lowercase.
    #[must_use]
    pub fn matches_query(&self, query_lower: &str) -> bool {
        self.message.to_lowercase().contains(query_lower)
            || self.data.to_string().to_lowercase().contains(query_lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(message: &str, data: Value) -> LogEntry {
        LogEntry {
            id: LogEntryId::new(),
            level: LogLevel::Info,
            kind: LogType::System,
            message: message.into(),
            data,
            timestamp: Timestamp::now(),
            session_id: SessionId::new(),
        }
    }

    #[test]
    fn test_entry_serializes_type_field() {
        let json = serde_json::to_value(entry("hi", json!({}))).unwrap();
        assert_eq!(json["type"], "system");
        assert_eq!(json["level"], "info");
    }

    #[test]
    fn test_matches_query_covers_data() {
        let e = entry("Build Started", json!({"target": "Release"}));
        assert!(e.matches_query("build"));
        assert!(e.matches_query("release"));
        assert!(!e.matches_query("debug"));
    }

    #[test]
    fn test_names_match_serde() {
        for level in [LogLevel::Debug, LogLevel::Success] {
            assert_eq!(
                serde_json::to_value(level).unwrap(),
                Value::String(level.to_string())
            );
        }
        assert_eq!(
            serde_json::to_value(LogType::FileOperation).unwrap(),
            json!("file_operation")
        );
    }
}
