//! Export of log entries as JSON, CSV or plain text.

use std::fmt;
use std::str::FromStr;

use crate::entry::LogEntry;
use crate::error::{ActivityError, ActivityResult};

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Pretty-printed JSON array.
    Json,
    /// Comma-separated values, one row per entry.
    Csv,
    /// Human-readable blocks.
    Txt,
}

impl FromStr for ExportFormat {
    type Err = ActivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "txt" => Ok(Self::Txt),
            other => Err(ActivityError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
            Self::Txt => write!(f, "txt"),
        }
    }
}

/// Render `entries` in `format`.
///
/// # Errors
///
/// Returns [`ActivityError::Serialization`] if an entry cannot be serialized.
pub fn render(entries: &[LogEntry], format: ExportFormat) -> ActivityResult<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(entries)?),
        ExportFormat::Csv => Ok(to_csv(entries)),
        ExportFormat::Txt => to_txt(entries),
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn to_csv(entries: &[LogEntry]) -> String {
    let mut lines = Vec::with_capacity(entries.len().saturating_add(1));
    lines.push("time,level,type,message,data".to_string());
    for entry in entries {
        let row = [
            entry.timestamp.to_string(),
            entry.level.to_string(),
            entry.kind.to_string(),
            entry.message.clone(),
            entry.data.to_string(),
        ];
        lines.push(row.iter().map(|f| quote(f)).collect::<Vec<_>>().join(","));
    }
    lines.join("\n")
}

fn to_txt(entries: &[LogEntry]) -> ActivityResult<String> {
    let blocks = entries
        .iter()
        .map(|entry| {
            Ok(format!(
                "[{}] [{}] [{}] {}\n{}\n",
                entry.timestamp,
                entry.level.as_str().to_uppercase(),
                entry.kind,
                entry.message,
                serde_json::to_string_pretty(&entry.data)?
            ))
        })
        .collect::<ActivityResult<Vec<_>>>()?;
    Ok(blocks.join("\n---\n\n"))
}
