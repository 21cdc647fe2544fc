//! `logs` - inspect the persisted activity log.

use anyhow::Result;
use colored::Colorize;
use warden_activity::{ActivityLogger, ExportFormat, LogEntry, LogFilter, render};

use crate::theme::Theme;

/// Entries from `logger`, newest last, narrowed by `search` and `limit`.
pub(crate) fn select(logger: &ActivityLogger, search: Option<&str>, limit: Option<usize>) -> Vec<LogEntry> {
    if let Some(query) = search {
        logger.set_filters(LogFilter::new().with_search(query));
    }
    logger.get_logs(limit)
}

/// Print the log as a table, or exported in `format`.
pub(crate) fn show_logs(
    logger: &ActivityLogger,
    format: Option<ExportFormat>,
    search: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    let entries = select(logger, search, limit);

    if let Some(format) = format {
        println!("{}", render(&entries, format)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{}", Theme::info("No activity recorded"));
        return Ok(());
    }

    println!("\n{}", Theme::header("Activity"));
    println!(
        "{:<23} {:<7} {:<15} {}",
        "TIMESTAMP".dimmed(),
        "LEVEL".dimmed(),
        "TYPE".dimmed(),
        "MESSAGE".dimmed()
    );
    println!("{}", Theme::separator());
    for entry in &entries {
        println!(
            "{:<23} {} {:<15} {}",
            Theme::dimmed(&entry.timestamp.to_string()),
            Theme::log_level(entry.level),
            entry.kind.as_str(),
            entry.message
        );
    }

    let stats = logger.get_stats();
    println!();
    println!(
        "{}",
        Theme::dimmed(&format!(
            "{} shown, {} stored, {} errors, {} warnings",
            entries.len(),
            stats.total,
            stats.errors,
            stats.warnings
        ))
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_applies_search_and_limit() {
        let logger = ActivityLogger::new();
        logger.log_system("build started", json!({}));
        logger.log_system("tests passed", json!({}));
        logger.log_system("build finished", json!({}));

        let found = select(&logger, Some("BUILD"), None);
        assert_eq!(found.len(), 2);

        let limited = select(&ActivityLogger::new(), None, Some(1));
        assert!(limited.is_empty());

        let recent = select(&logger, None, Some(1));
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].message, "build finished");
    }
}
