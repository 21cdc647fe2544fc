//! Warden Activity - a bounded, searchable log of everything the agent does.
//!
//! The [`ActivityLogger`] keeps the most recent entries in memory, mirrors
//! each one to `tracing`, notifies in-process listeners and, when backed by a
//! [`ScopedKvStore`](warden_storage::ScopedKvStore), persists the tail of the
//! log so it survives restarts.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use warden_activity::{ActivityLogger, LogFilter, LogLevel};
//!
//! let logger = ActivityLogger::new();
//! logger.log_command("cargo test", Some("/work"), None);
//! logger.log_tool_result("execute_command", json!({"exit_code": 1}), false, 1200);
//!
//! logger.set_filters(LogFilter::new().with_level(LogLevel::Error));
//! assert_eq!(logger.get_logs(None).len(), 1);
//! assert!(logger.export("csv").unwrap().starts_with("time,level,type"));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod entry;
mod error;
mod export;
mod filter;
mod logger;

pub use entry::{LogEntry, LogLevel, LogType};
pub use error::{ActivityError, ActivityResult};
pub use export::{ExportFormat, render};
pub use filter::LogFilter;
pub use logger::{
    ActivityLogger, ActivitySettings, ActivityStats, ListenerId, NAMESPACE, STORAGE_KEY,
};
