//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_activity::prelude::*;` to import all essential types.

pub use crate::{
    ActivityError, ActivityLogger, ActivityResult, ActivitySettings, LogEntry, LogFilter, LogLevel,
    LogType,
};
