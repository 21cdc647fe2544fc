//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_core::prelude::*;` to import all essential types.

pub use crate::{LogEntryId, OperationId, RiskLevel, SessionId, Timestamp};
