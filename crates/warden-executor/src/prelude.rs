//! Prelude module - commonly used types for convenient import.

pub use crate::{CommandOutput, ExecutorError, ExecutorResult, HostExecutor, LocalExecutor};
