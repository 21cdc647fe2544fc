//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_safety::prelude::*;` to import all essential types.

pub use crate::{
    CommandCheckResult, NewPendingOperation, OperationLedger, OperationStatus, PathCheckResult,
    PathOperation, PendingOperation, Preview, PreviewGenerator, ProposedOperation, RiskCategory,
    RiskClassifier, RiskFinding,
};
pub use warden_core::{OperationId, RiskLevel};
