//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_guard::prelude::*;` to import all essential types.

pub use crate::{Execution, GuardError, GuardResult, Proposal, SafetyGuard};
