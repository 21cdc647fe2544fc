//! Warden Guard - approval-gated execution of host operations.
//!
//! [`SafetyGuard`] ties the pipeline together:
//!
//! 1. [`propose`](SafetyGuard::propose) classifies an operation. Anything
//!    above `safe` gets a preview and a pending ledger entry.
//! 2. The user [`approve`](SafetyGuard::approve)s or
//!    [`deny`](SafetyGuard::deny)s it.
//! 3. [`execute`](SafetyGuard::execute) refuses unless the entry is approved,
//!    records the mutation for undo, runs it on the host and logs the result.
//!
//! Reads go through [`read_file`](SafetyGuard::read_file) and are never gated
//! or recorded for undo.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod guard;

pub use error::{GuardError, GuardResult};
pub use guard::{Execution, FileRead, Proposal, SafetyCheck, SafetyGuard};
