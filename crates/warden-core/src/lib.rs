//! Warden Core - shared types for the Warden safety and undo subsystem.
//!
//! Every other Warden crate speaks in these types:
//!
//! - [`RiskLevel`]: the five-step ordered risk scale
//! - [`OperationId`]: identifier shared by the approval ledger and the undo manager
//! - [`SessionId`] and [`LogEntryId`]: activity log identifiers
//! - [`Timestamp`]: UTC wall-clock wrapper
//!
//! # Example
//!
//! ```rust
//! use warden_core::prelude::*;
//!
//! let level = RiskLevel::Low.max(RiskLevel::Critical);
//! assert_eq!(level, RiskLevel::Critical);
//! assert!(level.requires_approval());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod types;

pub use types::{LogEntryId, OperationId, RiskLevel, SessionId, Timestamp};
