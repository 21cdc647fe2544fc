//! Warden Safety - classification and approval gating for host operations.
//!
//! Three pieces, used in this order by the caller:
//!
//! 1. [`RiskClassifier`] scores a shell command or a file path against a
//!    static rule table and reports every matching [`RiskFinding`].
//! 2. [`PreviewGenerator`] renders a [`ProposedOperation`] into a
//!    [`Preview`] the user can inspect (line diff, findings, warnings).
//! 3. [`OperationLedger`] holds operations awaiting a decision. Each entry
//!    moves from pending to exactly one of approved or denied.
//!
//! # Example
//!
//! ```
//! use warden_core::RiskLevel;
//! use warden_safety::{NewPendingOperation, OperationLedger, PreviewGenerator, ProposedOperation, RiskClassifier};
//!
//! let check = RiskClassifier::check_command("sudo rm -rf /");
//! assert_eq!(check.level, RiskLevel::Critical);
//! assert!(check.needs_approval);
//!
//! let op = ProposedOperation::ExecuteCommand {
//!     command: "sudo rm -rf /".to_string(),
//!     working_dir: None,
//! };
//! let preview = PreviewGenerator::default().generate_preview(&op);
//!
//! let ledger = OperationLedger::new();
//! let id = ledger.add_pending_operation(NewPendingOperation::new("execute_command", op, check.level, preview));
//! ledger.approve_operation(&id);
//! assert!(ledger.is_approved(&id));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod classifier;
pub mod ledger;
pub mod operation;
pub mod preview;

pub use classifier::{
    CommandCheckResult, PathCheckResult, PathOperation, RiskCategory, RiskClassifier, RiskFinding,
};
pub use ledger::{NewPendingOperation, OperationLedger, OperationStatus, PendingOperation};
pub use operation::ProposedOperation;
pub use preview::{
    ChangeKind, CommandPreview, DiffLine, FileDeletePreview, FileWritePreview, GenericPreview,
    Preview, PreviewGenerator,
};
