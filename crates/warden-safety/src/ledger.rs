//! In-memory ledger of operations awaiting an approval decision.
//!
//! Every entry starts [`OperationStatus::Pending`] and moves to exactly one of
//! [`OperationStatus::Approved`] or [`OperationStatus::Denied`]. Terminal
//! entries stay in the ledger until [`OperationLedger::cleanup`] drops them.
//!
//! Bookkeeping is best-effort: a poisoned lock turns every call into a no-op
//! returning empty results.

use std::fmt;
use std::sync::RwLock;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use warden_core::{OperationId, RiskLevel, Timestamp};

use crate::operation::ProposedOperation;
use crate::preview::Preview;

/// Default age after which decided entries are dropped.
pub const DEFAULT_MAX_AGE: Duration = Duration::hours(1);

/// Decision state of a ledger entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Awaiting a decision.
    #[default]
    Pending,
    /// Approved by the user. Terminal.
    Approved,
    /// Denied by the user. Terminal.
    Denied,
}

impl OperationStatus {
    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Denied => write!(f, "denied"),
        }
    }
}

/// Caller-supplied fields of a new ledger entry.
#[derive(Debug, Clone)]
pub struct NewPendingOperation {
    /// Name of the tool that proposed the operation.
    pub tool_name: String,
    /// The operation itself.
    pub operation: ProposedOperation,
    /// Classifier verdict.
    pub risk_level: RiskLevel,
    /// Rendered preview.
    pub preview: Preview,
}

impl NewPendingOperation {
    /// Bundle the fields of a new entry.
    #[must_use]
    pub fn new(
        tool_name: impl Into<String>,
        operation: ProposedOperation,
        risk_level: RiskLevel,
        preview: Preview,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            operation,
            risk_level,
            preview,
        }
    }
}

/// An entry in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOperation {
    /// Ledger-assigned identifier.
    pub id: OperationId,
    /// Name of the tool that proposed the operation.
    pub tool_name: String,
    /// The operation itself.
    pub operation: ProposedOperation,
    /// Classifier verdict.
    pub risk_level: RiskLevel,
    /// Rendered preview.
    pub preview: Preview,
    /// When the entry was added.
    pub created_at: Timestamp,
    /// Current decision state.
    pub status: OperationStatus,
}

impl PendingOperation {
    /// Whether the entry was created more than `max_age` ago.
    #[must_use]
    pub fn is_older_than(&self, max_age: Duration) -> bool {
        self.created_at.is_older_than(max_age)
    }
}

/// Thread-safe store of proposed operations and their decisions.
///
/// # Example
///
/// ```
/// use warden_safety::OperationLedger;
///
/// let ledger = OperationLedger::new();
/// assert_eq!(ledger.count(), 0);
/// assert!(ledger.get_pending_operations().is_empty());
/// ```
#[derive(Default)]
pub struct OperationLedger {
    entries: RwLock<Vec<PendingOperation>>,
}

impl fmt::Debug for OperationLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationLedger")
            .field("count", &self.count())
            .finish_non_exhaustive()
    }
}

impl OperationLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation in the pending state and return its fresh id.
    ///
    /// The id is returned even if the entry could not be stored.
    pub fn add_pending_operation(&self, new: NewPendingOperation) -> OperationId {
        let id = OperationId::new();
        let entry = PendingOperation {
            id,
            tool_name: new.tool_name,
            operation: new.operation,
            risk_level: new.risk_level,
            preview: new.preview,
            created_at: Timestamp::now(),
            status: OperationStatus::Pending,
        };

        let Ok(mut entries) = self.entries.write() else {
            tracing::warn!(%id, "ledger lock poisoned, operation not recorded");
            return id;
        };
        tracing::debug!(
            %id,
            tool = %entry.tool_name,
            risk = %entry.risk_level,
            "operation awaiting approval"
        );
        entries.push(entry);
        id
    }

    /// Mark a pending operation approved.
    pub fn approve_operation(&self, id: &OperationId) {
        self.decide(id, OperationStatus::Approved);
    }

    /// Mark a pending operation denied.
    pub fn deny_operation(&self, id: &OperationId) {
        self.decide(id, OperationStatus::Denied);
    }

    /// Approve every listed id. Unknown or already-decided ids are skipped.
    pub fn approve_all(&self, ids: &[OperationId]) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };
        for id in ids {
            Self::transition(&mut entries, id, OperationStatus::Approved);
        }
    }

    fn decide(&self, id: &OperationId, status: OperationStatus) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };
        Self::transition(&mut entries, id, status);
    }

    fn transition(entries: &mut [PendingOperation], id: &OperationId, status: OperationStatus) {
        match entries.iter_mut().find(|e| e.id == *id) {
            Some(entry) if entry.status == OperationStatus::Pending => {
                entry.status = status;
                tracing::debug!(%id, %status, "operation decided");
            },
            Some(entry) => {
                tracing::debug!(%id, current = %entry.status, "operation already decided");
            },
            None => {
                tracing::debug!(%id, "no such operation in ledger");
            },
        }
    }

    /// All entries still pending, oldest first.
    #[must_use]
    pub fn get_pending_operations(&self) -> Vec<PendingOperation> {
        let Ok(entries) = self.entries.read() else {
            return Vec::new();
        };
        entries
            .iter()
            .filter(|e| e.status == OperationStatus::Pending)
            .cloned()
            .collect()
    }

    /// Look up an entry by id.
    #[must_use]
    pub fn get(&self, id: &OperationId) -> Option<PendingOperation> {
        let entries = self.entries.read().ok()?;
        entries.iter().find(|e| e.id == *id).cloned()
    }

    /// Current status of an entry.
    #[must_use]
    pub fn status(&self, id: &OperationId) -> Option<OperationStatus> {
        let entries = self.entries.read().ok()?;
        entries.iter().find(|e| e.id == *id).map(|e| e.status)
    }

    /// Whether the entry exists and was approved.
    #[must_use]
    pub fn is_approved(&self, id: &OperationId) -> bool {
        self.status(id) == Some(OperationStatus::Approved)
    }

    /// Number of entries in any state.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.read().map_or(0, |e| e.len())
    }

    /// Drop decided entries older than `max_age`. Pending entries are kept
    /// regardless of age.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|e| !(e.status.is_terminal() && e.is_older_than(max_age)));
        let removed = before.saturating_sub(entries.len());
        if removed > 0 {
            tracing::debug!(removed, "cleaned up decided operations");
        }
        removed
    }
}
