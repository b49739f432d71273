//! Ledger error model.

use thiserror::Error;

use crate::id::{ItemId, RecordId};
use crate::location::LocationCode;
use crate::quantity::{Quantity, StockLevel};

/// Result type used across the ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-level error.
///
/// Every variant except `CompensationFailure` and `PartialMerge` is rejected
/// **before** any write lands, so the caller may correct the input and retry.
/// The two exceptions describe a ledger left mid-flight; they carry enough
/// context for an operator to reconcile by hand and must never be collapsed
/// into a generic failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A value failed validation (missing/zero/negative quantity,
    /// same-location transfer, location/unit mismatch on merge, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A debiting operation would drive derived stock negative.
    ///
    /// Advisory under concurrency: the check is read-then-decide, not a
    /// reservation. Callers should re-fetch and re-decide, not blindly retry.
    #[error("insufficient stock for item {item} at {location}: requested {requested}, available {available}")]
    InsufficientStock {
        item: ItemId,
        location: LocationCode,
        requested: Quantity,
        available: StockLevel,
    },

    /// A merge target name collides with an existing, unrelated item.
    #[error("an item named '{0}' already exists at this location")]
    DuplicateName(String),

    /// A transfer's credit leg failed *and* the rollback delete of the
    /// already-written debit leg failed too. The ledger now holds an orphaned
    /// debit with no matching credit; manual reconciliation is required.
    #[error("transfer compensation failed: orphaned debit record {record_id} (document {document_id}): {reason}")]
    CompensationFailure {
        record_id: RecordId,
        document_id: String,
        reason: String,
    },

    /// A merge failed partway through record redirection, leaving the named
    /// source item with a partially migrated history.
    ///
    /// thiserror treats a field named `source` as the error's cause, so the
    /// item id must carry a different name.
    #[error("merge left item {source_item} partially redirected ({redirected}/{total} records): {reason}")]
    PartialMerge {
        source_item: ItemId,
        redirected: usize,
        total: usize,
        reason: String,
    },

    /// A referenced record or item does not exist.
    #[error("not found")]
    NotFound,

    /// The transaction store reported a failure.
    #[error("store operation failed: {0}")]
    Store(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn insufficient_stock(
        item: ItemId,
        location: LocationCode,
        requested: Quantity,
        available: StockLevel,
    ) -> Self {
        Self::InsufficientStock {
            item,
            location,
            requested,
            available,
        }
    }
}
