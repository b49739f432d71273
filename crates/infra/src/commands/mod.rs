//! Movement commands: the write paths of the ledger.
//!
//! Every command follows the same discipline: validate against a fresh view,
//! write to the store, invalidate the calculator **after** the write
//! succeeds. Nothing here retries on its own; retry policy belongs to the
//! caller.

pub mod batch;
pub mod merge;
pub mod movement;
pub mod transfer;

pub use batch::{BatchKind, BatchLine, BatchReceipt, BatchTransfer};
pub use merge::MergeOrchestrator;
pub use movement::{InboundReceipt, MovementService, OutboundIssue};
pub use transfer::{TransferOrder, TransferOutcome};
