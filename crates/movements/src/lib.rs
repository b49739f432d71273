//! `stockledger-movements` — the movement-record domain.
//!
//! Everything here is pure: the document-id format, the immutable movement
//! record, the stock fold, and the transfer saga state machine. No store or
//! cache lives in this crate.

pub mod document;
pub mod fold;
pub mod record;
pub mod saga;

pub use document::{CREDIT_LEG_SUFFIX, DocumentId, MovementKind};
pub use fold::{StockKey, fold_all, fold_stock};
pub use record::{MovementMeta, MovementRecord, TransferCounterparty, TransferLeg};
pub use saga::{InvalidTransition, TransferSaga, TransferSagaState};
