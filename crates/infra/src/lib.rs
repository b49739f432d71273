//! Infrastructure layer: stores, derived-stock services, movement commands.

pub mod commands;
pub mod sequence;
pub mod stock;
pub mod store;


pub use commands::{
    BatchKind, BatchLine, BatchReceipt, BatchTransfer, InboundReceipt, MergeOrchestrator,
    MovementService, OutboundIssue, TransferOrder, TransferOutcome,
};
pub use sequence::ReceiptSequencer;
pub use stock::{AvailabilityValidator, DEFAULT_CACHE_TTL, StockCalculator};
pub use store::{
    InMemoryItemStore, InMemoryTransactionStore, ItemStore, StoreError, TransactionStore,
};
