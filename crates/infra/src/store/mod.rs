//! Storage boundary for the ledger.
//!
//! The ledger core makes no assumption about how records are physically
//! stored; it only requires the narrow CRUD+query contract defined here.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{InMemoryItemStore, InMemoryTransactionStore};
pub use r#trait::{ItemStore, StoreError, TransactionStore};
