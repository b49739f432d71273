//! `stockledger-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the fixed-point quantity model, location codes,
//! and the ledger error taxonomy.

pub mod error;
pub mod id;
pub mod location;
pub mod quantity;

pub use error::{LedgerError, LedgerResult};
pub use id::{ActorId, ItemId, RecordId};
pub use location::LocationCode;
pub use quantity::{Quantity, StockLevel};
