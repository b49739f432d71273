//! `stockledger-inventory` — the item (material) entity and merge rules.

pub mod item;

pub use item::{Item, UnitOfMeasure, validate_merge_sources};
