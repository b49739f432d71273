//! Derived-stock computation.
//!
//! The calculator owns the only mutable shared state in the system (the
//! loaded snapshot and the per-key cache); every other component reads stock
//! strictly through it.

pub mod calculator;
pub mod validator;

pub use calculator::{DEFAULT_CACHE_TTL, StockCalculator};
pub use validator::AvailabilityValidator;
