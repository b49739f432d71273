//! Fixed-point quantity model.
//!
//! Quantities in the ledger carry at most two fractional digits, so they are
//! stored as hundredths in an `i64` (same idiom as money-in-cents). Two types
//! exist on purpose:
//!
//! - [`Quantity`] — a strictly positive amount attached to a movement record
//!   or requested by a command. Non-positive values are unrepresentable.
//! - [`StockLevel`] — a signed fold result. The fold itself may pass through
//!   negative intermediate values; a committed ledger never ends there, but
//!   the type does not pretend otherwise.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// A strictly positive movement quantity, stored as hundredths.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(i64);

impl Quantity {
    /// Build a quantity from hundredths (e.g. `1250` is `12.50`).
    pub fn from_hundredths(hundredths: i64) -> Result<Self, LedgerError> {
        if hundredths <= 0 {
            return Err(LedgerError::validation(format!(
                "quantity must be positive (got {hundredths} hundredths)"
            )));
        }
        Ok(Self(hundredths))
    }

    /// Build a quantity from a whole number of units.
    pub fn from_units(units: i64) -> Result<Self, LedgerError> {
        let hundredths = units
            .checked_mul(100)
            .ok_or_else(|| LedgerError::validation("quantity out of range"))?;
        Self::from_hundredths(hundredths)
    }

    pub fn hundredths(self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: Quantity) -> Option<Quantity> {
        self.0.checked_add(other.0).map(Self)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = LedgerError;

    fn try_from(hundredths: i64) -> Result<Self, Self::Error> {
        Self::from_hundredths(hundredths)
    }
}

impl From<Quantity> for i64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write_hundredths(f, self.0)
    }
}

impl FromStr for Quantity {
    type Err = LedgerError;

    /// Parse `"12"`, `"12.5"` or `"12.50"`. Rejects signs, empty parts and
    /// more than two fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LedgerError::validation(format!("malformed quantity '{s}'")));
        }
        if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LedgerError::validation(format!(
                "quantity '{s}' must have at most two fractional digits"
            )));
        }

        let units: i64 = whole
            .parse()
            .map_err(|_| LedgerError::validation(format!("quantity '{s}' out of range")))?;
        let cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().unwrap_or(0) * 10,
            _ => frac.parse::<i64>().unwrap_or(0),
        };

        let hundredths = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(|| LedgerError::validation(format!("quantity '{s}' out of range")))?;

        Self::from_hundredths(hundredths)
    }
}

/// A signed derived-stock value, stored as hundredths.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockLevel(i64);

impl StockLevel {
    pub const ZERO: StockLevel = StockLevel(0);

    pub fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    pub fn hundredths(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// True when this level can absorb an issue of `requested`.
    pub fn covers(self, requested: Quantity) -> bool {
        self.0 >= requested.hundredths()
    }

    pub fn plus(self, quantity: Quantity) -> StockLevel {
        Self(self.0.saturating_add(quantity.hundredths()))
    }
}

impl core::fmt::Display for StockLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.0 < 0 {
            write!(f, "-")?;
        }
        write_hundredths(f, self.0.abs())
    }
}

fn write_hundredths(f: &mut core::fmt::Formatter<'_>, hundredths: i64) -> core::fmt::Result {
    let units = hundredths / 100;
    let cents = hundredths % 100;
    if cents == 0 {
        write!(f, "{units}")
    } else {
        write!(f, "{units}.{cents:02}")
    }
}
