//! The inventory item (material).

use serde::{Deserialize, Serialize};

use stockledger_core::{ItemId, LedgerError, LocationCode, Quantity};

/// Unit of measure for an item's quantities (e.g. `PCS`, `KG`, `L`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitOfMeasure(String);

impl UnitOfMeasure {
    pub fn new(unit: impl Into<String>) -> Result<Self, LedgerError> {
        let unit = unit.into().trim().to_string();
        if unit.is_empty() {
            return Err(LedgerError::validation("unit of measure cannot be empty"));
        }
        Ok(Self(unit))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UnitOfMeasure {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UnitOfMeasure> for String {
    fn from(value: UnitOfMeasure) -> Self {
        value.0
    }
}

/// An inventory item.
///
/// Deliberately has **no stock field**: current stock is always the fold of
/// the movement records referencing this item at its location. A store may
/// keep a denormalized counter for display, but the ledger never trusts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub unit: UnitOfMeasure,
    pub location: LocationCode,
    /// Advisory low-stock threshold; never enforced by the ledger.
    pub minimum_threshold: Option<Quantity>,
}

impl Item {
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        unit: UnitOfMeasure,
        location: LocationCode,
        minimum_threshold: Option<Quantity>,
    ) -> Result<Self, LedgerError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(LedgerError::validation("item name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            unit,
            location,
            minimum_threshold,
        })
    }
}

/// Preconditions for merging duplicate items.
///
/// At least two sources, all at the same location and with the same unit of
/// measure; a cross-location or cross-unit merge would not produce a
/// meaningful derived stock. Returns the shared (location, unit) on success.
pub fn validate_merge_sources(sources: &[Item]) -> Result<(LocationCode, UnitOfMeasure), LedgerError> {
    let Some(first) = sources.first() else {
        return Err(LedgerError::validation("merge requires at least two source items"));
    };
    if sources.len() < 2 {
        return Err(LedgerError::validation("merge requires at least two source items"));
    }

    for other in &sources[1..] {
        if other.location != first.location {
            return Err(LedgerError::validation(format!(
                "cannot merge items across locations ({} vs {})",
                first.location, other.location
            )));
        }
        if other.unit != first.unit {
            return Err(LedgerError::validation(format!(
                "cannot merge items with different units ({} vs {})",
                first.unit, other.unit
            )));
        }
    }

    Ok((first.location.clone(), first.unit.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, unit: &str, location: &str) -> Item {
        Item::new(
            ItemId::new(),
            name,
            UnitOfMeasure::new(unit).unwrap(),
            LocationCode::new(location).unwrap(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn item_name_is_trimmed_and_non_empty() {
        let i = item("  Bolt M8  ", "PCS", "W1");
        assert_eq!(i.name, "Bolt M8");
        assert!(
            Item::new(
                ItemId::new(),
                "   ",
                UnitOfMeasure::new("PCS").unwrap(),
                LocationCode::new("W1").unwrap(),
                None,
            )
            .is_err()
        );
    }

    #[test]
    fn merge_requires_two_sources() {
        assert!(validate_merge_sources(&[]).is_err());
        assert!(validate_merge_sources(&[item("A", "PCS", "W1")]).is_err());
    }

    #[test]
    fn merge_rejects_location_and_unit_mismatch() {
        assert!(validate_merge_sources(&[item("A", "PCS", "W1"), item("B", "PCS", "W2")]).is_err());
        assert!(validate_merge_sources(&[item("A", "PCS", "W1"), item("B", "KG", "W1")]).is_err());
    }

    #[test]
    fn merge_accepts_matching_sources() {
        let (location, unit) =
            validate_merge_sources(&[item("A", "PCS", "W1"), item("B", "PCS", "W1")]).unwrap();
        assert_eq!(location.as_str(), "W1");
        assert_eq!(unit.as_str(), "PCS");
    }
}
