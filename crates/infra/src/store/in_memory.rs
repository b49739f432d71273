use std::sync::RwLock;

use stockledger_core::{ItemId, LocationCode, RecordId};
use stockledger_inventory::Item;
use stockledger_movements::MovementRecord;

use super::r#trait::{ItemStore, StoreError, TransactionStore};

/// In-memory transaction store.
///
/// Intended for tests/dev. Keeps insertion order so listings are
/// deterministic. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    records: RwLock<Vec<MovementRecord>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(_: impl core::fmt::Debug) -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

impl TransactionStore for InMemoryTransactionStore {
    fn list_all(&self) -> Result<Vec<MovementRecord>, StoreError> {
        Ok(self.records.read().map_err(poisoned)?.clone())
    }

    fn create(&self, record: MovementRecord) -> Result<MovementRecord, StoreError> {
        let mut records = self.records.write().map_err(poisoned)?;
        if records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::DuplicateId(record.id.to_string()));
        }
        records.push(record.clone());
        Ok(record)
    }

    fn update(&self, id: RecordId, record: MovementRecord) -> Result<MovementRecord, StoreError> {
        let mut records = self.records.write().map_err(poisoned)?;
        let slot = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::MissingRecord(id))?;
        *slot = record.clone();
        Ok(record)
    }

    fn delete(&self, id: RecordId) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(poisoned)?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(StoreError::MissingRecord(id));
        }
        Ok(())
    }
}

/// In-memory item catalogue. Tests/dev only.
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    items: RwLock<Vec<Item>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ItemStore for InMemoryItemStore {
    fn list(&self) -> Result<Vec<Item>, StoreError> {
        Ok(self.items.read().map_err(poisoned)?.clone())
    }

    fn get(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self
            .items
            .read()
            .map_err(poisoned)?
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }

    fn find_by_name(&self, location: &LocationCode, name: &str) -> Result<Option<Item>, StoreError> {
        let needle = name.trim();
        Ok(self
            .items
            .read()
            .map_err(poisoned)?
            .iter()
            .find(|i| &i.location == location && i.name.eq_ignore_ascii_case(needle))
            .cloned())
    }

    fn insert(&self, item: Item) -> Result<Item, StoreError> {
        let mut items = self.items.write().map_err(poisoned)?;
        if items.iter().any(|i| i.id == item.id) {
            return Err(StoreError::DuplicateId(item.id.to_string()));
        }
        items.push(item.clone());
        Ok(item)
    }

    fn delete(&self, id: ItemId) -> Result<(), StoreError> {
        let mut items = self.items.write().map_err(poisoned)?;
        let before = items.len();
        items.retain(|i| i.id != id);
        if items.len() == before {
            return Err(StoreError::MissingItem(id));
        }
        Ok(())
    }
}
