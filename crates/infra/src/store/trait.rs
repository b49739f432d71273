use std::sync::Arc;

use thiserror::Error;

use stockledger_core::{ItemId, LedgerError, LocationCode, RecordId};
use stockledger_inventory::Item;
use stockledger_movements::MovementRecord;

/// Storage operation error.
///
/// These are infrastructure failures (missing rows, backend trouble), as
/// opposed to domain failures which live in `LedgerError`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    MissingRecord(RecordId),

    #[error("item not found: {0}")]
    MissingItem(ItemId),

    #[error("duplicate id: {0}")]
    DuplicateId(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingRecord(_) | StoreError::MissingItem(_) => LedgerError::NotFound,
            other => LedgerError::store(other.to_string()),
        }
    }
}

/// The transaction store: append/query/update/delete of movement records.
///
/// Records are immutable on the happy path; `update` exists solely for the
/// corrective quantity amendment and for merge redirection, `delete` for
/// reversal and for the transfer rollback. The store offers **no
/// cross-record atomicity** — multi-record consistency is the commands'
/// responsibility.
pub trait TransactionStore: Send + Sync {
    /// The full movement record set.
    fn list_all(&self) -> Result<Vec<MovementRecord>, StoreError>;

    fn create(&self, record: MovementRecord) -> Result<MovementRecord, StoreError>;

    fn update(&self, id: RecordId, record: MovementRecord) -> Result<MovementRecord, StoreError>;

    fn delete(&self, id: RecordId) -> Result<(), StoreError>;

    /// Batch write. The default loops over `create`; backends with a real
    /// batch endpoint may override. Not atomic either way.
    fn commit(&self, batch: Vec<MovementRecord>) -> Result<Vec<MovementRecord>, StoreError> {
        let mut committed = Vec::with_capacity(batch.len());
        for record in batch {
            committed.push(self.create(record)?);
        }
        Ok(committed)
    }
}

impl<S> TransactionStore for Arc<S>
where
    S: TransactionStore + ?Sized,
{
    fn list_all(&self) -> Result<Vec<MovementRecord>, StoreError> {
        (**self).list_all()
    }

    fn create(&self, record: MovementRecord) -> Result<MovementRecord, StoreError> {
        (**self).create(record)
    }

    fn update(&self, id: RecordId, record: MovementRecord) -> Result<MovementRecord, StoreError> {
        (**self).update(id, record)
    }

    fn delete(&self, id: RecordId) -> Result<(), StoreError> {
        (**self).delete(id)
    }

    fn commit(&self, batch: Vec<MovementRecord>) -> Result<Vec<MovementRecord>, StoreError> {
        (**self).commit(batch)
    }
}

/// Item catalogue access needed by the merge orchestrator.
pub trait ItemStore: Send + Sync {
    fn list(&self) -> Result<Vec<Item>, StoreError>;

    fn get(&self, id: ItemId) -> Result<Option<Item>, StoreError>;

    /// Case-insensitive name lookup scoped to one location.
    fn find_by_name(
        &self,
        location: &LocationCode,
        name: &str,
    ) -> Result<Option<Item>, StoreError>;

    fn insert(&self, item: Item) -> Result<Item, StoreError>;

    fn delete(&self, id: ItemId) -> Result<(), StoreError>;
}

impl<S> ItemStore for Arc<S>
where
    S: ItemStore + ?Sized,
{
    fn list(&self) -> Result<Vec<Item>, StoreError> {
        (**self).list()
    }

    fn get(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        (**self).get(id)
    }

    fn find_by_name(
        &self,
        location: &LocationCode,
        name: &str,
    ) -> Result<Option<Item>, StoreError> {
        (**self).find_by_name(location, name)
    }

    fn insert(&self, item: Item) -> Result<Item, StoreError> {
        (**self).insert(item)
    }

    fn delete(&self, id: ItemId) -> Result<(), StoreError> {
        (**self).delete(id)
    }
}
