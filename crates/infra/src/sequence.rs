//! Receipt-id sequencing.

use chrono::{DateTime, Datelike, Utc};

use stockledger_core::{LedgerError, LedgerResult, LocationCode};
use stockledger_movements::{DocumentId, MovementKind};

use crate::store::TransactionStore;

/// Largest sequence the five-digit document-id format can carry.
const MAX_SEQUENCE: u32 = 99_999;

/// Generates the next document id in a (kind, location, year) scope.
///
/// No counter is persisted anywhere: the next id is always max+1 over the
/// ids already in the store, so gaps from deleted records are tolerated and
/// the scope resets naturally when the two-digit year changes. Generation is
/// only race-free if the caller serializes it — two clients generating
/// concurrently without a shared lock can land on the same number.
pub struct ReceiptSequencer<S> {
    store: S,
}

impl<S: TransactionStore> ReceiptSequencer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Next id for `kind` at `location`, in the year of `at`.
    pub fn next_document_id(
        &self,
        kind: MovementKind,
        location: &LocationCode,
        at: DateTime<Utc>,
    ) -> LedgerResult<DocumentId> {
        let year = at.year();
        let yy = year.rem_euclid(100) as u8;

        let max = self
            .store
            .list_all()?
            .iter()
            .map(|r| &r.document_id)
            .filter(|d| d.kind() == kind && d.location() == location && d.year() == yy)
            .map(DocumentId::sequence)
            .max()
            .unwrap_or(0);

        if max >= MAX_SEQUENCE {
            return Err(LedgerError::validation(format!(
                "document sequence exhausted for {}/{}/{:02}",
                kind.prefix(),
                location,
                yy
            )));
        }

        Ok(DocumentId::new(kind, location.clone(), year, max + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    use stockledger_core::{ActorId, ItemId, Quantity, RecordId};
    use stockledger_movements::{MovementMeta, MovementRecord};

    use crate::store::InMemoryTransactionStore;

    fn loc(code: &str) -> LocationCode {
        LocationCode::new(code).unwrap()
    }

    fn record_with(document_id: DocumentId) -> MovementRecord {
        MovementRecord::inbound(
            RecordId::new(),
            document_id,
            ItemId::new(),
            loc("OG"),
            Quantity::from_hundredths(100).unwrap(),
            Utc::now(),
            ActorId::new(),
            MovementMeta::default(),
        )
    }

    fn at(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn first_id_in_a_scope_is_one() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let sequencer = ReceiptSequencer::new(store);
        let id = sequencer
            .next_document_id(MovementKind::Inbound, &loc("OG"), at(2024))
            .unwrap();
        assert_eq!(id.to_string(), "GRN/OG/24/00001");
    }

    #[test]
    fn continues_past_the_maximum_even_with_gaps() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let og = loc("OG");
        store
            .create(record_with(DocumentId::new(MovementKind::Inbound, og.clone(), 2024, 1)))
            .unwrap();
        store
            .create(record_with(DocumentId::new(MovementKind::Inbound, og.clone(), 2024, 3)))
            .unwrap();

        let sequencer = ReceiptSequencer::new(store);
        let id = sequencer
            .next_document_id(MovementKind::Inbound, &og, at(2024))
            .unwrap();
        assert_eq!(id.to_string(), "GRN/OG/24/00004");
    }

    #[test]
    fn scopes_are_independent_per_kind_location_and_year() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let og = loc("OG");
        store
            .create(record_with(DocumentId::new(MovementKind::Inbound, og.clone(), 2024, 7)))
            .unwrap();

        let sequencer = ReceiptSequencer::new(store);

        // Different kind, same location/year.
        let outbound = sequencer
            .next_document_id(MovementKind::Outbound, &og, at(2024))
            .unwrap();
        assert_eq!(outbound.to_string(), "GIN/OG/24/00001");

        // Different location.
        let elsewhere = sequencer
            .next_document_id(MovementKind::Inbound, &loc("W9"), at(2024))
            .unwrap();
        assert_eq!(elsewhere.sequence(), 1);

        // Year rollover resets the scope without any explicit logic.
        let next_year = sequencer
            .next_document_id(MovementKind::Inbound, &og, at(2025))
            .unwrap();
        assert_eq!(next_year.to_string(), "GRN/OG/25/00001");
    }

    #[test]
    fn exhausted_scope_errors_instead_of_widening_the_format() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let og = loc("OG");
        store
            .create(record_with(DocumentId::new(MovementKind::Inbound, og.clone(), 2024, 99_999)))
            .unwrap();

        let sequencer = ReceiptSequencer::new(store);
        let err = sequencer
            .next_document_id(MovementKind::Inbound, &og, at(2024))
            .unwrap_err();
        assert!(matches!(err, stockledger_core::LedgerError::Validation(_)));

        // Other scopes are unaffected.
        let other = sequencer
            .next_document_id(MovementKind::Outbound, &og, at(2024))
            .unwrap();
        assert_eq!(other.sequence(), 1);
    }

    #[test]
    fn credit_leg_suffix_does_not_disturb_the_scan() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let w1 = loc("W1");
        let debit_id = DocumentId::new(MovementKind::Transfer, w1.clone(), 2026, 2);
        store.create(record_with(debit_id.clone())).unwrap();
        store.create(record_with(debit_id.credit_leg())).unwrap();

        let sequencer = ReceiptSequencer::new(store);
        let id = sequencer
            .next_document_id(MovementKind::Transfer, &w1, at(2026))
            .unwrap();
        assert_eq!(id.sequence(), 3);
    }
}
