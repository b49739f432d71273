use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use stockledger_core::{ActorId, ItemId, LedgerError, LedgerResult, LocationCode, Quantity, RecordId};
use stockledger_movements::{MovementKind, MovementMeta, MovementRecord};

use crate::sequence::ReceiptSequencer;
use crate::stock::{AvailabilityValidator, StockCalculator};
use crate::store::TransactionStore;

/// Command: record goods received at a location.
#[derive(Debug, Clone)]
pub struct InboundReceipt {
    pub item: ItemId,
    pub location: LocationCode,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
    pub actor: ActorId,
    pub meta: MovementMeta,
}

/// Command: record goods issued from a location.
#[derive(Debug, Clone)]
pub struct OutboundIssue {
    pub item: ItemId,
    pub location: LocationCode,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
    pub actor: ActorId,
    pub meta: MovementMeta,
}

/// Orchestrates the movement write paths over one shared store and one
/// shared calculator.
///
/// Positivity of quantities is enforced by `Quantity` itself, so commands
/// never re-check it at runtime.
pub struct MovementService<S> {
    pub(crate) store: S,
    pub(crate) calculator: Arc<StockCalculator<S>>,
    pub(crate) sequencer: ReceiptSequencer<S>,
}

impl<S: TransactionStore + Clone> MovementService<S> {
    pub fn new(store: S) -> Self {
        let calculator = Arc::new(StockCalculator::new(store.clone()));
        Self::with_calculator(store, calculator)
    }

    /// Wire up against an externally owned calculator (e.g. one shared with
    /// a merge orchestrator, or one with a test-controlled TTL).
    pub fn with_calculator(store: S, calculator: Arc<StockCalculator<S>>) -> Self {
        Self {
            sequencer: ReceiptSequencer::new(store.clone()),
            store,
            calculator,
        }
    }

    /// The calculator backing this service; read stock through it.
    pub fn calculator(&self) -> &Arc<StockCalculator<S>> {
        &self.calculator
    }

    pub fn sequencer(&self) -> &ReceiptSequencer<S> {
        &self.sequencer
    }

    /// Record an inbound movement (pure credit; no availability check).
    pub fn record_inbound(&self, cmd: InboundReceipt) -> LedgerResult<MovementRecord> {
        let document_id =
            self.sequencer
                .next_document_id(MovementKind::Inbound, &cmd.location, cmd.occurred_at)?;
        let record = MovementRecord::inbound(
            RecordId::new(),
            document_id,
            cmd.item,
            cmd.location,
            cmd.quantity,
            cmd.occurred_at,
            cmd.actor,
            cmd.meta,
        );

        let record = self.store.create(record)?;
        self.calculator.invalidate();
        info!(document_id = %record.document_id, item = %record.item, quantity = %record.quantity, "inbound recorded");
        Ok(record)
    }

    /// Record an outbound movement. Resyncs the snapshot, then rejects with
    /// `InsufficientStock` before any write if the issue cannot be covered.
    pub fn record_outbound(&self, cmd: OutboundIssue) -> LedgerResult<MovementRecord> {
        self.calculator.reload()?;
        if let Err(err) = AvailabilityValidator::new(&self.calculator).ensure_available(
            cmd.item,
            &cmd.location,
            cmd.quantity,
        ) {
            warn!(item = %cmd.item, location = %cmd.location, %err, "outbound rejected");
            return Err(err);
        }

        let document_id =
            self.sequencer
                .next_document_id(MovementKind::Outbound, &cmd.location, cmd.occurred_at)?;
        let record = MovementRecord::outbound(
            RecordId::new(),
            document_id,
            cmd.item,
            cmd.location,
            cmd.quantity,
            cmd.occurred_at,
            cmd.actor,
            cmd.meta,
        );

        let record = self.store.create(record)?;
        self.calculator.invalidate();
        info!(document_id = %record.document_id, item = %record.item, quantity = %record.quantity, "outbound recorded");
        Ok(record)
    }

    /// Corrective quantity amendment.
    ///
    /// For a debiting record the new quantity must fit into the stock *as it
    /// would be with the original quantity reverted*: `available = current +
    /// old`. Crediting records can only increase stock, so they skip the
    /// check.
    pub fn amend_quantity(
        &self,
        record_id: RecordId,
        new_quantity: Quantity,
    ) -> LedgerResult<MovementRecord> {
        let record = self
            .store
            .list_all()?
            .into_iter()
            .find(|r| r.id == record_id)
            .ok_or(LedgerError::NotFound)?;

        if record.is_debiting() {
            self.calculator.reload()?;
            let current = self.calculator.stock_of(record.item, &record.location)?;
            let available = current.plus(record.quantity);
            if !available.covers(new_quantity) {
                warn!(record_id = %record.id, %new_quantity, "amendment rejected");
                return Err(LedgerError::insufficient_stock(
                    record.item,
                    record.location.clone(),
                    new_quantity,
                    available,
                ));
            }
        }

        let mut amended = record;
        amended.quantity = new_quantity;
        let updated = self.store.update(record_id, amended)?;
        self.calculator.invalidate();
        info!(record_id = %updated.id, quantity = %updated.quantity, "quantity amended");
        Ok(updated)
    }

    /// Delete a movement record.
    ///
    /// Derived stock is recomputed from the remaining records, so deletion
    /// needs no separate reversal entry — only cache invalidation once the
    /// store delete succeeds.
    pub fn delete_movement(&self, record_id: RecordId) -> LedgerResult<()> {
        self.store.delete(record_id)?;
        self.calculator.invalidate();
        info!(%record_id, "movement deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::store::InMemoryTransactionStore;

    fn loc(code: &str) -> LocationCode {
        LocationCode::new(code).unwrap()
    }

    fn qty(h: i64) -> Quantity {
        Quantity::from_hundredths(h).unwrap()
    }

    fn service() -> MovementService<Arc<InMemoryTransactionStore>> {
        MovementService::new(Arc::new(InMemoryTransactionStore::new()))
    }

    fn inbound_cmd(item: ItemId, location: &LocationCode, h: i64) -> InboundReceipt {
        InboundReceipt {
            item,
            location: location.clone(),
            quantity: qty(h),
            occurred_at: Utc::now(),
            actor: ActorId::new(),
            meta: MovementMeta::default(),
        }
    }

    fn outbound_cmd(item: ItemId, location: &LocationCode, h: i64) -> OutboundIssue {
        OutboundIssue {
            item,
            location: location.clone(),
            quantity: qty(h),
            occurred_at: Utc::now(),
            actor: ActorId::new(),
            meta: MovementMeta::default(),
        }
    }

    #[test]
    fn inbound_is_immediately_visible() {
        let svc = service();
        let item = ItemId::new();
        let w1 = loc("W1");

        let record = svc.record_inbound(inbound_cmd(item, &w1, 10_000)).unwrap();
        assert_eq!(record.kind, MovementKind::Inbound);
        assert_eq!(
            svc.calculator().stock_of(item, &w1).unwrap().hundredths(),
            10_000
        );
    }

    #[test]
    fn outbound_over_stock_is_rejected_before_any_write() {
        let svc = service();
        let item = ItemId::new();
        let w1 = loc("W1");

        svc.record_inbound(inbound_cmd(item, &w1, 1_000)).unwrap();
        let err = svc.record_outbound(outbound_cmd(item, &w1, 1_001)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { .. }));

        // Nothing landed: only the inbound exists.
        assert_eq!(svc.store.list_all().unwrap().len(), 1);
        assert_eq!(
            svc.calculator().stock_of(item, &w1).unwrap().hundredths(),
            1_000
        );
    }

    #[test]
    fn document_ids_are_sequential_per_kind() {
        let svc = service();
        let item = ItemId::new();
        let w1 = loc("W1");

        let a = svc.record_inbound(inbound_cmd(item, &w1, 100)).unwrap();
        let b = svc.record_inbound(inbound_cmd(item, &w1, 100)).unwrap();
        let out = svc.record_outbound(outbound_cmd(item, &w1, 50)).unwrap();

        assert_eq!(a.document_id.sequence(), 1);
        assert_eq!(b.document_id.sequence(), 2);
        assert_eq!(out.document_id.sequence(), 1);
        assert_eq!(out.document_id.kind(), MovementKind::Outbound);
    }

    #[test]
    fn amend_debiting_record_respects_reverted_stock() {
        let svc = service();
        let item = ItemId::new();
        let w1 = loc("W1");

        svc.record_inbound(inbound_cmd(item, &w1, 10_000)).unwrap();
        let issue = svc.record_outbound(outbound_cmd(item, &w1, 3_000)).unwrap();

        // current = 70, reverting the 30 gives 100; 100 fits, 101 does not.
        svc.amend_quantity(issue.id, qty(10_000)).unwrap();
        assert_eq!(
            svc.calculator().stock_of(item, &w1).unwrap().hundredths(),
            0
        );

        let err = svc.amend_quantity(issue.id, qty(10_001)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { .. }));
    }

    #[test]
    fn amend_crediting_record_skips_validation() {
        let svc = service();
        let item = ItemId::new();
        let w1 = loc("W1");

        let receipt = svc.record_inbound(inbound_cmd(item, &w1, 100)).unwrap();
        svc.amend_quantity(receipt.id, qty(999_999)).unwrap();
        assert_eq!(
            svc.calculator().stock_of(item, &w1).unwrap().hundredths(),
            999_999
        );
    }

    #[test]
    fn delete_reverts_the_effect_via_recomputation() {
        let svc = service();
        let item = ItemId::new();
        let w1 = loc("W1");

        svc.record_inbound(inbound_cmd(item, &w1, 10_000)).unwrap();
        let issue = svc.record_outbound(outbound_cmd(item, &w1, 4_000)).unwrap();
        assert_eq!(
            svc.calculator().stock_of(item, &w1).unwrap().hundredths(),
            6_000
        );

        svc.delete_movement(issue.id).unwrap();
        assert_eq!(
            svc.calculator().stock_of(item, &w1).unwrap().hundredths(),
            10_000
        );
    }

    #[test]
    fn amending_a_missing_record_is_not_found() {
        let svc = service();
        let err = svc.amend_quantity(RecordId::new(), qty(100)).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound));
    }
}
