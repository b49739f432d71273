//! Batch movements: many lines under one shared header.
//!
//! Validation is exhaustive and front-loaded: the snapshot is refreshed
//! once, every line is checked, and only then is anything written. The
//! underlying commit may still be a non-atomic multi-row write — that is a
//! store property this layer does not paper over — but no line is ever
//! written on the strength of a partially validated batch.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::info;

use stockledger_core::{ActorId, ItemId, LedgerError, LedgerResult, LocationCode, Quantity, RecordId};
use stockledger_movements::{MovementKind, MovementMeta, MovementRecord, TransferCounterparty};

use crate::commands::movement::MovementService;
use crate::stock::AvailabilityValidator;
use crate::store::TransactionStore;

/// Direction of a batch receipt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BatchKind {
    Inbound,
    Outbound,
}

impl From<BatchKind> for MovementKind {
    fn from(kind: BatchKind) -> Self {
        match kind {
            BatchKind::Inbound => MovementKind::Inbound,
            BatchKind::Outbound => MovementKind::Outbound,
        }
    }
}

/// One line of a batch: an item and a quantity.
#[derive(Debug, Clone)]
pub struct BatchLine {
    pub item: ItemId,
    pub quantity: Quantity,
}

/// Command: record many inbound or outbound lines under one document id.
#[derive(Debug, Clone)]
pub struct BatchReceipt {
    pub kind: BatchKind,
    pub location: LocationCode,
    pub lines: Vec<BatchLine>,
    pub occurred_at: DateTime<Utc>,
    pub actor: ActorId,
    pub meta: MovementMeta,
}

/// Command: transfer many lines from one location to another under one
/// document id.
#[derive(Debug, Clone)]
pub struct BatchTransfer {
    pub source: LocationCode,
    pub destination: LocationCode,
    pub lines: Vec<BatchLine>,
    pub occurred_at: DateTime<Utc>,
    pub actor: ActorId,
    pub meta: MovementMeta,
}

impl<S: TransactionStore + Clone> MovementService<S> {
    /// Record a batch of inbound or outbound lines.
    ///
    /// For an outbound batch, lines for the same item are **accumulated**
    /// before the availability check — two lines may not double-spend the
    /// same stock inside one batch.
    pub fn batch_receipt(&self, cmd: BatchReceipt) -> LedgerResult<Vec<MovementRecord>> {
        if cmd.lines.is_empty() {
            return Err(LedgerError::validation("batch has no lines"));
        }

        if cmd.kind == BatchKind::Outbound {
            self.calculator.reload()?;
            let validator = AvailabilityValidator::new(&self.calculator);
            for (item, total) in accumulate(&cmd.lines)? {
                validator.ensure_available(item, &cmd.location, total)?;
            }
        }

        let document_id =
            self.sequencer
                .next_document_id(cmd.kind.into(), &cmd.location, cmd.occurred_at)?;

        let records: Vec<MovementRecord> = cmd
            .lines
            .iter()
            .map(|line| match cmd.kind {
                BatchKind::Inbound => MovementRecord::inbound(
                    RecordId::new(),
                    document_id.clone(),
                    line.item,
                    cmd.location.clone(),
                    line.quantity,
                    cmd.occurred_at,
                    cmd.actor,
                    cmd.meta.clone(),
                ),
                BatchKind::Outbound => MovementRecord::outbound(
                    RecordId::new(),
                    document_id.clone(),
                    line.item,
                    cmd.location.clone(),
                    line.quantity,
                    cmd.occurred_at,
                    cmd.actor,
                    cmd.meta.clone(),
                ),
            })
            .collect();

        let committed = self.store.commit(records)?;
        self.calculator.invalidate();
        info!(document_id = %document_id, lines = committed.len(), "batch receipt committed");
        Ok(committed)
    }

    /// Record a batch transfer: per line a debit at the source and a credit
    /// at the destination, all under one shared document id (credit legs
    /// carry the suffix marker).
    pub fn batch_transfer(&self, cmd: BatchTransfer) -> LedgerResult<Vec<MovementRecord>> {
        if cmd.lines.is_empty() {
            return Err(LedgerError::validation("batch has no lines"));
        }
        if cmd.source == cmd.destination {
            return Err(LedgerError::validation(
                "transfer source and destination must differ",
            ));
        }

        self.calculator.reload()?;
        let validator = AvailabilityValidator::new(&self.calculator);
        for (item, total) in accumulate(&cmd.lines)? {
            validator.ensure_available(item, &cmd.source, total)?;
        }

        let document_id =
            self.sequencer
                .next_document_id(MovementKind::Transfer, &cmd.source, cmd.occurred_at)?;
        let credit_id = document_id.credit_leg();

        let mut records = Vec::with_capacity(cmd.lines.len() * 2);
        for line in &cmd.lines {
            records.push(MovementRecord::transfer_debit(
                RecordId::new(),
                document_id.clone(),
                line.item,
                cmd.source.clone(),
                TransferCounterparty {
                    location: cmd.destination.clone(),
                    item: line.item,
                },
                line.quantity,
                cmd.occurred_at,
                cmd.actor,
                cmd.meta.clone(),
            ));
            records.push(MovementRecord::transfer_credit(
                RecordId::new(),
                credit_id.clone(),
                line.item,
                cmd.destination.clone(),
                line.quantity,
                cmd.occurred_at,
                cmd.actor,
                cmd.meta.clone(),
            ));
        }

        let committed = self.store.commit(records)?;
        self.calculator.invalidate();
        info!(
            document_id = %document_id,
            lines = cmd.lines.len(),
            source = %cmd.source,
            destination = %cmd.destination,
            "batch transfer committed"
        );
        Ok(committed)
    }
}

/// Sum line quantities per item, erroring on overflow.
fn accumulate(lines: &[BatchLine]) -> LedgerResult<HashMap<ItemId, Quantity>> {
    let mut totals: HashMap<ItemId, Quantity> = HashMap::new();
    for line in lines {
        let total = match totals.get(&line.item) {
            Some(existing) => existing
                .checked_add(line.quantity)
                .ok_or_else(|| LedgerError::validation("batch quantity out of range"))?,
            None => line.quantity,
        };
        totals.insert(line.item, total);
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::commands::movement::InboundReceipt;
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

    fn seed(svc: &MovementService<Arc<InMemoryTransactionStore>>, item: ItemId, h: i64) {
        svc.record_inbound(InboundReceipt {
            item,
            location: loc("W1"),
            quantity: qty(h),
            occurred_at: Utc::now(),
            actor: ActorId::new(),
            meta: MovementMeta::default(),
        })
        .unwrap();
    }

    #[test]
    fn batch_lines_share_one_document_id() {
        let svc = service();
        let records = svc
            .batch_receipt(BatchReceipt {
                kind: BatchKind::Inbound,
                location: loc("W1"),
                lines: vec![
                    BatchLine { item: ItemId::new(), quantity: qty(100) },
                    BatchLine { item: ItemId::new(), quantity: qty(200) },
                    BatchLine { item: ItemId::new(), quantity: qty(300) },
                ],
                occurred_at: Utc::now(),
                actor: ActorId::new(),
                meta: MovementMeta::default(),
            })
            .unwrap();

        assert_eq!(records.len(), 3);
        let first = &records[0].document_id;
        assert!(records.iter().all(|r| &r.document_id == first));
    }

    #[test]
    fn outbound_batch_validates_every_line_before_writing_any() {
        let svc = service();
        let a = ItemId::new();
        let b = ItemId::new();
        seed(&svc, a, 1_000);
        seed(&svc, b, 100);

        let err = svc
            .batch_receipt(BatchReceipt {
                kind: BatchKind::Outbound,
                location: loc("W1"),
                lines: vec![
                    BatchLine { item: a, quantity: qty(500) },  // fine alone
                    BatchLine { item: b, quantity: qty(200) },  // over stock
                ],
                occurred_at: Utc::now(),
                actor: ActorId::new(),
                meta: MovementMeta::default(),
            })
            .unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientStock { .. }));
        // Only the two seed records exist; no partial batch landed.
        assert_eq!(svc.store.list_all().unwrap().len(), 2);
    }

    #[test]
    fn outbound_batch_accumulates_lines_for_the_same_item() {
        let svc = service();
        let item = ItemId::new();
        seed(&svc, item, 1_000);

        // Each line fits alone; together they overdraw.
        let err = svc
            .batch_receipt(BatchReceipt {
                kind: BatchKind::Outbound,
                location: loc("W1"),
                lines: vec![
                    BatchLine { item, quantity: qty(600) },
                    BatchLine { item, quantity: qty(600) },
                ],
                occurred_at: Utc::now(),
                actor: ActorId::new(),
                meta: MovementMeta::default(),
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { .. }));
    }

    #[test]
    fn empty_batch_is_rejected() {
        let svc = service();
        let err = svc
            .batch_receipt(BatchReceipt {
                kind: BatchKind::Inbound,
                location: loc("W1"),
                lines: vec![],
                occurred_at: Utc::now(),
                actor: ActorId::new(),
                meta: MovementMeta::default(),
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn batch_transfer_moves_every_line() {
        let svc = service();
        let a = ItemId::new();
        let b = ItemId::new();
        seed(&svc, a, 1_000);
        seed(&svc, b, 2_000);

        let records = svc
            .batch_transfer(BatchTransfer {
                source: loc("W1"),
                destination: loc("W2"),
                lines: vec![
                    BatchLine { item: a, quantity: qty(400) },
                    BatchLine { item: b, quantity: qty(1_500) },
                ],
                occurred_at: Utc::now(),
                actor: ActorId::new(),
                meta: MovementMeta::default(),
            })
            .unwrap();
        assert_eq!(records.len(), 4);

        let calc = svc.calculator();
        assert_eq!(calc.stock_of(a, &loc("W1")).unwrap().hundredths(), 600);
        assert_eq!(calc.stock_of(a, &loc("W2")).unwrap().hundredths(), 400);
        assert_eq!(calc.stock_of(b, &loc("W1")).unwrap().hundredths(), 500);
        assert_eq!(calc.stock_of(b, &loc("W2")).unwrap().hundredths(), 1_500);
    }
}
