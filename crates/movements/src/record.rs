//! The movement record: the ledger's only entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{ActorId, ItemId, LocationCode, Quantity, RecordId};

use crate::document::{DocumentId, MovementKind};

/// Which side of a transfer a record represents.
///
/// A transfer is stored as a **pair** of records sharing a document-id body:
/// a debit at the source and a credit at the destination. Each leg folds at
/// its own location; there is no single-record transfer form.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferLeg {
    Debit,
    Credit,
}

/// Destination of a transfer, carried on the debit leg so the pair can be
/// reconstructed from either side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCounterparty {
    pub location: LocationCode,
    pub item: ItemId,
}

/// Free-text metadata attached to a movement (all optional).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementMeta {
    pub supplier: Option<String>,
    pub order_code: Option<String>,
    pub note: Option<String>,
}

/// An immutable ledger entry: one inbound, outbound, or transfer-leg event.
///
/// Once the happy path completes a record only ever changes through two
/// paths: a corrective quantity amendment, or deletion (derived stock makes
/// a separate reversal entry unnecessary).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub id: RecordId,
    pub document_id: DocumentId,
    pub kind: MovementKind,
    /// Set iff `kind` is `Transfer`.
    pub leg: Option<TransferLeg>,
    pub item: ItemId,
    pub location: LocationCode,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
    pub actor: ActorId,
    /// Set on a transfer's debit leg.
    pub counterparty: Option<TransferCounterparty>,
    #[serde(flatten)]
    pub meta: MovementMeta,
}

impl MovementRecord {
    pub fn inbound(
        id: RecordId,
        document_id: DocumentId,
        item: ItemId,
        location: LocationCode,
        quantity: Quantity,
        occurred_at: DateTime<Utc>,
        actor: ActorId,
        meta: MovementMeta,
    ) -> Self {
        Self {
            id,
            document_id,
            kind: MovementKind::Inbound,
            leg: None,
            item,
            location,
            quantity,
            occurred_at,
            actor,
            counterparty: None,
            meta,
        }
    }

    pub fn outbound(
        id: RecordId,
        document_id: DocumentId,
        item: ItemId,
        location: LocationCode,
        quantity: Quantity,
        occurred_at: DateTime<Utc>,
        actor: ActorId,
        meta: MovementMeta,
    ) -> Self {
        Self {
            id,
            document_id,
            kind: MovementKind::Outbound,
            leg: None,
            item,
            location,
            quantity,
            occurred_at,
            actor,
            counterparty: None,
            meta,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn transfer_debit(
        id: RecordId,
        document_id: DocumentId,
        item: ItemId,
        source: LocationCode,
        counterparty: TransferCounterparty,
        quantity: Quantity,
        occurred_at: DateTime<Utc>,
        actor: ActorId,
        meta: MovementMeta,
    ) -> Self {
        Self {
            id,
            document_id,
            kind: MovementKind::Transfer,
            leg: Some(TransferLeg::Debit),
            item,
            location: source,
            quantity,
            occurred_at,
            actor,
            counterparty: Some(counterparty),
            meta,
        }
    }

    pub fn transfer_credit(
        id: RecordId,
        document_id: DocumentId,
        item: ItemId,
        destination: LocationCode,
        quantity: Quantity,
        occurred_at: DateTime<Utc>,
        actor: ActorId,
        meta: MovementMeta,
    ) -> Self {
        Self {
            id,
            document_id,
            kind: MovementKind::Transfer,
            leg: Some(TransferLeg::Credit),
            item,
            location: destination,
            quantity,
            occurred_at,
            actor,
            counterparty: None,
            meta,
        }
    }

    /// True for records whose effect reduces stock at their own location.
    pub fn is_debiting(&self) -> bool {
        matches!(
            (self.kind, self.leg),
            (MovementKind::Outbound, None) | (MovementKind::Transfer, Some(TransferLeg::Debit))
        )
    }

    /// Signed contribution (in hundredths) at this record's own
    /// (item, location). `None` for malformed kind/leg combinations, which
    /// the fold must skip rather than throw on.
    pub fn signed_delta(&self) -> Option<i64> {
        let q = self.quantity.hundredths();
        match (self.kind, self.leg) {
            (MovementKind::Inbound, None) => Some(q),
            (MovementKind::Outbound, None) => Some(-q),
            (MovementKind::Transfer, Some(TransferLeg::Debit)) => Some(-q),
            (MovementKind::Transfer, Some(TransferLeg::Credit)) => Some(q),
            _ => None,
        }
    }

    /// Signed contribution toward `(item, location)`, or `None` when this
    /// record does not touch that pair (or is malformed).
    pub fn contribution_at(&self, item: ItemId, location: &LocationCode) -> Option<i64> {
        if self.item != item || &self.location != location {
            return None;
        }
        self.signed_delta()
    }
}
