//! The two-leg transfer protocol.
//!
//! The store offers no cross-record atomicity, so the transfer is a saga:
//! write the debit leg, write the credit leg, and if the credit fails,
//! compensate by deleting the debit. A failed compensation is the one
//! genuinely critical condition in the system — the ledger then holds an
//! orphaned debit — and is surfaced as `CompensationFailure`, never folded
//! into a generic error.

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use stockledger_core::{ActorId, ItemId, LedgerError, LedgerResult, LocationCode, Quantity, RecordId};
use stockledger_movements::{
    MovementKind, MovementMeta, MovementRecord, TransferCounterparty, TransferSaga,
};

use crate::commands::movement::MovementService;
use crate::stock::AvailabilityValidator;
use crate::store::TransactionStore;

/// Command: move stock from one location to another.
#[derive(Debug, Clone)]
pub struct TransferOrder {
    pub item: ItemId,
    pub source: LocationCode,
    pub destination: LocationCode,
    /// Receiving item at the destination; defaults to `item` when the same
    /// material exists under one id at both locations.
    pub destination_item: Option<ItemId>,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
    pub actor: ActorId,
    pub meta: MovementMeta,
}

/// A completed transfer: the terminal saga plus both written legs.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub saga: TransferSaga,
    pub debit: MovementRecord,
    pub credit: MovementRecord,
}

impl<S: TransactionStore + Clone> MovementService<S> {
    /// Run the two-leg transfer protocol.
    ///
    /// 1. Reject same-location transfers.
    /// 2. Resync and validate availability against the source leg only (the
    ///    credit leg is never blocked).
    /// 3. Write the debit leg under a fresh document id.
    /// 4. Write the credit leg under the same id plus the credit suffix.
    /// 5. On credit failure, delete the debit leg; if that delete fails too,
    ///    escalate to `CompensationFailure`.
    pub fn transfer(&self, cmd: TransferOrder) -> LedgerResult<TransferOutcome> {
        if cmd.source == cmd.destination {
            return Err(LedgerError::validation(
                "transfer source and destination must differ",
            ));
        }

        self.calculator.reload()?;
        AvailabilityValidator::new(&self.calculator).ensure_available(
            cmd.item,
            &cmd.source,
            cmd.quantity,
        )?;

        let document_id =
            self.sequencer
                .next_document_id(MovementKind::Transfer, &cmd.source, cmd.occurred_at)?;
        let destination_item = cmd.destination_item.unwrap_or(cmd.item);
        let mut saga = TransferSaga::new(document_id.clone());

        let debit = self.store.create(MovementRecord::transfer_debit(
            RecordId::new(),
            document_id.clone(),
            cmd.item,
            cmd.source.clone(),
            TransferCounterparty {
                location: cmd.destination.clone(),
                item: destination_item,
            },
            cmd.quantity,
            cmd.occurred_at,
            cmd.actor,
            cmd.meta.clone(),
        ))?;
        saga.debit_written(debit.id)?;

        let credit_attempt = self.store.create(MovementRecord::transfer_credit(
            RecordId::new(),
            document_id.credit_leg(),
            destination_item,
            cmd.destination.clone(),
            cmd.quantity,
            cmd.occurred_at,
            cmd.actor,
            cmd.meta,
        ));

        match credit_attempt {
            Ok(credit) => {
                saga.credit_written(credit.id)?;
                self.calculator.invalidate();
                info!(
                    document_id = %document_id,
                    item = %cmd.item,
                    source = %cmd.source,
                    destination = %cmd.destination,
                    quantity = %cmd.quantity,
                    "transfer recorded"
                );
                Ok(TransferOutcome { saga, debit, credit })
            }
            Err(credit_err) => match self.store.delete(debit.id) {
                Ok(()) => {
                    saga.rolled_back()?;
                    self.calculator.invalidate();
                    warn!(
                        document_id = %document_id,
                        error = %credit_err,
                        "credit leg failed; debit leg rolled back"
                    );
                    Err(LedgerError::store(format!(
                        "transfer credit leg failed (debit rolled back): {credit_err}"
                    )))
                }
                Err(rollback_err) => {
                    saga.compensation_failed(rollback_err.to_string())?;
                    self.calculator.invalidate();
                    error!(
                        record_id = %debit.id,
                        document_id = %debit.document_id,
                        credit_error = %credit_err,
                        rollback_error = %rollback_err,
                        "transfer compensation failed; orphaned debit leg requires manual reconciliation"
                    );
                    Err(LedgerError::CompensationFailure {
                        record_id: debit.id,
                        document_id: debit.document_id.to_string(),
                        reason: format!(
                            "credit write failed ({credit_err}); rollback delete failed ({rollback_err})"
                        ),
                    })
                }
            },
        }
    }
}
