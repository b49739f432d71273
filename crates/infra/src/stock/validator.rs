use stockledger_core::{ItemId, LedgerError, LedgerResult, LocationCode, Quantity};

use crate::stock::StockCalculator;
use crate::store::TransactionStore;

/// Gate for debiting operations: rejects anything that would drive derived
/// stock negative.
///
/// This is a read-then-decide check, not a reservation: it takes no lock
/// and holds nothing, so under concurrent multi-client access two callers
/// can both pass it before either writes. Callers mitigate (not solve) this
/// by forcing `StockCalculator::reload` immediately before validating.
pub struct AvailabilityValidator<'a, S> {
    calculator: &'a StockCalculator<S>,
}

impl<'a, S: TransactionStore> AvailabilityValidator<'a, S> {
    pub fn new(calculator: &'a StockCalculator<S>) -> Self {
        Self { calculator }
    }

    /// Fails with `InsufficientStock` iff `requested` exceeds the current
    /// derived stock of `(item, location)`.
    pub fn ensure_available(
        &self,
        item: ItemId,
        location: &LocationCode,
        requested: Quantity,
    ) -> LedgerResult<()> {
        let available = self.calculator.stock_of(item, location)?;
        if !available.covers(requested) {
            return Err(LedgerError::insufficient_stock(
                item,
                location.clone(),
                requested,
                available,
            ));
        }
        Ok(())
    }
}
