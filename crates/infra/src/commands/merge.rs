//! Merging duplicate items.
//!
//! Two or more items believed to be duplicates are combined into a single
//! new item by redirecting every historical movement record onto the new
//! target, then deleting the sources. No record's quantity or kind changes,
//! so the target's derived stock equals the sum of the sources' by
//! construction. The redirection is sequential and non-transactional; a
//! mid-flight failure is surfaced as `PartialMerge` naming the source left
//! inconsistent, never masked.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info};

use stockledger_core::{ItemId, LedgerError, LedgerResult};
use stockledger_inventory::{Item, validate_merge_sources};

use crate::stock::StockCalculator;
use crate::store::{ItemStore, TransactionStore};

/// Orchestrates item merges over the transaction store and item catalogue,
/// sharing the movement service's calculator so invalidation reaches every
/// reader.
pub struct MergeOrchestrator<S, I> {
    transactions: S,
    items: I,
    calculator: Arc<StockCalculator<S>>,
}

impl<S, I> MergeOrchestrator<S, I>
where
    S: TransactionStore,
    I: ItemStore,
{
    pub fn new(transactions: S, items: I, calculator: Arc<StockCalculator<S>>) -> Self {
        Self {
            transactions,
            items,
            calculator,
        }
    }

    /// Merge `source_ids` into a newly created item named `target_name`.
    ///
    /// The target starts with zero stock by construction — its stock is
    /// purely the fold of the redirected records. Returns the created item.
    pub fn merge_items(&self, source_ids: &[ItemId], target_name: &str) -> LedgerResult<Item> {
        if source_ids.len() < 2 {
            return Err(LedgerError::validation(
                "merge requires at least two source items",
            ));
        }

        let mut sources = Vec::with_capacity(source_ids.len());
        for id in source_ids {
            let item = self.items.get(*id)?.ok_or(LedgerError::NotFound)?;
            sources.push(item);
        }
        let (location, unit) = validate_merge_sources(&sources)?;

        // The target name may not collide with an existing, unrelated item
        // at that location. Colliding with a source is fine: it is about to
        // be deleted.
        if let Some(existing) = self.items.find_by_name(&location, target_name)? {
            if !source_ids.contains(&existing.id) {
                return Err(LedgerError::DuplicateName(target_name.to_string()));
            }
        }

        // The smallest advisory threshold among the sources survives.
        let minimum_threshold = sources.iter().filter_map(|s| s.minimum_threshold).min();

        let target = Item::new(
            ItemId::new(),
            target_name,
            unit,
            location,
            minimum_threshold,
        )?;
        let target = self.items.insert(target)?;

        // Redirect the histories in a single pass over the live record set.
        // A record can reference two sources at once (its own item and a
        // transfer counterparty), so each record is rewritten exactly once
        // with every applicable redirection applied together. A per-source
        // pass over a pre-loaded snapshot would clobber its own earlier
        // rewrite of such a record.
        let source_ids: HashSet<ItemId> = sources.iter().map(|s| s.id).collect();
        let history: Vec<_> = self
            .transactions
            .list_all()?
            .into_iter()
            .filter(|r| {
                source_ids.contains(&r.item)
                    || r.counterparty.as_ref().is_some_and(|c| source_ids.contains(&c.item))
            })
            .collect();
        let total = history.len();
        let mut redirected = 0usize;

        for record in history {
            let failed_source = if source_ids.contains(&record.item) {
                record.item
            } else {
                record.counterparty.as_ref().map(|c| c.item).unwrap_or(record.item)
            };

            let mut rewritten = record.clone();
            if source_ids.contains(&rewritten.item) {
                rewritten.item = target.id;
            }
            if let Some(counterparty) = rewritten.counterparty.as_mut() {
                if source_ids.contains(&counterparty.item) {
                    counterparty.item = target.id;
                }
            }

            if let Err(err) = self.transactions.update(record.id, rewritten) {
                error!(
                    source = %failed_source,
                    record_id = %record.id,
                    redirected,
                    total,
                    %err,
                    "merge redirection failed mid-flight"
                );
                self.calculator.invalidate();
                return Err(LedgerError::PartialMerge {
                    source_item: failed_source,
                    redirected,
                    total,
                    reason: err.to_string(),
                });
            }
            redirected += 1;
        }

        // Histories are fully redirected; remove the sources.
        for source in &sources {
            if let Err(err) = self.items.delete(source.id) {
                error!(source = %source.id, %err, "source item delete failed after redirection");
                self.calculator.invalidate();
                return Err(LedgerError::PartialMerge {
                    source_item: source.id,
                    redirected,
                    total,
                    reason: format!("history redirected but source delete failed: {err}"),
                });
            }
        }

        self.calculator.invalidate();
        info!(target = %target.id, name = %target.name, sources = sources.len(), "items merged");
        Ok(target)
    }
}
