//! The stock fold: derived stock from movement records.
//!
//! Current stock is never stored as ground truth; it is always the signed
//! fold of the records referencing an (item, location) pair. Inbound and
//! transfer-credit records add, outbound and transfer-debit records
//! subtract. Anything else is skipped, never thrown on.

use std::collections::HashMap;

use stockledger_core::{ItemId, LocationCode, StockLevel};

use crate::record::MovementRecord;

/// Key of one derived-stock bucket.
pub type StockKey = (ItemId, LocationCode);

/// Fold the records touching one (item, location) pair.
///
/// An item with no records at all yields zero.
pub fn fold_stock<'a>(
    records: impl IntoIterator<Item = &'a MovementRecord>,
    item: ItemId,
    location: &LocationCode,
) -> StockLevel {
    let total = records
        .into_iter()
        .filter_map(|r| r.contribution_at(item, location))
        .sum();
    StockLevel::from_hundredths(total)
}

/// Single-pass fold over an entire record set, bucketed per (item, location).
///
/// With `location` set, only buckets at that location are produced. Used for
/// dashboard-style aggregation; deliberately bypasses any per-key caching.
pub fn fold_all<'a>(
    records: impl IntoIterator<Item = &'a MovementRecord>,
    location: Option<&LocationCode>,
) -> HashMap<StockKey, StockLevel> {
    let mut buckets: HashMap<StockKey, i64> = HashMap::new();

    for record in records {
        if let Some(filter) = location {
            if &record.location != filter {
                continue;
            }
        }
        let Some(delta) = record.signed_delta() else {
            continue;
        };
        *buckets
            .entry((record.item, record.location.clone()))
            .or_default() += delta;
    }

    buckets
        .into_iter()
        .map(|(key, total)| (key, StockLevel::from_hundredths(total)))
        .collect()
}
