use std::collections::HashMap;
use std::time::{Duration, Instant};

use std::sync::RwLock;

use stockledger_core::{ItemId, LedgerError, LedgerResult, LocationCode, StockLevel};
use stockledger_inventory::Item;
use stockledger_movements::{MovementRecord, StockKey, fold_all, fold_stock};

use crate::store::TransactionStore;

/// How long a cached per-key stock value is served before it is refolded.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Full record set pulled from the store, plus a per-item index so one
/// item's fold never walks the whole ledger.
#[derive(Debug)]
struct Snapshot {
    records: Vec<MovementRecord>,
    by_item: HashMap<ItemId, Vec<usize>>,
}

impl Snapshot {
    fn build(records: Vec<MovementRecord>) -> Self {
        let mut by_item: HashMap<ItemId, Vec<usize>> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_item.entry(record.item).or_default().push(idx);
        }
        Self { records, by_item }
    }

    fn fold(&self, item: ItemId, location: &LocationCode) -> StockLevel {
        match self.by_item.get(&item) {
            Some(indices) => fold_stock(
                indices.iter().map(|&i| &self.records[i]),
                item,
                location,
            ),
            None => StockLevel::ZERO,
        }
    }
}

#[derive(Debug, Copy, Clone)]
struct CachedStock {
    level: StockLevel,
    computed_at: Instant,
}

/// Computes derived stock by folding movement records, with an
/// invalidation-based cache.
///
/// The design is invalidate-then-recompute-lazily: after any successful
/// write the whole cache and snapshot are dropped, and the next read
/// rebuilds what it needs. Incremental cache patching is deliberately
/// avoided — other clients write to the same store, and without a shared
/// invalidation channel a patched cache silently drifts.
#[derive(Debug)]
pub struct StockCalculator<S> {
    store: S,
    ttl: Duration,
    snapshot: RwLock<Option<Snapshot>>,
    cache: RwLock<HashMap<StockKey, CachedStock>>,
}

impl<S: TransactionStore> StockCalculator<S> {
    pub fn new(store: S) -> Self {
        Self::with_ttl(store, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(store: S, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            snapshot: RwLock::new(None),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Force a resync: pull the full record set, rebuild the index, drop any
    /// cached values computed against the previous snapshot.
    ///
    /// Commands call this before validating a debit so the availability
    /// check is not served from data older than the write attempt.
    pub fn reload(&self) -> LedgerResult<()> {
        let records = self.store.list_all()?;
        let snapshot = Snapshot::build(records);

        *self.snapshot.write().map_err(|_| lock_poisoned())? = Some(snapshot);
        self.cache.write().map_err(|_| lock_poisoned())?.clear();
        Ok(())
    }

    /// Drop the cache and the loaded snapshot. Must be called after any
    /// successful write so the next read observes it; the next read then
    /// reloads lazily.
    pub fn invalidate(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
        if let Ok(mut snapshot) = self.snapshot.write() {
            *snapshot = None;
        }
    }

    /// Derived stock for one (item, location).
    ///
    /// A cache entry younger than the TTL is returned as-is; otherwise the
    /// item's records are refolded from the snapshot (loading it first if
    /// needed) and the fresh value is cached.
    pub fn stock_of(&self, item: ItemId, location: &LocationCode) -> LedgerResult<StockLevel> {
        let key = (item, location.clone());

        {
            let cache = self.cache.read().map_err(|_| lock_poisoned())?;
            if let Some(hit) = cache.get(&key) {
                if hit.computed_at.elapsed() < self.ttl {
                    return Ok(hit.level);
                }
            }
        }

        self.ensure_snapshot()?;

        let level = {
            let snapshot = self.snapshot.read().map_err(|_| lock_poisoned())?;
            match snapshot.as_ref() {
                Some(snap) => snap.fold(item, location),
                // Invalidated between ensure and read; treat as empty rather
                // than erroring, the next call reloads.
                None => StockLevel::ZERO,
            }
        };

        self.cache
            .write()
            .map_err(|_| lock_poisoned())?
            .insert(key, CachedStock {
                level,
                computed_at: Instant::now(),
            });

        Ok(level)
    }

    /// Derived stock for every (item, location) bucket in one pass,
    /// optionally filtered to a location. Bypasses the per-key cache.
    pub fn bulk_stock_of(
        &self,
        location: Option<&LocationCode>,
    ) -> LedgerResult<HashMap<StockKey, StockLevel>> {
        self.ensure_snapshot()?;
        let snapshot = self.snapshot.read().map_err(|_| lock_poisoned())?;
        Ok(match snapshot.as_ref() {
            Some(snap) => fold_all(&snap.records, location),
            None => HashMap::new(),
        })
    }

    /// Items whose derived stock sits at or under their advisory minimum
    /// threshold. Items without a threshold are skipped.
    pub fn below_threshold(&self, items: &[Item]) -> LedgerResult<Vec<(ItemId, StockLevel)>> {
        let levels = self.bulk_stock_of(None)?;
        let mut low = Vec::new();
        for item in items {
            let Some(threshold) = item.minimum_threshold else {
                continue;
            };
            let level = levels
                .get(&(item.id, item.location.clone()))
                .copied()
                .unwrap_or(StockLevel::ZERO);
            if level.hundredths() <= threshold.hundredths() {
                low.push((item.id, level));
            }
        }
        Ok(low)
    }

    fn ensure_snapshot(&self) -> LedgerResult<()> {
        {
            let snapshot = self.snapshot.read().map_err(|_| lock_poisoned())?;
            if snapshot.is_some() {
                return Ok(());
            }
        }
        self.reload()
    }
}

fn lock_poisoned() -> LedgerError {
    LedgerError::store("stock calculator lock poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    use stockledger_core::{ActorId, Quantity, RecordId};
    use stockledger_movements::{DocumentId, MovementKind, MovementMeta};

    use crate::store::InMemoryTransactionStore;

    fn loc(code: &str) -> LocationCode {
        LocationCode::new(code).unwrap()
    }

    fn qty(h: i64) -> Quantity {
        Quantity::from_hundredths(h).unwrap()
    }

    fn inbound(item: ItemId, location: &LocationCode, h: i64) -> MovementRecord {
        MovementRecord::inbound(
            RecordId::new(),
            DocumentId::new(MovementKind::Inbound, location.clone(), 2026, 1),
            item,
            location.clone(),
            qty(h),
            Utc::now(),
            ActorId::new(),
            MovementMeta::default(),
        )
    }

    #[test]
    fn unknown_item_folds_to_zero() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let calc = StockCalculator::new(store);
        assert_eq!(calc.stock_of(ItemId::new(), &loc("W1")).unwrap(), StockLevel::ZERO);
    }

    #[test]
    fn cache_serves_stale_value_until_invalidated() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let calc = StockCalculator::new(store.clone());
        let item = ItemId::new();
        let w1 = loc("W1");

        store.create(inbound(item, &w1, 10_000)).unwrap();
        assert_eq!(calc.stock_of(item, &w1).unwrap().hundredths(), 10_000);

        // A write the calculator was not told about: the cached value wins
        // inside the TTL window.
        store.create(inbound(item, &w1, 5_000)).unwrap();
        assert_eq!(calc.stock_of(item, &w1).unwrap().hundredths(), 10_000);

        // Invalidation makes the next read observe it.
        calc.invalidate();
        assert_eq!(calc.stock_of(item, &w1).unwrap().hundredths(), 15_000);
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let calc = StockCalculator::with_ttl(store.clone(), Duration::ZERO);
        let item = ItemId::new();
        let w1 = loc("W1");

        store.create(inbound(item, &w1, 100)).unwrap();
        assert_eq!(calc.stock_of(item, &w1).unwrap().hundredths(), 100);

        // Cache expired immediately, but the snapshot is still the old one;
        // only a reload resyncs against the store.
        store.create(inbound(item, &w1, 100)).unwrap();
        calc.reload().unwrap();
        assert_eq!(calc.stock_of(item, &w1).unwrap().hundredths(), 200);
    }

    #[test]
    fn bulk_bypasses_cache_but_uses_snapshot() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let calc = StockCalculator::new(store.clone());
        let item = ItemId::new();
        let w1 = loc("W1");

        store.create(inbound(item, &w1, 700)).unwrap();
        let all = calc.bulk_stock_of(None).unwrap();
        assert_eq!(all[&(item, w1.clone())].hundredths(), 700);

        let only_w2 = calc.bulk_stock_of(Some(&loc("W2"))).unwrap();
        assert!(only_w2.is_empty());
    }

    #[test]
    fn below_threshold_flags_depleted_items() {
        use stockledger_inventory::{Item, UnitOfMeasure};

        let store = Arc::new(InMemoryTransactionStore::new());
        let calc = StockCalculator::new(store.clone());
        let w1 = loc("W1");

        let low = Item::new(
            ItemId::new(),
            "Low",
            UnitOfMeasure::new("PCS").unwrap(),
            w1.clone(),
            Some(qty(1_000)),
        )
        .unwrap();
        let healthy = Item::new(
            ItemId::new(),
            "Healthy",
            UnitOfMeasure::new("PCS").unwrap(),
            w1.clone(),
            Some(qty(1_000)),
        )
        .unwrap();
        let untracked = Item::new(
            ItemId::new(),
            "Untracked",
            UnitOfMeasure::new("PCS").unwrap(),
            w1.clone(),
            None,
        )
        .unwrap();

        store.create(inbound(low.id, &w1, 500)).unwrap();
        store.create(inbound(healthy.id, &w1, 5_000)).unwrap();

        let flagged = calc
            .below_threshold(&[low.clone(), healthy, untracked])
            .unwrap();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].0, low.id);
        assert_eq!(flagged[0].1.hundredths(), 500);
    }
}
