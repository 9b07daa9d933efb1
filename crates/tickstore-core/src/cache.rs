use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::{TickerId, Tier, TierRecord};

/// Latest record per `(ticker, tier)`.
///
/// Only the series store writes here, and only after the record is part of
/// its series. A stale update never replaces a newer entry.
#[derive(Default)]
pub struct CurrentValueCache {
    entries: DashMap<(TickerId, Tier), Arc<TierRecord>>,
}

impl CurrentValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ticker: TickerId, tier: Tier) -> Option<Arc<TierRecord>> {
        self.entries
            .get(&(ticker, tier))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Install `record` if it is strictly newer than the cached entry.
    /// Returns whether the cache changed.
    pub(crate) fn set_if_newer(&self, record: Arc<TierRecord>) -> bool {
        match self.entries.entry((record.ticker_id, record.tier())) {
            Entry::Occupied(mut entry) => {
                if entry.get().observed_at < record.observed_at {
                    entry.insert(record);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(record);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current records of one tier, ordered by ticker id.
    pub fn snapshot(&self, tier: Tier) -> Vec<Arc<TierRecord>> {
        let mut records = self
            .entries
            .iter()
            .filter(|entry| entry.key().1 == tier)
            .map(|entry| Arc::clone(entry.value()))
            .collect::<Vec<_>>();
        records.sort_by_key(|record| record.ticker_id);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LiveQuote, RecordId, TierPayload, UtcDateTime};

    fn quote(id: u64, ts: &str, price: f64) -> Arc<TierRecord> {
        Arc::new(TierRecord {
            id: RecordId::new(id),
            ticker_id: TickerId::new(1),
            observed_at: UtcDateTime::parse(ts).expect("ts"),
            inserted_at: UtcDateTime::now(),
            payload: TierPayload::Live(LiveQuote {
                price,
                change: None,
                percent_change: None,
            }),
        })
    }

    #[test]
    fn stale_update_is_ignored() {
        let cache = CurrentValueCache::new();
        assert!(cache.set_if_newer(quote(2, "2026-02-20T15:31:00Z", 101.0)));
        assert!(!cache.set_if_newer(quote(1, "2026-02-20T15:30:00Z", 100.0)));
        assert!(!cache.set_if_newer(quote(3, "2026-02-20T15:31:00Z", 99.0)));

        let current = cache.get(TickerId::new(1), Tier::Live).expect("cached");
        assert_eq!(current.id, RecordId::new(2));
    }

    #[test]
    fn tiers_are_cached_independently() {
        let cache = CurrentValueCache::new();
        cache.set_if_newer(quote(1, "2026-02-20T15:30:00Z", 100.0));

        assert!(cache.get(TickerId::new(1), Tier::Frequent).is_none());
        assert_eq!(cache.snapshot(Tier::Live).len(), 1);
        assert!(cache.snapshot(Tier::General).is_empty());
    }
}
