use std::ops::{Bound, RangeBounds};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tickstore_warehouse::WarehouseError;
use tracing::{debug, warn};

use crate::persistence::RecordSink;
use crate::{
    CurrentValueCache, IntegrityCoordinator, RecordId, StoreError, TickerId, Tier, TierPayload,
    TierRecord, UtcDateTime,
};

/// Append-only, strictly time-ordered records of one `(ticker, tier)`.
#[derive(Default)]
struct Series {
    records: RwLock<Vec<Arc<TierRecord>>>,
}

/// Per-ticker, per-tier historical series.
///
/// Every `(ticker, tier)` pair owns its own lock, so appends to different
/// tiers or tickers never contend. Within one pair the monotonic check, the
/// persistence call, the push and the cache update form one critical
/// section.
pub struct SeriesStore {
    series: DashMap<(TickerId, Tier), Arc<Series>>,
    cache: Arc<CurrentValueCache>,
    integrity: IntegrityCoordinator,
    sink: Option<Arc<dyn RecordSink>>,
    next_record_id: AtomicU64,
}

impl SeriesStore {
    pub fn new(integrity: IntegrityCoordinator, cache: Arc<CurrentValueCache>) -> Self {
        Self::with_sink(integrity, cache, None)
    }

    pub(crate) fn with_sink(
        integrity: IntegrityCoordinator,
        cache: Arc<CurrentValueCache>,
        sink: Option<Arc<dyn RecordSink>>,
    ) -> Self {
        Self {
            series: DashMap::new(),
            cache,
            integrity,
            sink,
            next_record_id: AtomicU64::new(1),
        }
    }

    pub fn cache(&self) -> &CurrentValueCache {
        &self.cache
    }

    /// Append an observation to the series of `payload`'s tier.
    ///
    /// Fails without touching history or the current value when the ticker
    /// is unknown, the payload is invalid, or `observed_at` is not strictly
    /// after the latest record of the series.
    pub fn append(
        &self,
        ticker: TickerId,
        observed_at: UtcDateTime,
        payload: TierPayload,
    ) -> Result<RecordId, StoreError> {
        if !self.integrity.verify_ticker_exists(ticker) {
            return Err(StoreError::UnknownTicker(ticker));
        }

        let tier = payload.tier();
        payload
            .validate()
            .map_err(|error| StoreError::invalid_payload(tier, error))?;
        observed_at
            .unix_nanos()
            .map_err(|error| StoreError::invalid_payload(tier, error))?;

        let series = self.series_for(ticker, tier);
        let mut records = series.records.write();

        if let Some(latest) = records.last() {
            if observed_at <= latest.observed_at {
                warn!(
                    ticker = %ticker,
                    tier = %tier,
                    latest = %latest.observed_at,
                    attempted = %observed_at,
                    "rejected out-of-order append"
                );
                return Err(StoreError::NonMonotonicTimestamp {
                    ticker,
                    tier,
                    latest: latest.observed_at,
                    attempted: observed_at,
                });
            }
        }

        let record = Arc::new(TierRecord {
            id: RecordId::new(self.next_record_id.fetch_add(1, Ordering::Relaxed)),
            ticker_id: ticker,
            observed_at,
            inserted_at: UtcDateTime::now(),
            payload,
        });

        if let Some(sink) = &self.sink {
            sink.persist_record(&record)?;
        }

        records.push(Arc::clone(&record));
        self.cache.set_if_newer(Arc::clone(&record));
        debug!(ticker = %ticker, tier = %tier, record = %record.id, "appended record");
        Ok(record.id)
    }

    /// Open a cursor over the records of `(ticker, tier)` whose timestamp
    /// falls in `range`, oldest first.
    ///
    /// The cursor covers the records present when it was opened; later
    /// appends are not observed.
    pub fn history(
        &self,
        ticker: TickerId,
        tier: Tier,
        range: impl RangeBounds<UtcDateTime>,
    ) -> HistoryCursor {
        let Some(series) = self.existing_series(ticker, tier) else {
            return HistoryCursor::empty();
        };

        let (next, end) = {
            let records = series.records.read();
            let start = match range.start_bound() {
                Bound::Included(from) => records.partition_point(|r| r.observed_at < *from),
                Bound::Excluded(from) => records.partition_point(|r| r.observed_at <= *from),
                Bound::Unbounded => 0,
            };
            let end = match range.end_bound() {
                Bound::Included(to) => records.partition_point(|r| r.observed_at <= *to),
                Bound::Excluded(to) => records.partition_point(|r| r.observed_at < *to),
                Bound::Unbounded => records.len(),
            };
            (start, end.max(start))
        };

        HistoryCursor {
            series: Some(series),
            next,
            end,
        }
    }

    /// Most recent record of `(ticker, tier)`, read from the series itself.
    pub fn latest(&self, ticker: TickerId, tier: Tier) -> Option<Arc<TierRecord>> {
        self.existing_series(ticker, tier)
            .and_then(|series| series.records.read().last().cloned())
    }

    /// Second most recent record of `(ticker, tier)`.
    pub fn previous(&self, ticker: TickerId, tier: Tier) -> Option<Arc<TierRecord>> {
        self.existing_series(ticker, tier).and_then(|series| {
            let records = series.records.read();
            records.len().checked_sub(2).map(|index| Arc::clone(&records[index]))
        })
    }

    pub fn len(&self, ticker: TickerId, tier: Tier) -> usize {
        self.existing_series(ticker, tier)
            .map_or(0, |series| series.records.read().len())
    }

    /// Reinstate a persisted record without writing it back.
    pub(crate) fn restore(&self, record: TierRecord) -> Result<(), StoreError> {
        if !self.integrity.verify_ticker_exists(record.ticker_id) {
            return Err(corrupt(format!(
                "record {} references unknown ticker {}",
                record.id, record.ticker_id
            )));
        }

        let series = self.series_for(record.ticker_id, record.tier());
        let mut records = series.records.write();
        if let Some(latest) = records.last() {
            if record.observed_at <= latest.observed_at {
                return Err(corrupt(format!(
                    "record {} is out of order for ticker {} ({})",
                    record.id,
                    record.ticker_id,
                    record.tier()
                )));
            }
        }

        self.next_record_id
            .fetch_max(record.id.get() + 1, Ordering::Relaxed);
        let record = Arc::new(record);
        records.push(Arc::clone(&record));
        self.cache.set_if_newer(record);
        Ok(())
    }

    fn series_for(&self, ticker: TickerId, tier: Tier) -> Arc<Series> {
        // Clone out of the map so the shard lock is released before the
        // series lock is taken.
        Arc::clone(self.series.entry((ticker, tier)).or_default().value())
    }

    fn existing_series(&self, ticker: TickerId, tier: Tier) -> Option<Arc<Series>> {
        self.series
            .get(&(ticker, tier))
            .map(|entry| Arc::clone(entry.value()))
    }
}

fn corrupt(message: String) -> StoreError {
    StoreError::Warehouse(WarehouseError::Corrupt(message))
}

/// Lazy, restartable view over a series range.
///
/// Cloning a cursor yields an independent cursor at the same position.
#[derive(Clone)]
pub struct HistoryCursor {
    series: Option<Arc<Series>>,
    next: usize,
    end: usize,
}

impl HistoryCursor {
    pub(crate) fn empty() -> Self {
        Self {
            series: None,
            next: 0,
            end: 0,
        }
    }
}

impl Iterator for HistoryCursor {
    type Item = Arc<TierRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let series = self.series.as_ref()?;
        let record = series.records.read().get(self.next).cloned();
        self.next += 1;
        record
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for HistoryCursor {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LiveQuote, TickerRegistry};

    fn store() -> (SeriesStore, TickerId) {
        let registry = Arc::new(TickerRegistry::new());
        let ticker = registry.resolve_or_create("AAPL").expect("register");
        let series = SeriesStore::new(
            IntegrityCoordinator::new(registry),
            Arc::new(CurrentValueCache::new()),
        );
        (series, ticker)
    }

    fn live(price: f64) -> TierPayload {
        TierPayload::Live(LiveQuote {
            price,
            change: None,
            percent_change: None,
        })
    }

    fn ts(value: &str) -> UtcDateTime {
        UtcDateTime::parse(value).expect("ts")
    }

    #[test]
    fn duplicate_timestamp_is_rejected() {
        let (series, ticker) = store();
        series
            .append(ticker, ts("2026-02-20T15:30:00Z"), live(150.0))
            .expect("first");

        let error = series
            .append(ticker, ts("2026-02-20T15:30:00Z"), live(151.0))
            .expect_err("duplicate");
        assert!(matches!(error, StoreError::NonMonotonicTimestamp { .. }));
        assert_eq!(series.len(ticker, Tier::Live), 1);
    }

    #[test]
    fn cursor_ignores_later_appends() {
        let (series, ticker) = store();
        series
            .append(ticker, ts("2026-02-20T15:30:00Z"), live(150.0))
            .expect("append");
        let cursor = series.history(ticker, Tier::Live, ..);
        series
            .append(ticker, ts("2026-02-20T15:31:00Z"), live(151.0))
            .expect("append");

        assert_eq!(cursor.len(), 1);
        assert_eq!(series.history(ticker, Tier::Live, ..).len(), 2);
    }

    #[test]
    fn range_bounds_are_honored() {
        let (series, ticker) = store();
        for (minute, price) in [(30, 150.0), (31, 151.0), (32, 152.0)] {
            series
                .append(ticker, ts(&format!("2026-02-20T15:{minute}:00Z")), live(price))
                .expect("append");
        }

        let from = ts("2026-02-20T15:31:00Z");
        let to = ts("2026-02-20T15:32:00Z");
        assert_eq!(series.history(ticker, Tier::Live, from..to).count(), 1);
        assert_eq!(series.history(ticker, Tier::Live, from..=to).count(), 2);
        assert_eq!(series.history(ticker, Tier::Live, to..from).count(), 0);
    }

    #[test]
    fn previous_is_second_most_recent() {
        let (series, ticker) = store();
        assert!(series.previous(ticker, Tier::Live).is_none());
        series
            .append(ticker, ts("2026-02-20T15:30:00Z"), live(150.0))
            .expect("append");
        assert!(series.previous(ticker, Tier::Live).is_none());
        series
            .append(ticker, ts("2026-02-20T15:31:00Z"), live(151.0))
            .expect("append");

        let previous = series.previous(ticker, Tier::Live).expect("previous");
        assert_eq!(previous.observed_at, ts("2026-02-20T15:30:00Z"));
    }

    #[test]
    fn unknown_ticker_is_rejected_before_validation() {
        let (series, _) = store();
        let error = series
            .append(TickerId::new(42), ts("2026-02-20T15:30:00Z"), live(-1.0))
            .expect_err("unknown");
        assert!(matches!(error, StoreError::UnknownTicker(_)));
    }
}
