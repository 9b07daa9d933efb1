use std::ops::RangeBounds;
use std::str::FromStr;
use std::sync::Arc;

use tickstore_warehouse::{Warehouse, WarehouseConfig, WarehouseError};
use tracing::{info, warn};

use crate::persistence::{record_from_row, ticker_from_row, RecordSink};
use crate::{
    CurrentValueCache, HistoryCursor, IntegrityCoordinator, RecordId, SeriesStore, StoreError,
    Symbol, Ticker, TickerId, TickerRegistry, Tier, TierPayload, TierRecord, UtcDateTime,
};

/// The assembled store: registry, tiered series and current-value cache,
/// optionally backed by a DuckDB warehouse.
pub struct TickStore {
    registry: Arc<TickerRegistry>,
    series: SeriesStore,
    sink: Option<Arc<dyn RecordSink>>,
    warehouse: Option<Warehouse>,
}

impl TickStore {
    /// A store that keeps everything in memory.
    pub fn in_memory() -> Self {
        Self::assemble(None, None)
    }

    /// A store that persists every mutation through `sink` before applying
    /// it in memory.
    pub fn with_sink(sink: Arc<dyn RecordSink>) -> Self {
        Self::assemble(Some(sink), None)
    }

    /// Open the warehouse at `config` and rebuild the in-memory state from
    /// it.
    ///
    /// Fails if any persisted row cannot be reinstated. Current-value
    /// pointers are recomputed from history; disagreeing persisted pointers
    /// are logged.
    pub fn open(config: WarehouseConfig) -> Result<Self, StoreError> {
        let warehouse = Warehouse::open(config)?;
        let sink: Arc<dyn RecordSink> = Arc::new(warehouse.clone());
        let store = Self::assemble(Some(sink), Some(warehouse.clone()));

        for row in warehouse.load_tickers()? {
            store.registry.restore(ticker_from_row(row)?)?;
        }

        let mut records = 0usize;
        for row in warehouse.load_tier_rows()? {
            store.series.restore(record_from_row(row)?)?;
            records += 1;
        }

        store.check_current_values(&warehouse)?;
        info!(
            db_path = %warehouse.db_path().display(),
            tickers = store.registry.len(),
            records,
            "tick store rehydrated"
        );
        Ok(store)
    }

    fn assemble(sink: Option<Arc<dyn RecordSink>>, warehouse: Option<Warehouse>) -> Self {
        let registry = Arc::new(TickerRegistry::with_sink(sink.clone()));
        let series = SeriesStore::with_sink(
            IntegrityCoordinator::new(Arc::clone(&registry)),
            Arc::new(CurrentValueCache::new()),
            sink.clone(),
        );
        Self {
            registry,
            series,
            sink,
            warehouse,
        }
    }

    fn check_current_values(&self, warehouse: &Warehouse) -> Result<(), StoreError> {
        let persisted = warehouse.load_current_values()?;
        for row in &persisted {
            let tier = Tier::from_str(&row.tier).map_err(|error| {
                WarehouseError::Corrupt(format!("current value of ticker {}: {error}", row.ticker_id))
            })?;
            let ticker = u64::try_from(row.ticker_id).map(TickerId::new).map_err(|_| {
                WarehouseError::Corrupt(format!("invalid ticker id {}", row.ticker_id))
            })?;

            let cached = self.cache().get(ticker, tier).map(|record| record.id.get());
            if cached.and_then(|id| i64::try_from(id).ok()) != Some(row.record_id) {
                warn!(
                    ticker = %ticker,
                    tier = %tier,
                    persisted = row.record_id,
                    derived = ?cached,
                    "persisted current value disagrees with history"
                );
            }
        }

        if persisted.len() != self.cache().len() {
            warn!(
                persisted = persisted.len(),
                derived = self.cache().len(),
                "current value pointers missing from warehouse"
            );
        }
        Ok(())
    }

    pub fn registry(&self) -> &TickerRegistry {
        &self.registry
    }

    pub fn series(&self) -> &SeriesStore {
        &self.series
    }

    pub fn cache(&self) -> &CurrentValueCache {
        self.series.cache()
    }

    /// The backing warehouse, if the store was opened from one.
    pub fn warehouse(&self) -> Option<&Warehouse> {
        self.warehouse.as_ref()
    }

    pub(crate) fn sink(&self) -> Option<&Arc<dyn RecordSink>> {
        self.sink.as_ref()
    }

    pub fn resolve_or_create(&self, symbol: &str) -> Result<TickerId, StoreError> {
        self.registry.resolve_or_create(symbol)
    }

    pub fn append(
        &self,
        ticker: TickerId,
        observed_at: UtcDateTime,
        payload: TierPayload,
    ) -> Result<RecordId, StoreError> {
        self.series.append(ticker, observed_at, payload)
    }

    /// Look up a registered ticker by symbol.
    pub fn resolve(&self, symbol: &str) -> Result<Ticker, StoreError> {
        let symbol = Symbol::from_input(symbol)?;
        self.registry
            .lookup(&symbol)
            .and_then(|id| self.registry.lookup_by_id(id))
            .ok_or_else(|| StoreError::NotFound(format!("ticker {symbol}")))
    }

    /// Current value of `(symbol, tier)`, served from the cache.
    pub fn latest(&self, symbol: &str, tier: Tier) -> Result<Option<Arc<TierRecord>>, StoreError> {
        Ok(self
            .lookup(symbol)?
            .and_then(|ticker| self.cache().get(ticker, tier)))
    }

    /// The record the current value replaced, if any.
    pub fn previous(
        &self,
        symbol: &str,
        tier: Tier,
    ) -> Result<Option<Arc<TierRecord>>, StoreError> {
        Ok(self
            .lookup(symbol)?
            .and_then(|ticker| self.series.previous(ticker, tier)))
    }

    /// History of `(symbol, tier)` within `range`. Unknown symbols yield an
    /// empty cursor.
    pub fn history(
        &self,
        symbol: &str,
        tier: Tier,
        range: impl RangeBounds<UtcDateTime>,
    ) -> Result<HistoryCursor, StoreError> {
        Ok(match self.lookup(symbol)? {
            Some(ticker) => self.series.history(ticker, tier, range),
            None => HistoryCursor::empty(),
        })
    }

    fn lookup(&self, symbol: &str) -> Result<Option<TickerId>, StoreError> {
        let symbol = Symbol::from_input(symbol)?;
        Ok(self.registry.lookup(&symbol))
    }
}
