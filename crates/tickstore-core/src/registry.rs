use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::persistence::RecordSink;
use crate::{StoreError, Symbol, Ticker, TickerId, UtcDateTime};

/// Symbol to surrogate id mapping. Ids are assigned once and never reused.
///
/// Lookups take the `state` read lock only. Creation is serialized by the
/// `next_id` guard, which is held while the new ticker is persisted; the
/// `state` write lock is taken afterwards, just long enough to publish it,
/// so readers never wait on storage I/O.
pub struct TickerRegistry {
    state: RwLock<RegistryState>,
    next_id: Mutex<u64>,
    sink: Option<Arc<dyn RecordSink>>,
}

#[derive(Default)]
struct RegistryState {
    by_symbol: HashMap<Symbol, TickerId>,
    by_id: HashMap<TickerId, Ticker>,
}

impl TickerRegistry {
    pub fn new() -> Self {
        Self::with_sink(None)
    }

    pub(crate) fn with_sink(sink: Option<Arc<dyn RecordSink>>) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            next_id: Mutex::new(1),
            sink,
        }
    }

    /// Resolve `raw` to its ticker id, registering the symbol on first sight.
    ///
    /// Symbols are trimmed and uppercased before lookup, so `aapl` and
    /// `AAPL ` resolve to the same id. Concurrent first sightings of one
    /// symbol all observe the same id.
    pub fn resolve_or_create(&self, raw: &str) -> Result<TickerId, StoreError> {
        self.resolve_or_create_named(raw, None)
    }

    /// Like [`resolve_or_create`](Self::resolve_or_create), recording a
    /// display name when the ticker is created. The name of an existing
    /// ticker is left as is.
    pub fn resolve_or_create_named(
        &self,
        raw: &str,
        name: Option<&str>,
    ) -> Result<TickerId, StoreError> {
        self.register(Symbol::from_input(raw)?, name)
    }

    /// Resolve an already validated symbol, creating its ticker if needed.
    pub fn register(&self, symbol: Symbol, name: Option<&str>) -> Result<TickerId, StoreError> {
        if let Some(id) = self.lookup(&symbol) {
            return Ok(id);
        }

        let mut next_id = self.next_id.lock();
        if let Some(id) = self.lookup(&symbol) {
            return Ok(id);
        }

        let ticker = Ticker {
            id: TickerId::new(*next_id),
            symbol: symbol.clone(),
            name: name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_owned),
            created_at: UtcDateTime::now(),
        };

        if let Some(sink) = &self.sink {
            sink.persist_ticker(&ticker)?;
        }

        let id = ticker.id;
        debug!(ticker = %id, symbol = %ticker.symbol, "registered ticker");
        *next_id += 1;
        let mut state = self.state.write();
        state.by_symbol.insert(symbol, id);
        state.by_id.insert(id, ticker);
        Ok(id)
    }

    pub fn lookup(&self, symbol: &Symbol) -> Option<TickerId> {
        self.state.read().by_symbol.get(symbol).copied()
    }

    pub fn lookup_by_id(&self, id: TickerId) -> Option<Ticker> {
        self.state.read().by_id.get(&id).cloned()
    }

    pub fn contains(&self, id: TickerId) -> bool {
        self.state.read().by_id.contains_key(&id)
    }

    /// All registered tickers, ordered by id.
    pub fn tickers(&self) -> Vec<Ticker> {
        let mut tickers = self.state.read().by_id.values().cloned().collect::<Vec<_>>();
        tickers.sort_by_key(|ticker| ticker.id);
        tickers
    }

    pub fn len(&self) -> usize {
        self.state.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reinstate a persisted ticker without writing it back.
    pub(crate) fn restore(&self, ticker: Ticker) -> Result<(), StoreError> {
        let mut next_id = self.next_id.lock();
        let mut state = self.state.write();
        if state.by_symbol.contains_key(&ticker.symbol) || state.by_id.contains_key(&ticker.id) {
            return Err(StoreError::Warehouse(
                tickstore_warehouse::WarehouseError::Corrupt(format!(
                    "ticker {} ({}) is registered twice",
                    ticker.id, ticker.symbol
                )),
            ));
        }

        *next_id = (*next_id).max(ticker.id.get() + 1);
        state.by_symbol.insert(ticker.symbol.clone(), ticker.id);
        state.by_id.insert(ticker.id, ticker);
        Ok(())
    }
}

impl Default for TickerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationError;

    #[test]
    fn normalizes_symbols_to_one_id() {
        let registry = TickerRegistry::new();
        let first = registry.resolve_or_create("AAPL").expect("register");
        let again = registry.resolve_or_create(" aapl ").expect("resolve");

        assert_eq!(first, again);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn assigns_distinct_increasing_ids() {
        let registry = TickerRegistry::new();
        let aapl = registry.resolve_or_create("AAPL").expect("register");
        let msft = registry.resolve_or_create("MSFT").expect("register");

        assert!(msft > aapl);
        let symbols = registry
            .tickers()
            .into_iter()
            .map(|ticker| ticker.symbol.to_string())
            .collect::<Vec<_>>();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn invalid_symbol_registers_nothing() {
        let registry = TickerRegistry::new();
        let error = registry.resolve_or_create("").expect_err("must fail");

        assert!(matches!(
            error,
            StoreError::InvalidSymbol(ValidationError::EmptySymbol)
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn name_is_kept_from_first_registration() {
        let registry = TickerRegistry::new();
        let id = registry
            .resolve_or_create_named("AAPL", Some("Apple Inc."))
            .expect("register");
        registry
            .resolve_or_create_named("AAPL", Some("Something else"))
            .expect("resolve");

        let ticker = registry.lookup_by_id(id).expect("ticker");
        assert_eq!(ticker.name.as_deref(), Some("Apple Inc."));
    }

    #[test]
    fn lookups_proceed_while_a_ticker_is_being_persisted() {
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        struct GatedSink {
            entered: Mutex<mpsc::Sender<()>>,
            release: Mutex<mpsc::Receiver<()>>,
        }

        impl RecordSink for GatedSink {
            fn persist_ticker(&self, _ticker: &Ticker) -> Result<(), StoreError> {
                self.entered.lock().send(()).expect("signal");
                self.release
                    .lock()
                    .recv_timeout(Duration::from_secs(5))
                    .expect("released");
                Ok(())
            }

            fn persist_record(&self, _record: &crate::TierRecord) -> Result<(), StoreError> {
                Ok(())
            }
        }

        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let registry = TickerRegistry::with_sink(Some(Arc::new(GatedSink {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        })));

        let id = thread::scope(|scope| {
            let writer = scope.spawn(|| registry.resolve_or_create("MSFT"));
            entered_rx
                .recv_timeout(Duration::from_secs(5))
                .expect("writer reached the sink");

            // The map lock is free while the sink runs; the ticker is not yet visible.
            assert!(registry.state.try_read().is_some());
            assert!(!registry.contains(TickerId::new(1)));
            assert!(registry.is_empty());

            release_tx.send(()).expect("release");
            writer.join().expect("thread").expect("register")
        });

        assert_eq!(id, TickerId::new(1));
        assert!(registry.contains(id));
    }

    #[test]
    fn restored_ids_are_not_reused() {
        let registry = TickerRegistry::new();
        registry
            .restore(Ticker {
                id: TickerId::new(7),
                symbol: Symbol::parse("IBM").expect("symbol"),
                name: None,
                created_at: UtcDateTime::now(),
            })
            .expect("restore");

        let next = registry.resolve_or_create("AAPL").expect("register");
        assert_eq!(next, TickerId::new(8));
    }
}
