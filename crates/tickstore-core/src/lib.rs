//! # Tickstore Core
//!
//! Ticker registry, tiered time-series store and current-value cache for
//! stock-market observations.
//!
//! ## Overview
//!
//! Each ticker owns four independent series, one per update-frequency
//! [`Tier`]:
//!
//! - **Live** quotes (price and change)
//! - **Frequent** period snapshots (open/high/low/volume)
//! - **Infrequent** daily valuation and analyst metrics
//! - **General** company profile
//!
//! Appends are strictly time-ordered per `(ticker, tier)`. The latest record
//! of every pair is mirrored in the [`CurrentValueCache`] as part of the same
//! append, so `latest` reads never scan history.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Current value per `(ticker, tier)` |
//! | [`domain`] | Domain models (Symbol, Tier, payloads, records) |
//! | [`error`] | Validation and store error types |
//! | [`ingest`] | Single-tuple and batch ingestion |
//! | [`integrity`] | Ticker reference checks |
//! | [`persistence`] | Storage seam and warehouse mapping |
//! | [`registry`] | Symbol to ticker id registry |
//! | [`series`] | Append-only tier series and history cursors |
//! | [`store`] | The assembled [`TickStore`] |
//!
//! ## Quick Start
//!
//! ```rust
//! use tickstore_core::{LiveQuote, TickStore, Tier, TierPayload, UtcDateTime};
//!
//! let store = TickStore::in_memory();
//! let aapl = store.resolve_or_create("AAPL")?;
//! store.append(
//!     aapl,
//!     UtcDateTime::parse("2026-02-20T15:30:00Z")?,
//!     TierPayload::Live(LiveQuote { price: 150.0, change: None, percent_change: None }),
//! )?;
//!
//! let latest = store.latest("AAPL", Tier::Live)?.expect("just appended");
//! assert_eq!(latest.observed_at.to_string(), "2026-02-20T15:30:00Z");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Every mutation fails closed: a rejected append leaves history, the cache
//! and the warehouse unchanged. [`StoreError::kind`] gives a stable label
//! for each failure class.

pub mod cache;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod integrity;
pub mod persistence;
pub mod registry;
pub mod series;
pub mod store;

// Domain models
pub use domain::{
    AnalystMetrics, CompanyProfile, DailyMetrics, EarningsTrend, IndexTrend, LiveQuote,
    PeriodSnapshot, RecommendationTrend, RecordId, Symbol, Ticker, TickerId, Tier, TierPayload,
    TierRecord, UtcDateTime, MAX_SYMBOL_LEN,
};

// Error types
pub use error::{StoreError, ValidationError};

// Store components
pub use cache::CurrentValueCache;
pub use integrity::IntegrityCoordinator;
pub use registry::TickerRegistry;
pub use series::{HistoryCursor, SeriesStore};
pub use store::TickStore;

// Ingestion
pub use ingest::{IngestOutcome, IngestReport, IngestTuple, RequestId, STATUS_ACCEPTED};

// Persistence
pub use persistence::RecordSink;

// Warehouse (re-exported from tickstore-warehouse)
pub use tickstore_warehouse::{LiveSnapshotRow, Warehouse, WarehouseConfig, WarehouseError};
