//! # Tickstore Warehouse
//!
//! DuckDB-backed persistence for tickstore.
//!
//! ## Overview
//!
//! The warehouse is the storage collaborator behind the in-memory tier store.
//! It owns the physical schema and nothing else: ordering, validation and
//! identity assignment happen in `tickstore-core`, which hands the warehouse
//! fully formed rows.
//!
//! - **Referential integrity**: every tier table carries a `NOT NULL` foreign
//!   key to `tickers(id)`
//! - **Atomic appends**: a tier row, its child rows and the current-value
//!   pointer are written in one transaction
//! - **Parameterized SQL**: all values are bound, never interpolated
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tickstore_warehouse::{LiveColumns, TickerRow, TierColumns, TierRow, Warehouse};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open_default()?;
//!     warehouse.insert_ticker(&TickerRow {
//!         id: 1,
//!         symbol: "AAPL".to_string(),
//!         name: None,
//!         created_at_ns: 0,
//!     })?;
//!     warehouse.append(&TierRow {
//!         id: 1,
//!         ticker_id: 1,
//!         observed_at_ns: 1_000,
//!         inserted_at_ns: 1_000,
//!         columns: TierColumns::Live(LiveColumns {
//!             price: 150.0,
//!             change: None,
//!             percent_change: None,
//!         }),
//!     })?;
//!     Ok(())
//! }
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `tickers` | Ticker identity (append-only) |
//! | `live_data` | Live quotes |
//! | `frequent_data` | Periodic open/high/low/volume snapshots |
//! | `infrequent_data` | Daily valuation and analyst metrics |
//! | `recommendation_trend` | Analyst recommendation counts per infrequent row |
//! | `earnings_trend` | Expected earnings growth per period, per infrequent row |
//! | `index_trend` | Reference index ratios, at most one per infrequent row |
//! | `general_data` | Static company profile |
//! | `current_values` | Latest record pointer per (ticker, tier) |
//! | `ingest_log` | Ingestion audit log |
//!
//! ## Views
//!
//! | View | Description |
//! |------|-------------|
//! | `v_live_snapshot` | Latest live quote and previous price per ticker |
//! | `v_current_values` | Current-value pointers with symbols |

pub mod duckdb;
pub mod migrations;
pub mod views;

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::{Connection, ToSql};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

pub use duckdb::{DuckDbConnectionManager, PooledConnection};

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A persisted row could not be interpreted.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl WarehouseError {
    /// Whether `DuckDB` aborted the transaction because a concurrent
    /// transaction touched the same data. Constraint violations are not
    /// conflicts.
    pub fn is_write_conflict(&self) -> bool {
        let Self::DuckDb(error) = self else {
            return false;
        };
        let message = error.to_string().to_ascii_lowercase();
        message.contains("conflict") && !message.contains("constraint")
    }
}

/// Attempts made for one append before a write conflict is surfaced.
const APPEND_ATTEMPTS: u32 = 8;

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for tickstore data.
    pub home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept in the pool.
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self::at_home(resolve_tickstore_home())
    }
}

impl WarehouseConfig {
    /// Configuration rooted at `home`, with the database under `home/data`.
    pub fn at_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let db_path = home.join("data").join("tickstore.duckdb");
        Self {
            home,
            db_path,
            max_pool_size: 4,
        }
    }
}

/// A persisted ticker identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerRow {
    pub id: i64,
    pub symbol: String,
    pub name: Option<String>,
    pub created_at_ns: i64,
}

/// One row of a tier table.
#[derive(Debug, Clone, PartialEq)]
pub struct TierRow {
    pub id: i64,
    pub ticker_id: i64,
    pub observed_at_ns: i64,
    pub inserted_at_ns: i64,
    pub columns: TierColumns,
}

/// Tier-specific typed columns.
#[derive(Debug, Clone, PartialEq)]
pub enum TierColumns {
    Live(LiveColumns),
    Frequent(FrequentColumns),
    Infrequent(InfrequentColumns),
    General(GeneralColumns),
}

impl TierColumns {
    /// Tier label as stored in `current_values.tier`.
    pub fn tier_label(&self) -> &'static str {
        match self {
            Self::Live(_) => "live",
            Self::Frequent(_) => "frequent",
            Self::Infrequent(_) => "infrequent",
            Self::General(_) => "general",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveColumns {
    pub price: f64,
    pub change: Option<f64>,
    pub percent_change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrequentColumns {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub previous_close: Option<f64>,
    pub volume: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfrequentColumns {
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub analyst: Option<AnalystColumns>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalystColumns {
    pub recommendation: Option<String>,
    pub pe_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub next_quarter_growth: Option<f64>,
    pub trend: Vec<TrendColumns>,
    pub earnings: Vec<EarningsColumns>,
    pub index: Option<IndexTrendColumns>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendColumns {
    pub period: String,
    pub strong_buy: i32,
    pub buy: i32,
    pub hold: i32,
    pub sell: i32,
    pub strong_sell: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EarningsColumns {
    pub period: String,
    pub growth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexTrendColumns {
    pub pe_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneralColumns {
    pub long_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub full_time_employees: Option<i64>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
}

/// A row of the materialized current-value table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentValueRow {
    pub ticker_id: i64,
    pub tier: String,
    pub record_id: i64,
    pub observed_at_ns: i64,
}

/// One ingestion outcome for the audit log.
#[derive(Debug, Clone)]
pub struct IngestLogRow {
    pub request_id: String,
    pub symbol: Option<String>,
    pub source: String,
    pub tier: String,
    pub status: String,
    pub latency_us: Option<i64>,
}

/// Latest live quote per ticker, as exposed by `v_live_snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveSnapshotRow {
    pub symbol: String,
    pub price: f64,
    pub change: Option<f64>,
    pub percent_change: Option<f64>,
    pub observed_at: String,
    pub previous_price: Option<f64>,
}

/// The warehouse interface for ticker and tier persistence.
#[derive(Clone)]
pub struct Warehouse {
    config: WarehouseConfig,
    manager: DuckDbConnectionManager,
}

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open a warehouse with the specified configuration.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let manager = DuckDbConnectionManager::open(config.db_path.clone(), config.max_pool_size)?;
        let warehouse = Self { config, manager };
        warehouse.initialize()?;
        info!(db_path = %warehouse.db_path().display(), "warehouse opened");
        Ok(warehouse)
    }

    /// Initialize database schema and views.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        migrations::apply_migrations(&connection)?;
        views::create_views(&connection)?;
        Ok(())
    }

    /// Get the path to the database file.
    pub fn db_path(&self) -> &Path {
        self.manager.db_path()
    }

    /// Get the configuration the warehouse was opened with.
    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Persist a new ticker identity.
    pub fn insert_ticker(&self, row: &TickerRow) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        let params: [&dyn ToSql; 4] = [&row.id, &row.symbol, &row.name, &row.created_at_ns];
        connection.execute(
            "INSERT INTO tickers (id, symbol, name, created_at_ns) VALUES (?, ?, ?, ?)",
            params.as_slice(),
        )?;
        debug!(id = row.id, symbol = %row.symbol, "ticker persisted");
        Ok(())
    }

    /// Append a tier row and move the `(ticker, tier)` current-value pointer
    /// to it, in one transaction.
    ///
    /// A transaction aborted by a write conflict left nothing behind and is
    /// run again, up to `APPEND_ATTEMPTS` times in total. Every other error is
    /// returned as is.
    pub fn append(&self, row: &TierRow) -> Result<(), WarehouseError> {
        let mut attempt = 1;
        loop {
            match self.append_once(row) {
                Err(error) if error.is_write_conflict() && attempt < APPEND_ATTEMPTS => {
                    debug!(id = row.id, attempt, %error, "append hit a write conflict");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn append_once(&self, row: &TierRow) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<(), WarehouseError> {
            insert_tier_row(&connection, row)?;

            let tier = row.columns.tier_label();
            let params: [&dyn ToSql; 4] = [&row.ticker_id, &tier, &row.id, &row.observed_at_ns];
            connection.execute(
                "INSERT OR REPLACE INTO current_values \
                 (ticker_id, tier, record_id, observed_at_ns) VALUES (?, ?, ?, ?)",
                params.as_slice(),
            )?;
            Ok(())
        })();

        finalize_transaction(&connection, result)
    }

    /// Record ingestion outcomes in the audit log.
    pub fn log_ingest(&self, rows: &[IngestLogRow]) -> Result<(), WarehouseError> {
        if rows.is_empty() {
            return Ok(());
        }

        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<(), WarehouseError> {
            for row in rows {
                let params: [&dyn ToSql; 6] = [
                    &row.request_id,
                    &row.symbol,
                    &row.source,
                    &row.tier,
                    &row.status,
                    &row.latency_us,
                ];
                connection.execute(
                    "INSERT INTO ingest_log \
                     (request_id, symbol, source, tier, status, latency_us, logged_at) \
                     VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
                    params.as_slice(),
                )?;
            }
            Ok(())
        })();

        finalize_transaction(&connection, result)
    }

    /// Load every ticker in id order.
    pub fn load_tickers(&self) -> Result<Vec<TickerRow>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection
            .prepare("SELECT id, symbol, name, created_at_ns FROM tickers ORDER BY id")?;
        let rows = statement
            .query_map([], |row| {
                Ok(TickerRow {
                    id: row.get(0)?,
                    symbol: row.get(1)?,
                    name: row.get(2)?,
                    created_at_ns: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Load every tier row, grouped by tier and ordered by
    /// `(ticker_id, observed_at_ns)` within each tier.
    pub fn load_tier_rows(&self) -> Result<Vec<TierRow>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let mut rows = load_live_rows(&connection)?;
        rows.extend(load_frequent_rows(&connection)?);
        rows.extend(load_infrequent_rows(&connection)?);
        rows.extend(load_general_rows(&connection)?);
        Ok(rows)
    }

    /// Load the materialized current-value pointers.
    pub fn load_current_values(&self) -> Result<Vec<CurrentValueRow>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(
            "SELECT ticker_id, tier, record_id, observed_at_ns FROM current_values \
             ORDER BY ticker_id, tier",
        )?;
        let rows = statement
            .query_map([], |row| {
                Ok(CurrentValueRow {
                    ticker_id: row.get(0)?,
                    tier: row.get(1)?,
                    record_id: row.get(2)?,
                    observed_at_ns: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Latest live quote and previous price for every ticker, ordered by symbol.
    pub fn live_snapshot(&self) -> Result<Vec<LiveSnapshotRow>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(
            "SELECT symbol, price, change, percent_change, CAST(observed_at AS VARCHAR), \
             previous_price FROM v_live_snapshot ORDER BY symbol",
        )?;
        let rows = statement
            .query_map([], |row| {
                Ok(LiveSnapshotRow {
                    symbol: row.get(0)?,
                    price: row.get(1)?,
                    change: row.get(2)?,
                    percent_change: row.get(3)?,
                    observed_at: row.get(4)?,
                    previous_price: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Number of audit log entries recorded under `request_id`.
    pub fn ingest_log_count(&self, request_id: &str) -> Result<i64, WarehouseError> {
        let connection = self.manager.acquire()?;
        let count = connection.query_row(
            "SELECT COUNT(*) FROM ingest_log WHERE request_id = ?",
            [request_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// Finalize a transaction, committing on success or rolling back on failure.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

fn insert_tier_row(connection: &Connection, row: &TierRow) -> Result<(), WarehouseError> {
    match &row.columns {
        TierColumns::Live(live) => {
            let params: [&dyn ToSql; 7] = [
                &row.id,
                &row.ticker_id,
                &live.price,
                &live.change,
                &live.percent_change,
                &row.observed_at_ns,
                &row.inserted_at_ns,
            ];
            connection.execute(
                "INSERT INTO live_data \
                 (id, ticker_id, price, change, percent_change, observed_at_ns, inserted_at_ns) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params.as_slice(),
            )?;
        }
        TierColumns::Frequent(frequent) => {
            let params: [&dyn ToSql; 9] = [
                &row.id,
                &row.ticker_id,
                &frequent.open,
                &frequent.high,
                &frequent.low,
                &frequent.previous_close,
                &frequent.volume,
                &row.observed_at_ns,
                &row.inserted_at_ns,
            ];
            connection.execute(
                "INSERT INTO frequent_data \
                 (id, ticker_id, open, high, low, previous_close, volume, observed_at_ns, inserted_at_ns) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params.as_slice(),
            )?;
        }
        TierColumns::Infrequent(infrequent) => {
            let analyst = infrequent.analyst.as_ref();
            let has_analyst = analyst.is_some();
            let recommendation = analyst.and_then(|a| a.recommendation.clone());
            let pe_ratio = analyst.and_then(|a| a.pe_ratio);
            let peg_ratio = analyst.and_then(|a| a.peg_ratio);
            let next_quarter_growth = analyst.and_then(|a| a.next_quarter_growth);
            let params: [&dyn ToSql; 13] = [
                &row.id,
                &row.ticker_id,
                &infrequent.market_cap,
                &infrequent.trailing_pe,
                &infrequent.forward_pe,
                &infrequent.dividend_yield,
                &has_analyst,
                &recommendation,
                &pe_ratio,
                &peg_ratio,
                &next_quarter_growth,
                &row.observed_at_ns,
                &row.inserted_at_ns,
            ];
            connection.execute(
                "INSERT INTO infrequent_data \
                 (id, ticker_id, market_cap, trailing_pe, forward_pe, dividend_yield, has_analyst, \
                  recommendation, pe_ratio, peg_ratio, next_quarter_growth, observed_at_ns, \
                  inserted_at_ns) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params.as_slice(),
            )?;

            if let Some(analyst) = analyst {
                insert_analysis_children(connection, row.id, analyst)?;
            }
        }
        TierColumns::General(general) => {
            let params: [&dyn ToSql; 11] = [
                &row.id,
                &row.ticker_id,
                &general.long_name,
                &general.sector,
                &general.industry,
                &general.full_time_employees,
                &general.country,
                &general.website,
                &general.description,
                &row.observed_at_ns,
                &row.inserted_at_ns,
            ];
            connection.execute(
                "INSERT INTO general_data \
                 (id, ticker_id, long_name, sector, industry, full_time_employees, country, \
                  website, description, observed_at_ns, inserted_at_ns) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params.as_slice(),
            )?;
        }
    }

    Ok(())
}

/// Write the child rows of an analyst block. `position` keeps list order.
fn insert_analysis_children(
    connection: &Connection,
    infrequent_id: i64,
    analyst: &AnalystColumns,
) -> Result<(), WarehouseError> {
    for (position, trend) in analyst.trend.iter().enumerate() {
        let position = list_position(position)?;
        let params: [&dyn ToSql; 8] = [
            &infrequent_id,
            &position,
            &trend.period,
            &trend.strong_buy,
            &trend.buy,
            &trend.hold,
            &trend.sell,
            &trend.strong_sell,
        ];
        connection.execute(
            "INSERT INTO recommendation_trend \
             (infrequent_id, position, period, strong_buy, buy, hold, sell, strong_sell) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params.as_slice(),
        )?;
    }

    for (position, earnings) in analyst.earnings.iter().enumerate() {
        let position = list_position(position)?;
        let params: [&dyn ToSql; 4] = [&infrequent_id, &position, &earnings.period, &earnings.growth];
        connection.execute(
            "INSERT INTO earnings_trend (infrequent_id, position, period, growth) \
             VALUES (?, ?, ?, ?)",
            params.as_slice(),
        )?;
    }

    if let Some(index) = &analyst.index {
        let params: [&dyn ToSql; 3] = [&infrequent_id, &index.pe_ratio, &index.peg_ratio];
        connection.execute(
            "INSERT INTO index_trend (infrequent_id, pe_ratio, peg_ratio) VALUES (?, ?, ?)",
            params.as_slice(),
        )?;
    }

    Ok(())
}

fn list_position(position: usize) -> Result<i32, WarehouseError> {
    i32::try_from(position)
        .map_err(|_| WarehouseError::Corrupt(format!("list position {position} exceeds INTEGER")))
}

fn load_live_rows(connection: &Connection) -> Result<Vec<TierRow>, WarehouseError> {
    let mut statement = connection.prepare(
        "SELECT id, ticker_id, observed_at_ns, inserted_at_ns, price, change, percent_change \
         FROM live_data ORDER BY ticker_id, observed_at_ns",
    )?;
    let rows = statement
        .query_map([], |row| {
            Ok(TierRow {
                id: row.get(0)?,
                ticker_id: row.get(1)?,
                observed_at_ns: row.get(2)?,
                inserted_at_ns: row.get(3)?,
                columns: TierColumns::Live(LiveColumns {
                    price: row.get(4)?,
                    change: row.get(5)?,
                    percent_change: row.get(6)?,
                }),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn load_frequent_rows(connection: &Connection) -> Result<Vec<TierRow>, WarehouseError> {
    let mut statement = connection.prepare(
        "SELECT id, ticker_id, observed_at_ns, inserted_at_ns, open, high, low, previous_close, \
         volume FROM frequent_data ORDER BY ticker_id, observed_at_ns",
    )?;
    let rows = statement
        .query_map([], |row| {
            Ok(TierRow {
                id: row.get(0)?,
                ticker_id: row.get(1)?,
                observed_at_ns: row.get(2)?,
                inserted_at_ns: row.get(3)?,
                columns: TierColumns::Frequent(FrequentColumns {
                    open: row.get(4)?,
                    high: row.get(5)?,
                    low: row.get(6)?,
                    previous_close: row.get(7)?,
                    volume: row.get(8)?,
                }),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn load_infrequent_rows(connection: &Connection) -> Result<Vec<TierRow>, WarehouseError> {
    let mut trends: HashMap<i64, Vec<TrendColumns>> = HashMap::new();
    {
        let mut statement = connection.prepare(
            "SELECT infrequent_id, period, strong_buy, buy, hold, sell, strong_sell \
             FROM recommendation_trend ORDER BY infrequent_id, position",
        )?;
        let mut cursor = statement.query([])?;
        while let Some(row) = cursor.next()? {
            let infrequent_id: i64 = row.get(0)?;
            trends.entry(infrequent_id).or_default().push(TrendColumns {
                period: row.get(1)?,
                strong_buy: row.get(2)?,
                buy: row.get(3)?,
                hold: row.get(4)?,
                sell: row.get(5)?,
                strong_sell: row.get(6)?,
            });
        }
    }

    let mut earnings: HashMap<i64, Vec<EarningsColumns>> = HashMap::new();
    {
        let mut statement = connection.prepare(
            "SELECT infrequent_id, period, growth FROM earnings_trend \
             ORDER BY infrequent_id, position",
        )?;
        let mut cursor = statement.query([])?;
        while let Some(row) = cursor.next()? {
            let infrequent_id: i64 = row.get(0)?;
            earnings.entry(infrequent_id).or_default().push(EarningsColumns {
                period: row.get(1)?,
                growth: row.get(2)?,
            });
        }
    }

    let mut indexes: HashMap<i64, IndexTrendColumns> = HashMap::new();
    {
        let mut statement =
            connection.prepare("SELECT infrequent_id, pe_ratio, peg_ratio FROM index_trend")?;
        let mut cursor = statement.query([])?;
        while let Some(row) = cursor.next()? {
            indexes.insert(
                row.get(0)?,
                IndexTrendColumns {
                    pe_ratio: row.get(1)?,
                    peg_ratio: row.get(2)?,
                },
            );
        }
    }

    let mut statement = connection.prepare(
        "SELECT id, ticker_id, observed_at_ns, inserted_at_ns, market_cap, trailing_pe, \
         forward_pe, dividend_yield, has_analyst, recommendation, pe_ratio, peg_ratio, \
         next_quarter_growth FROM infrequent_data ORDER BY ticker_id, observed_at_ns",
    )?;
    let mut cursor = statement.query([])?;
    let mut rows = Vec::new();
    while let Some(row) = cursor.next()? {
        let id: i64 = row.get(0)?;
        let has_analyst: bool = row.get(8)?;
        let analyst = if has_analyst {
            Some(AnalystColumns {
                recommendation: row.get(9)?,
                pe_ratio: row.get(10)?,
                peg_ratio: row.get(11)?,
                next_quarter_growth: row.get(12)?,
                trend: trends.remove(&id).unwrap_or_default(),
                earnings: earnings.remove(&id).unwrap_or_default(),
                index: indexes.remove(&id),
            })
        } else {
            None
        };
        rows.push(TierRow {
            id,
            ticker_id: row.get(1)?,
            observed_at_ns: row.get(2)?,
            inserted_at_ns: row.get(3)?,
            columns: TierColumns::Infrequent(InfrequentColumns {
                market_cap: row.get(4)?,
                trailing_pe: row.get(5)?,
                forward_pe: row.get(6)?,
                dividend_yield: row.get(7)?,
                analyst,
            }),
        });
    }

    let orphans = [
        ("recommendation_trend", trends.keys().next()),
        ("earnings_trend", earnings.keys().next()),
        ("index_trend", indexes.keys().next()),
    ];
    if let Some((table, Some(orphan))) = orphans.into_iter().find(|(_, orphan)| orphan.is_some()) {
        return Err(WarehouseError::Corrupt(format!(
            "{table} rows reference infrequent row {orphan} without analyst data"
        )));
    }

    Ok(rows)
}

fn load_general_rows(connection: &Connection) -> Result<Vec<TierRow>, WarehouseError> {
    let mut statement = connection.prepare(
        "SELECT id, ticker_id, observed_at_ns, inserted_at_ns, long_name, sector, industry, \
         full_time_employees, country, website, description \
         FROM general_data ORDER BY ticker_id, observed_at_ns",
    )?;
    let rows = statement
        .query_map([], |row| {
            Ok(TierRow {
                id: row.get(0)?,
                ticker_id: row.get(1)?,
                observed_at_ns: row.get(2)?,
                inserted_at_ns: row.get(3)?,
                columns: TierColumns::General(GeneralColumns {
                    long_name: row.get(4)?,
                    sector: row.get(5)?,
                    industry: row.get(6)?,
                    full_time_employees: row.get(7)?,
                    country: row.get(8)?,
                    website: row.get(9)?,
                    description: row.get(10)?,
                }),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Resolve the tickstore home directory from environment or default.
fn resolve_tickstore_home() -> PathBuf {
    if let Some(path) = env::var_os("TICKSTORE_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".tickstore");
    }

    PathBuf::from(".tickstore")
}
