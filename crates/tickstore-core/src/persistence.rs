//! Persistence seam between the in-memory store and a storage backend.
//!
//! The store calls a [`RecordSink`] while it still holds the lock for the
//! affected ticker or series, and only publishes the new state in memory
//! once the sink succeeded. A failing sink therefore leaves memory
//! untouched.

use tickstore_warehouse::{
    AnalystColumns, EarningsColumns, FrequentColumns, GeneralColumns, IndexTrendColumns,
    InfrequentColumns, IngestLogRow, LiveColumns, TickerRow, TierColumns, TierRow, TrendColumns,
    Warehouse, WarehouseError,
};

use crate::{
    AnalystMetrics, CompanyProfile, DailyMetrics, EarningsTrend, IndexTrend, IngestReport,
    LiveQuote, PeriodSnapshot, RecommendationTrend, RecordId, StoreError, Symbol, Ticker, TickerId,
    Tier, TierPayload, TierRecord, UtcDateTime, ValidationError,
};

/// Storage collaborator that makes registry and series mutations durable.
pub trait RecordSink: Send + Sync {
    /// Persist a newly created ticker.
    fn persist_ticker(&self, ticker: &Ticker) -> Result<(), StoreError>;

    /// Persist an appended record and move the `(ticker, tier)` current-value
    /// pointer to it, atomically.
    fn persist_record(&self, record: &TierRecord) -> Result<(), StoreError>;

    /// Record the outcomes of an ingestion batch.
    fn record_batch(&self, _report: &IngestReport) -> Result<(), StoreError> {
        Ok(())
    }
}

impl RecordSink for Warehouse {
    fn persist_ticker(&self, ticker: &Ticker) -> Result<(), StoreError> {
        self.insert_ticker(&ticker_to_row(ticker)?)?;
        Ok(())
    }

    fn persist_record(&self, record: &TierRecord) -> Result<(), StoreError> {
        self.append(&record_to_row(record)?)?;
        Ok(())
    }

    fn record_batch(&self, report: &IngestReport) -> Result<(), StoreError> {
        let rows = report
            .outcomes
            .iter()
            .map(|outcome| IngestLogRow {
                request_id: report.request_id.to_string(),
                symbol: Some(outcome.symbol.clone()),
                source: report.source.clone(),
                tier: outcome.tier.as_str().to_string(),
                status: outcome.status.clone(),
                latency_us: i64::try_from(outcome.latency_us).ok(),
            })
            .collect::<Vec<_>>();
        self.log_ingest(&rows)?;
        Ok(())
    }
}

pub(crate) fn ticker_to_row(ticker: &Ticker) -> Result<TickerRow, StoreError> {
    Ok(TickerRow {
        id: id_to_i64(ticker.id.get())?,
        symbol: ticker.symbol.to_string(),
        name: ticker.name.clone(),
        created_at_ns: nanos(ticker.created_at)?,
    })
}

pub(crate) fn ticker_from_row(row: TickerRow) -> Result<Ticker, WarehouseError> {
    let symbol = Symbol::parse(&row.symbol)
        .map_err(|error| corrupt(format!("ticker {}: {error}", row.id)))?;
    Ok(Ticker {
        id: TickerId::new(id_from_i64(row.id)?),
        symbol,
        name: row.name,
        created_at: timestamp_from_nanos(row.created_at_ns)?,
    })
}

pub(crate) fn record_to_row(record: &TierRecord) -> Result<TierRow, StoreError> {
    let tier = record.tier();
    let columns = match &record.payload {
        TierPayload::Live(quote) => TierColumns::Live(LiveColumns {
            price: quote.price,
            change: quote.change,
            percent_change: quote.percent_change,
        }),
        TierPayload::Frequent(period) => TierColumns::Frequent(FrequentColumns {
            open: period.open,
            high: period.high,
            low: period.low,
            previous_close: period.previous_close,
            volume: period
                .volume
                .map(|volume| bigint(tier, "volume", volume))
                .transpose()?,
        }),
        TierPayload::Infrequent(metrics) => TierColumns::Infrequent(InfrequentColumns {
            market_cap: metrics.market_cap,
            trailing_pe: metrics.trailing_pe,
            forward_pe: metrics.forward_pe,
            dividend_yield: metrics.dividend_yield,
            analyst: metrics
                .analyst
                .as_ref()
                .map(|analyst| analyst_to_columns(tier, analyst))
                .transpose()?,
        }),
        TierPayload::General(profile) => TierColumns::General(GeneralColumns {
            long_name: profile.long_name.clone(),
            sector: profile.sector.clone(),
            industry: profile.industry.clone(),
            full_time_employees: profile
                .full_time_employees
                .map(|count| bigint(tier, "full_time_employees", count))
                .transpose()?,
            country: profile.country.clone(),
            website: profile.website.clone(),
            description: profile.description.clone(),
        }),
    };

    Ok(TierRow {
        id: id_to_i64(record.id.get())?,
        ticker_id: id_to_i64(record.ticker_id.get())?,
        observed_at_ns: nanos(record.observed_at)?,
        inserted_at_ns: nanos(record.inserted_at)?,
        columns,
    })
}

pub(crate) fn record_from_row(row: TierRow) -> Result<TierRecord, WarehouseError> {
    let payload = match row.columns {
        TierColumns::Live(live) => TierPayload::Live(LiveQuote {
            price: live.price,
            change: live.change,
            percent_change: live.percent_change,
        }),
        TierColumns::Frequent(frequent) => TierPayload::Frequent(PeriodSnapshot {
            open: frequent.open,
            high: frequent.high,
            low: frequent.low,
            previous_close: frequent.previous_close,
            volume: frequent.volume.map(u64::try_from).transpose().map_err(|_| {
                corrupt(format!("frequent row {} has a negative volume", row.id))
            })?,
        }),
        TierColumns::Infrequent(metrics) => TierPayload::Infrequent(DailyMetrics {
            market_cap: metrics.market_cap,
            trailing_pe: metrics.trailing_pe,
            forward_pe: metrics.forward_pe,
            dividend_yield: metrics.dividend_yield,
            analyst: metrics
                .analyst
                .map(|analyst| analyst_from_columns(row.id, analyst))
                .transpose()?,
        }),
        TierColumns::General(general) => TierPayload::General(CompanyProfile {
            long_name: general.long_name,
            sector: general.sector,
            industry: general.industry,
            full_time_employees: general
                .full_time_employees
                .map(u64::try_from)
                .transpose()
                .map_err(|_| corrupt(format!("general row {} has a negative headcount", row.id)))?,
            country: general.country,
            website: general.website,
            description: general.description,
        }),
    };

    Ok(TierRecord {
        id: RecordId::new(id_from_i64(row.id)?),
        ticker_id: TickerId::new(id_from_i64(row.ticker_id)?),
        observed_at: timestamp_from_nanos(row.observed_at_ns)?,
        inserted_at: timestamp_from_nanos(row.inserted_at_ns)?,
        payload,
    })
}

fn analyst_to_columns(tier: Tier, analyst: &AnalystMetrics) -> Result<AnalystColumns, StoreError> {
    let count = |value: u32| {
        i32::try_from(value).map_err(|_| {
            StoreError::invalid_payload(
                tier,
                ValidationError::ValueOutOfRange {
                    field: "recommendation_trend",
                },
            )
        })
    };

    let mut trend = Vec::with_capacity(analyst.recommendation_trend.len());
    for counts in &analyst.recommendation_trend {
        trend.push(TrendColumns {
            period: counts.period.clone(),
            strong_buy: count(counts.strong_buy)?,
            buy: count(counts.buy)?,
            hold: count(counts.hold)?,
            sell: count(counts.sell)?,
            strong_sell: count(counts.strong_sell)?,
        });
    }

    Ok(AnalystColumns {
        recommendation: analyst.recommendation.clone(),
        pe_ratio: analyst.pe_ratio,
        peg_ratio: analyst.peg_ratio,
        next_quarter_growth: analyst.next_quarter_growth,
        trend,
        earnings: analyst
            .earnings_trend
            .iter()
            .map(|earnings| EarningsColumns {
                period: earnings.period.clone(),
                growth: earnings.growth,
            })
            .collect(),
        index: analyst.index_trend.as_ref().map(|index| IndexTrendColumns {
            pe_ratio: index.pe_ratio,
            peg_ratio: index.peg_ratio,
        }),
    })
}

fn analyst_from_columns(
    row_id: i64,
    analyst: AnalystColumns,
) -> Result<AnalystMetrics, WarehouseError> {
    let count = |value: i32| {
        u32::try_from(value)
            .map_err(|_| corrupt(format!("infrequent row {row_id} has a negative trend count")))
    };

    let mut trend = Vec::with_capacity(analyst.trend.len());
    for columns in analyst.trend {
        trend.push(RecommendationTrend {
            period: columns.period,
            strong_buy: count(columns.strong_buy)?,
            buy: count(columns.buy)?,
            hold: count(columns.hold)?,
            sell: count(columns.sell)?,
            strong_sell: count(columns.strong_sell)?,
        });
    }

    Ok(AnalystMetrics {
        recommendation: analyst.recommendation,
        pe_ratio: analyst.pe_ratio,
        peg_ratio: analyst.peg_ratio,
        next_quarter_growth: analyst.next_quarter_growth,
        recommendation_trend: trend,
        earnings_trend: analyst
            .earnings
            .into_iter()
            .map(|earnings| EarningsTrend {
                period: earnings.period,
                growth: earnings.growth,
            })
            .collect(),
        index_trend: analyst.index.map(|index| IndexTrend {
            pe_ratio: index.pe_ratio,
            peg_ratio: index.peg_ratio,
        }),
    })
}

fn bigint(tier: Tier, field: &'static str, value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| {
        StoreError::invalid_payload(tier, ValidationError::ValueOutOfRange { field })
    })
}

fn nanos(value: UtcDateTime) -> Result<i64, StoreError> {
    value
        .unix_nanos()
        .map_err(|error| StoreError::Warehouse(corrupt(error.to_string())))
}

fn timestamp_from_nanos(value: i64) -> Result<UtcDateTime, WarehouseError> {
    UtcDateTime::from_unix_nanos(value).map_err(|error| corrupt(error.to_string()))
}

fn id_to_i64(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value)
        .map_err(|_| StoreError::Warehouse(corrupt(format!("id {value} exceeds BIGINT"))))
}

fn id_from_i64(value: i64) -> Result<u64, WarehouseError> {
    u64::try_from(value)
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| corrupt(format!("invalid surrogate id {value}")))
}

fn corrupt(message: String) -> WarehouseError {
    WarehouseError::Corrupt(message)
}
