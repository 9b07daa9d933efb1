//! # Domain Models
//!
//! Canonical domain types for the tier store.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated, uppercase ticker symbol |
//! | [`UtcDateTime`] | UTC timestamp with nanosecond precision |
//! | [`Tier`] | Update-frequency tier |
//! | [`TickerId`] / [`RecordId`] | Surrogate identifiers |
//! | [`Ticker`] | Registered ticker identity |
//! | [`TierPayload`] | Tagged per-tier payload |
//! | [`TierRecord`] | Immutable observation in a tier series |
//!
//! All types validate their invariants at construction; a [`TierRecord`] is
//! only ever built by the series store after its payload passed
//! [`TierPayload::validate`].

mod payload;
mod record;
mod symbol;
mod tier;
mod timestamp;

pub use payload::{
    AnalystMetrics, CompanyProfile, DailyMetrics, EarningsTrend, IndexTrend, LiveQuote,
    PeriodSnapshot, RecommendationTrend, TierPayload,
};
pub use record::{Ticker, TierRecord};
pub use symbol::{Symbol, MAX_SYMBOL_LEN};
pub use tier::{RecordId, TickerId, Tier};
pub use timestamp::UtcDateTime;
