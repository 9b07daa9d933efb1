use thiserror::Error;
use tickstore_warehouse::WarehouseError;

use crate::{TickerId, Tier, UtcDateTime};

/// Validation errors for domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("timestamp is outside the storable range: {value}")]
    TimestampOutOfRange { value: String },

    #[error("invalid tier '{value}', expected one of live, frequent, infrequent, general")]
    InvalidTier { value: String },

    #[error("field '{field}' is required")]
    MissingField { field: &'static str },
    #[error("field '{field}' has the wrong type: {reason}")]
    MalformedField { field: String, reason: String },
    #[error("payload must carry at least one field")]
    EmptyPayload,
    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("field '{field}' exceeds the storable range")]
    ValueOutOfRange { field: &'static str },
    #[error("period high must be >= low")]
    InvalidPeriodRange,
    #[error("period open must be within high/low range")]
    InvalidPeriodBounds,
}

/// Errors returned by the store's registry, series and ingestion operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid symbol: {0}")]
    InvalidSymbol(#[source] ValidationError),

    #[error("unknown ticker {0}")]
    UnknownTicker(TickerId),

    #[error("timestamp {attempted} for ticker {ticker} ({tier}) is not after latest {latest}")]
    NonMonotonicTimestamp {
        ticker: TickerId,
        tier: Tier,
        latest: UtcDateTime,
        attempted: UtcDateTime,
    },

    #[error("invalid {tier} payload: {source}")]
    InvalidPayload {
        tier: Tier,
        #[source]
        source: ValidationError,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),
}

impl StoreError {
    /// Stable snake_case label, used in the ingest log and CLI output.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidSymbol(_) => "invalid_symbol",
            Self::UnknownTicker(_) => "unknown_ticker",
            Self::NonMonotonicTimestamp { .. } => "non_monotonic_timestamp",
            Self::InvalidPayload { .. } => "invalid_payload",
            Self::NotFound(_) => "not_found",
            Self::Warehouse(_) => "storage_unavailable",
        }
    }

    pub(crate) fn invalid_payload(tier: Tier, source: ValidationError) -> Self {
        Self::InvalidPayload { tier, source }
    }
}
