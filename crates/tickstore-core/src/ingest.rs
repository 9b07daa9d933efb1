//! Ingestion entry points: resolve a symbol, then append to the tier that
//! matches the data's refresh cadence.

use std::fmt::{Display, Formatter};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{RecordId, StoreError, Symbol, Tier, TierPayload, TickStore, UtcDateTime};

/// Identifier (UUID v4) shared by every outcome of one ingestion batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// One observation as delivered by an ingestion source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngestTuple {
    pub symbol: String,
    pub tier: Tier,
    pub timestamp: UtcDateTime,
    pub payload: Value,
    /// Display name used if this observation registers the ticker.
    #[serde(default)]
    pub name: Option<String>,
}

pub const STATUS_ACCEPTED: &str = "accepted";

/// Result of ingesting a single tuple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestOutcome {
    pub symbol: String,
    pub tier: Tier,
    pub timestamp: UtcDateTime,
    /// `accepted`, or the [`StoreError::kind`] label of the rejection.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_us: u64,
}

impl IngestOutcome {
    pub fn is_accepted(&self) -> bool {
        self.status == STATUS_ACCEPTED
    }
}

/// Per-tuple outcomes of a batch. Tuples are applied independently; a
/// rejected tuple never prevents later ones from being applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub request_id: RequestId,
    pub source: String,
    pub accepted: usize,
    pub rejected: usize,
    pub outcomes: Vec<IngestOutcome>,
}

impl TickStore {
    /// Ingest one tuple.
    ///
    /// The symbol and payload are validated before the ticker is resolved,
    /// so a rejected tuple never registers a new ticker.
    pub fn ingest(&self, tuple: &IngestTuple) -> Result<RecordId, StoreError> {
        let symbol = Symbol::from_input(&tuple.symbol)?;

        let payload = TierPayload::from_json(tuple.tier, &tuple.payload)
            .map_err(|error| StoreError::invalid_payload(tuple.tier, error))?;
        tuple
            .timestamp
            .unix_nanos()
            .map_err(|error| StoreError::invalid_payload(tuple.tier, error))?;

        let ticker = self.registry().register(symbol, tuple.name.as_deref())?;
        self.series().append(ticker, tuple.timestamp, payload)
    }

    /// Ingest `tuples` in order and report every outcome.
    ///
    /// The report is handed to the storage backend's ingest log; a failure
    /// to log is reported but does not undo accepted appends.
    pub fn ingest_batch(&self, source: &str, tuples: &[IngestTuple]) -> IngestReport {
        let mut report = IngestReport {
            request_id: RequestId::new_v4(),
            source: source.to_string(),
            accepted: 0,
            rejected: 0,
            outcomes: Vec::with_capacity(tuples.len()),
        };

        for tuple in tuples {
            let started = Instant::now();
            let result = self.ingest(tuple);
            let latency_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

            let outcome = match result {
                Ok(record_id) => {
                    report.accepted += 1;
                    IngestOutcome {
                        symbol: tuple.symbol.clone(),
                        tier: tuple.tier,
                        timestamp: tuple.timestamp,
                        status: STATUS_ACCEPTED.to_string(),
                        record_id: Some(record_id),
                        error: None,
                        latency_us,
                    }
                }
                Err(error) => {
                    report.rejected += 1;
                    IngestOutcome {
                        symbol: tuple.symbol.clone(),
                        tier: tuple.tier,
                        timestamp: tuple.timestamp,
                        status: error.kind().to_string(),
                        record_id: None,
                        error: Some(error.to_string()),
                        latency_us,
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        if let Some(sink) = self.sink() {
            if let Err(error) = sink.record_batch(&report) {
                warn!(request_id = %report.request_id, error = %error, "failed to log ingest batch");
            }
        }

        info!(
            request_id = %report.request_id,
            source,
            accepted = report.accepted,
            rejected = report.rejected,
            "ingested batch"
        );
        report
    }
}
