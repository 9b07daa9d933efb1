use serde::Serialize;

use crate::{RecordId, Symbol, TickerId, Tier, TierPayload, UtcDateTime};

/// Registered ticker identity. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticker {
    pub id: TickerId,
    pub symbol: Symbol,
    pub name: Option<String>,
    pub created_at: UtcDateTime,
}

/// An immutable, timestamped observation in one tier's series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierRecord {
    pub id: RecordId,
    pub ticker_id: TickerId,
    pub observed_at: UtcDateTime,
    pub inserted_at: UtcDateTime,
    pub payload: TierPayload,
}

impl TierRecord {
    pub const fn tier(&self) -> Tier {
        self.payload.tier()
    }
}
