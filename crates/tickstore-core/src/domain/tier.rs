use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Update-frequency tier. Each tier is an independent series per ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Live quotes: price and change.
    Live,
    /// Periodic (minute-scale) open/high/low/volume snapshots.
    Frequent,
    /// Daily valuation and analyst metrics.
    Infrequent,
    /// Static company profile.
    General,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Live, Tier::Frequent, Tier::Infrequent, Tier::General];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Frequent => "frequent",
            Self::Infrequent => "infrequent",
            Self::General => "general",
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "frequent" => Ok(Self::Frequent),
            "infrequent" => Ok(Self::Infrequent),
            "general" => Ok(Self::General),
            _ => Err(ValidationError::InvalidTier {
                value: value.to_owned(),
            }),
        }
    }
}

/// Surrogate identifier of a registered ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickerId(u64);

impl TickerId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Display for TickerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Surrogate identifier of a persisted tier record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
