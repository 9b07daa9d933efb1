//! Tier-specific payload shapes.
//!
//! Each tier has its own typed payload; [`TierPayload`] is the tagged union
//! the series store accepts. Loosely typed ingestion input goes through
//! [`TierPayload::from_json`], which reports missing or malformed fields as
//! [`ValidationError`]s instead of opaque deserialization failures.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Tier, ValidationError};

/// Live quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveQuote {
    pub price: f64,
    pub change: Option<f64>,
    pub percent_change: Option<f64>,
}

/// Open/high/low/volume for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub previous_close: Option<f64>,
    pub volume: Option<u64>,
}

/// Daily valuation metrics, optionally with analyst coverage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub analyst: Option<AnalystMetrics>,
}

/// Analyst coverage attached to a daily metrics record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalystMetrics {
    pub recommendation: Option<String>,
    pub pe_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub next_quarter_growth: Option<f64>,
    #[serde(default)]
    pub recommendation_trend: Vec<RecommendationTrend>,
    #[serde(default)]
    pub earnings_trend: Vec<EarningsTrend>,
    pub index_trend: Option<IndexTrend>,
}

/// Analyst recommendation counts for one period (e.g. `0m`, `-1m`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationTrend {
    pub period: String,
    pub strong_buy: u32,
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub strong_sell: u32,
}

/// Expected earnings growth for one period (e.g. `0q`, `+1y`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsTrend {
    pub period: String,
    pub growth: Option<f64>,
}

/// Valuation ratios of the reference index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexTrend {
    pub pe_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
}

/// Static descriptive company data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub long_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub full_time_employees: Option<u64>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
}

/// Payload of a tier record, one variant per tier. Serialized with a
/// `tier` tag next to the payload fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum TierPayload {
    Live(LiveQuote),
    Frequent(PeriodSnapshot),
    Infrequent(DailyMetrics),
    General(CompanyProfile),
}

impl TierPayload {
    pub const fn tier(&self) -> Tier {
        match self {
            Self::Live(_) => Tier::Live,
            Self::Frequent(_) => Tier::Frequent,
            Self::Infrequent(_) => Tier::Infrequent,
            Self::General(_) => Tier::General,
        }
    }

    /// Build the payload for `tier` from a JSON object, then validate it.
    pub fn from_json(tier: Tier, value: &Value) -> Result<Self, ValidationError> {
        let Some(fields) = value.as_object() else {
            return Err(ValidationError::MalformedField {
                field: String::from("payload"),
                reason: String::from("expected a JSON object"),
            });
        };

        let payload = match tier {
            Tier::Live => Self::Live(LiveQuote {
                price: required_f64(fields, "price")?,
                change: optional_f64(fields, "change")?,
                percent_change: optional_f64(fields, "percent_change")?,
            }),
            Tier::Frequent => Self::Frequent(PeriodSnapshot {
                open: required_f64(fields, "open")?,
                high: required_f64(fields, "high")?,
                low: required_f64(fields, "low")?,
                previous_close: optional_f64(fields, "previous_close")?,
                volume: optional_u64(fields, "volume")?,
            }),
            Tier::Infrequent => Self::Infrequent(DailyMetrics {
                market_cap: optional_f64(fields, "market_cap")?,
                trailing_pe: optional_f64(fields, "trailing_pe")?,
                forward_pe: optional_f64(fields, "forward_pe")?,
                dividend_yield: optional_f64(fields, "dividend_yield")?,
                analyst: match fields.get("analyst") {
                    None | Some(Value::Null) => None,
                    Some(value) => Some(serde_json::from_value(value.clone()).map_err(
                        |error| ValidationError::MalformedField {
                            field: String::from("analyst"),
                            reason: error.to_string(),
                        },
                    )?),
                },
            }),
            Tier::General => Self::General(CompanyProfile {
                long_name: optional_string(fields, "long_name")?,
                sector: optional_string(fields, "sector")?,
                industry: optional_string(fields, "industry")?,
                full_time_employees: optional_u64(fields, "full_time_employees")?,
                country: optional_string(fields, "country")?,
                website: optional_string(fields, "website")?,
                description: optional_string(fields, "description")?,
            }),
        };

        payload.validate()?;
        Ok(payload)
    }

    /// Check the tier's numeric and shape invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Live(quote) => {
                validate_non_negative("price", quote.price)?;
                validate_optional_finite("change", quote.change)?;
                validate_optional_finite("percent_change", quote.percent_change)?;
            }
            Self::Frequent(period) => {
                validate_non_negative("open", period.open)?;
                validate_non_negative("high", period.high)?;
                validate_non_negative("low", period.low)?;
                validate_optional_non_negative("previous_close", period.previous_close)?;
                validate_optional_i64_range("volume", period.volume)?;

                if period.high < period.low {
                    return Err(ValidationError::InvalidPeriodRange);
                }
                if period.open < period.low || period.open > period.high {
                    return Err(ValidationError::InvalidPeriodBounds);
                }
            }
            Self::Infrequent(metrics) => {
                validate_optional_non_negative("market_cap", metrics.market_cap)?;
                validate_optional_finite("trailing_pe", metrics.trailing_pe)?;
                validate_optional_finite("forward_pe", metrics.forward_pe)?;
                validate_optional_non_negative("dividend_yield", metrics.dividend_yield)?;
                if let Some(analyst) = &metrics.analyst {
                    validate_analyst(analyst)?;
                }

                let has_metric = metrics.market_cap.is_some()
                    || metrics.trailing_pe.is_some()
                    || metrics.forward_pe.is_some()
                    || metrics.dividend_yield.is_some()
                    || metrics.analyst.is_some();
                if !has_metric {
                    return Err(ValidationError::EmptyPayload);
                }
            }
            Self::General(profile) => {
                validate_optional_i64_range("full_time_employees", profile.full_time_employees)?;
                let has_text = [
                    &profile.long_name,
                    &profile.sector,
                    &profile.industry,
                    &profile.country,
                    &profile.website,
                    &profile.description,
                ]
                .into_iter()
                .any(|field| field.as_deref().is_some_and(|text| !text.trim().is_empty()));
                if !has_text && profile.full_time_employees.is_none() {
                    return Err(ValidationError::EmptyPayload);
                }
            }
        }

        Ok(())
    }
}

fn validate_analyst(analyst: &AnalystMetrics) -> Result<(), ValidationError> {
    validate_optional_finite("pe_ratio", analyst.pe_ratio)?;
    validate_optional_finite("peg_ratio", analyst.peg_ratio)?;
    validate_optional_finite("next_quarter_growth", analyst.next_quarter_growth)?;

    for trend in &analyst.recommendation_trend {
        let counts = [
            trend.strong_buy,
            trend.buy,
            trend.hold,
            trend.sell,
            trend.strong_sell,
        ];
        if counts.iter().any(|count| i32::try_from(*count).is_err()) {
            return Err(ValidationError::ValueOutOfRange {
                field: "recommendation_trend",
            });
        }
    }

    for trend in &analyst.earnings_trend {
        if trend.period.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "earnings_trend.period",
            });
        }
        validate_optional_finite("earnings_trend.growth", trend.growth)?;
    }

    if let Some(index) = &analyst.index_trend {
        validate_optional_finite("index_trend.pe_ratio", index.pe_ratio)?;
        validate_optional_finite("index_trend.peg_ratio", index.peg_ratio)?;
    }

    Ok(())
}

fn required_f64(fields: &Map<String, Value>, field: &'static str) -> Result<f64, ValidationError> {
    optional_f64(fields, field)?.ok_or(ValidationError::MissingField { field })
}

fn optional_f64(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<f64>, ValidationError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| malformed(field, "expected a number")),
    }
}

fn optional_u64(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<u64>, ValidationError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| malformed(field, "expected a non-negative integer")),
    }
}

fn optional_string(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(malformed(field, "expected a string")),
    }
}

fn malformed(field: &str, reason: &str) -> ValidationError {
    ValidationError::MalformedField {
        field: field.to_owned(),
        reason: reason.to_owned(),
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

fn validate_optional_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |value| validate_non_negative(field, value))
}

fn validate_optional_i64_range(
    field: &'static str,
    value: Option<u64>,
) -> Result<(), ValidationError> {
    match value {
        Some(value) if i64::try_from(value).is_err() => {
            Err(ValidationError::ValueOutOfRange { field })
        }
        _ => Ok(()),
    }
}

fn validate_optional_finite(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(value) if !value.is_finite() => Err(ValidationError::NonFiniteValue { field }),
        _ => Ok(()),
    }
}
