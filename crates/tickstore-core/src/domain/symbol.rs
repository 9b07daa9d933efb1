use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{StoreError, ValidationError};

/// Maximum length of a normalized ticker symbol.
pub const MAX_SYMBOL_LEN: usize = 10;

/// Registry key of a ticker: trimmed, ASCII uppercase, 1 to 10 characters,
/// a leading letter followed by letters, digits, `.` or `-`.
///
/// Two inputs name the same ticker exactly when their normalized forms are
/// equal, so `" brk.b"` and `"BRK.B"` share one registry entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// The normalization step applied before any bound check.
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_ascii_uppercase()
    }

    /// Normalize `raw`, then check the length bound and the character rules.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = Self::normalize(raw);
        check_length(&normalized)?;
        check_characters(&normalized)?;
        Ok(Self(normalized))
    }

    /// [`parse`](Self::parse) for callers at the registry boundary, where a
    /// rejected symbol is reported as [`StoreError::InvalidSymbol`].
    pub fn from_input(raw: &str) -> Result<Self, StoreError> {
        Self::parse(raw).map_err(StoreError::InvalidSymbol)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn check_length(normalized: &str) -> Result<(), ValidationError> {
    match normalized.chars().count() {
        0 => Err(ValidationError::EmptySymbol),
        len if len > MAX_SYMBOL_LEN => Err(ValidationError::SymbolTooLong {
            len,
            max: MAX_SYMBOL_LEN,
        }),
        _ => Ok(()),
    }
}

fn check_characters(normalized: &str) -> Result<(), ValidationError> {
    let offending = normalized.chars().enumerate().find(|(index, ch)| {
        if *index == 0 {
            !ch.is_ascii_uppercase()
        } else {
            !(ch.is_ascii_uppercase() || ch.is_ascii_digit() || matches!(ch, '.' | '-'))
        }
    });

    match offending {
        None => Ok(()),
        Some((0, ch)) => Err(ValidationError::SymbolInvalidStart { ch }),
        Some((index, ch)) => Err(ValidationError::SymbolInvalidChar { ch, index }),
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spellings_of_one_ticker_normalize_to_one_key() {
        for raw in ["aapl", " AAPL", "AaPl\t"] {
            assert_eq!(Symbol::parse(raw).expect("valid").as_str(), "AAPL", "{raw:?}");
        }
        assert_eq!(Symbol::parse("brk.b").expect("valid").as_str(), "BRK.B");
    }

    #[test]
    fn length_is_bounded_after_trimming() {
        assert!(Symbol::parse("  ABCDEFGHIJ  ").is_ok());
        assert_eq!(Symbol::parse("   "), Err(ValidationError::EmptySymbol));
        assert_eq!(
            Symbol::parse("ABCDEFGHIJK"),
            Err(ValidationError::SymbolTooLong { len: 11, max: 10 })
        );
    }

    #[test]
    fn character_rules_report_the_offending_position() {
        assert_eq!(
            Symbol::parse("1AAPL"),
            Err(ValidationError::SymbolInvalidStart { ch: '1' })
        );
        assert_eq!(
            Symbol::parse("AAPL$"),
            Err(ValidationError::SymbolInvalidChar { ch: '$', index: 4 })
        );
        assert_eq!(
            Symbol::parse("AB CD"),
            Err(ValidationError::SymbolInvalidChar { ch: ' ', index: 2 })
        );
    }

    #[test]
    fn registry_boundary_reports_invalid_symbol() {
        let error = Symbol::from_input("").expect_err("empty");
        assert!(matches!(
            error,
            StoreError::InvalidSymbol(ValidationError::EmptySymbol)
        ));
        assert_eq!(error.kind(), "invalid_symbol");
    }

    #[test]
    fn deserialization_applies_the_same_rules() {
        let symbol: Symbol = serde_json::from_str("\"msft\"").expect("valid");
        assert_eq!(symbol.as_str(), "MSFT");
        assert!(serde_json::from_str::<Symbol>("\"9X\"").is_err());
    }
}
