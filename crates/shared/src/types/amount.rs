//! Monetary amount parsing.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Spreadsheet cells arrive as text such as `"1,234.50"`, so amounts are
//! parsed straight into `rust_decimal::Decimal`.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

/// Cell markers that mean "no value" in exported sheets.
const BLANK_MARKERS: [&str; 3] = ["", "nan", "none"];

/// Why an amount could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    /// The cell is blank or holds a blank marker.
    #[error("amount is blank")]
    Blank,

    /// The cell holds NaN or infinity.
    #[error("amount is not a finite number")]
    NotFinite,

    /// The cell is not numeric.
    #[error("not a number: {0}")]
    Invalid(String),
}

/// Returns true when a cell should be treated as absent.
///
/// Matches `""`, `"nan"` and `"None"` after trimming, ignoring case.
#[must_use]
pub fn is_blank(raw: &str) -> bool {
    let trimmed = raw.trim();
    BLANK_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Parses an amount, dropping thousands separators.
///
/// Accepts plain and scientific notation (`"1.5e3"`).
///
/// # Errors
///
/// Returns [`AmountParseError`] when the text is blank, non-finite or not
/// a number.
pub fn parse_amount(raw: &str) -> Result<Decimal, AmountParseError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    parse_number(&cleaned).map_err(|e| match e {
        AmountParseError::Invalid(_) => AmountParseError::Invalid(raw.trim().to_string()),
        other => other,
    })
}

/// Parses a plain number. Unlike [`parse_amount`], a comma is an error.
///
/// # Errors
///
/// Returns [`AmountParseError`] when the text is blank, non-finite or not
/// a number.
pub fn parse_number(raw: &str) -> Result<Decimal, AmountParseError> {
    let trimmed = raw.trim();
    if is_blank(trimmed) {
        return Err(AmountParseError::Blank);
    }

    let lowered = trimmed.to_ascii_lowercase();
    let unsigned = lowered.trim_start_matches(['+', '-']);
    if matches!(unsigned, "inf" | "infinity") {
        return Err(AmountParseError::NotFinite);
    }

    let parsed = if lowered.contains('e') {
        Decimal::from_scientific(&lowered)
    } else {
        Decimal::from_str(trimmed)
    };

    parsed.map_err(|_| AmountParseError::Invalid(trimmed.to_string()))
}
