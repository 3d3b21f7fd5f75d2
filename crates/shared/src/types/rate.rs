//! Sales tax rate expressed in percent.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::amount::{AmountParseError, parse_number};

/// Error parsing a tax rate cell.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateParseError {
    /// The cell is not a number.
    #[error(transparent)]
    Amount(#[from] AmountParseError),

    /// The rate is below zero.
    #[error("tax rate cannot be negative: {0}")]
    Negative(Decimal),
}

/// A sales tax rate in percent (`18` means 18%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// Creates a rate from a percentage.
    ///
    /// # Errors
    ///
    /// Returns [`RateParseError::Negative`] for negative percentages.
    pub fn new(percent: Decimal) -> Result<Self, RateParseError> {
        if percent.is_sign_negative() && !percent.is_zero() {
            return Err(RateParseError::Negative(percent));
        }
        Ok(Self(percent.normalize()))
    }

    /// Returns the rate in percent.
    #[must_use]
    pub const fn percent(&self) -> Decimal {
        self.0
    }

    /// Returns true for a zero rate.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Tax owed on `amount`, or `None` on overflow.
    #[must_use]
    pub fn tax_on(&self, amount: Decimal) -> Option<Decimal> {
        amount
            .checked_mul(self.0)?
            .checked_div(Decimal::ONE_HUNDRED)
    }

    /// Returns true when the tax on `amount` is a whole number.
    #[must_use]
    pub fn yields_integral_tax(&self, amount: Decimal) -> bool {
        self.tax_on(amount).is_some_and(|tax| tax.fract().is_zero())
    }
}

impl FromStr for TaxRate {
    type Err = RateParseError;

    /// Parses `"18"`, `"17.5"` or `"18%"`. Thousands separators are not
    /// accepted: `"17,5"` is an error, not 175%.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let number = trimmed.strip_suffix('%').unwrap_or(trimmed);
        Self::new(parse_number(number)?)
    }
}

impl std::fmt::Display for TaxRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}
