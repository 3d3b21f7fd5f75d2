//! Per-row value adjustment.
//!
//! The adjuster reads the rate, sale type, value and fixed value cells of a
//! row and computes the increased value. It never fails: a row whose value
//! cannot be used comes back as [`Adjustment::PassThrough`] carrying the
//! original cell.

use invoicegen_shared::config::{ColumnConfig, UnparsableRatePolicy};
use invoicegen_shared::types::{CellValue, Row, RowPatch, TaxRate, is_blank, parse_amount};
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::error::AdjustError;
use super::policy::{AdjustmentPolicy, RateClass};
use super::search;

/// Where the search base came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseSource {
    /// Value of sales excluding sales tax.
    Declared,
    /// Fixed / notified value.
    Fixed,
}

/// A successfully adjusted row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustedValue {
    /// Rate class that selected the window.
    pub class: RateClass,
    /// Amount the increase was applied to.
    pub base: Decimal,
    /// Origin of `base`.
    pub base_source: BaseSource,
    /// New whole-number value.
    pub value: Decimal,
    /// False when the forced maximum increase was used.
    pub within_window: bool,
    /// Scaled extra tax, when secondary scaling is on.
    pub extra_tax: Option<Decimal>,
    /// Scaled further tax, when secondary scaling is on.
    pub further_tax: Option<Decimal>,
}

/// Result of adjusting one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adjustment {
    /// The row gets new values.
    Adjusted(AdjustedValue),
    /// The row is left untouched.
    PassThrough {
        /// Original value cell.
        original: CellValue,
        /// Why the row was not adjusted.
        error: AdjustError,
    },
}

impl Adjustment {
    /// The value cell to write: the new integer, or the original cell.
    #[must_use]
    pub fn value_cell(&self) -> CellValue {
        match self {
            Self::Adjusted(adjusted) => CellValue::integer(adjusted.value),
            Self::PassThrough { original, .. } => original.clone(),
        }
    }

    /// Cells that change in the row. Empty for pass-through rows.
    #[must_use]
    pub fn patch(&self, columns: &ColumnConfig) -> RowPatch {
        let mut patch = RowPatch::new();
        if let Self::Adjusted(adjusted) = self {
            patch.set(&columns.value, CellValue::integer(adjusted.value));
            if let Some(extra) = adjusted.extra_tax {
                patch.set(&columns.extra_tax, CellValue::integer(extra));
            }
            if let Some(further) = adjusted.further_tax {
                patch.set(&columns.further_tax, CellValue::integer(further));
            }
        }
        patch
    }

    /// Rate class, if the row was adjusted.
    #[must_use]
    pub const fn class(&self) -> Option<RateClass> {
        match self {
            Self::Adjusted(adjusted) => Some(adjusted.class),
            Self::PassThrough { .. } => None,
        }
    }

    /// True when the forced maximum increase was applied.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Adjusted(adjusted) if !adjusted.within_window)
    }

    /// The pass-through reason, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&AdjustError> {
        match self {
            Self::Adjusted(_) => None,
            Self::PassThrough { error, .. } => Some(error),
        }
    }
}

/// Stateless row adjuster.
#[derive(Debug, Clone, Default)]
pub struct ValueAdjuster {
    policy: AdjustmentPolicy,
}

impl ValueAdjuster {
    /// Creates an adjuster for `policy`.
    #[must_use]
    pub const fn new(policy: AdjustmentPolicy) -> Self {
        Self { policy }
    }

    /// The policy in use.
    #[must_use]
    pub const fn policy(&self) -> &AdjustmentPolicy {
        &self.policy
    }

    /// Adjusts one row. `rng` is only drawn from for exempt rows.
    pub fn adjust<R: Rng>(&self, row: &Row, rng: &mut R) -> Adjustment {
        match self.try_adjust(row, rng) {
            Ok(adjusted) => Adjustment::Adjusted(adjusted),
            Err(error) => Adjustment::PassThrough {
                original: row.cell(&self.policy.columns.value),
                error,
            },
        }
    }

    /// The new value cell for `row`, or its original cell on failure.
    pub fn adjust_value<R: Rng>(&self, row: &Row, rng: &mut R) -> CellValue {
        self.adjust(row, rng).value_cell()
    }

    /// A new row with the adjusted cells in place.
    pub fn adjust_row<R: Rng>(&self, row: &Row, rng: &mut R) -> Row {
        row.apply(&self.adjust(row, rng).patch(&self.policy.columns))
    }

    fn try_adjust<R: Rng>(&self, row: &Row, rng: &mut R) -> Result<AdjustedValue, AdjustError> {
        let columns = &self.policy.columns;
        let rate_val = row.cell(&columns.rate).as_text().trim().to_lowercase();

        let raw_value = row.cell(&columns.value).as_text().into_owned();
        let original = parse_amount(&raw_value)
            .map_err(|e| AdjustError::unparsable(&columns.value, raw_value.as_str(), e))?;
        if original.is_sign_negative() && !original.is_zero() {
            return Err(AdjustError::unparsable(
                &columns.value,
                raw_value,
                "amount is negative",
            ));
        }
        let out_of_range =
            || AdjustError::unparsable(&columns.value, raw_value.as_str(), "amount out of range");

        let class = self.policy.classify(&rate_val, row);
        let (base, base_source, value, within_window) = match self.policy.window_for(class) {
            None => {
                let uplift = self.policy.exempt().draw(rng);
                let value = original
                    .checked_mul(Decimal::ONE + uplift)
                    .ok_or_else(out_of_range)?
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
                (original, BaseSource::Declared, value, true)
            }
            Some(window) => {
                let (base, base_source) = match class {
                    RateClass::Standard => match self.fixed_value(row) {
                        Some(fixed) => (fixed, BaseSource::Fixed),
                        None => (original, BaseSource::Declared),
                    },
                    _ => (original, BaseSource::Declared),
                };

                let rate = match rate_val.parse::<TaxRate>() {
                    Ok(rate) => Some(rate),
                    Err(e) => match self.policy.unparsable_rate {
                        UnparsableRatePolicy::PassThrough => {
                            return Err(AdjustError::unparsable(&columns.rate, rate_val, e));
                        }
                        UnparsableRatePolicy::Fallback => None,
                    },
                };

                match rate.and_then(|r| search::find(self.policy.strategy, base, &r, window)) {
                    Some(value) => (base, base_source, value, true),
                    None => {
                        let value = window.upper_bound(base).ok_or_else(out_of_range)?;
                        (base, base_source, value, false)
                    }
                }
            }
        };

        let (extra_tax, further_tax) = if self.policy.scale_secondary_taxes {
            let ratio = if base > Decimal::ZERO {
                value.checked_div(base).unwrap_or(Decimal::ONE)
            } else {
                Decimal::ONE
            };
            (
                Some(scale_secondary(row, &columns.extra_tax, ratio)),
                Some(scale_secondary(row, &columns.further_tax, ratio)),
            )
        } else {
            (None, None)
        };

        Ok(AdjustedValue {
            class,
            base,
            base_source,
            value,
            within_window,
            extra_tax,
            further_tax,
        })
    }

    /// Fixed / notified value when present, numeric and positive.
    fn fixed_value(&self, row: &Row) -> Option<Decimal> {
        let cell = row.get(&self.policy.columns.fixed_value)?;
        let text = cell.as_text();
        if is_blank(&text) {
            return None;
        }
        parse_amount(&text).ok().filter(|v| *v > Decimal::ZERO)
    }
}

/// Secondary tax scaled by `ratio` and rounded; absent or non-numeric is 0.
fn scale_secondary(row: &Row, column: &str, ratio: Decimal) -> Decimal {
    parse_amount(&row.cell(column).as_text())
        .ok()
        .and_then(|amount| amount.checked_mul(ratio))
        .map_or(Decimal::ZERO, |scaled| {
            scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        })
}
