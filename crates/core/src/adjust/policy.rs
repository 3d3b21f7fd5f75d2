//! Canonical adjustment policy table.
//!
//! Each rate class maps to a percentage window. The table is built from
//! [`PolicyConfig`] so that windows and detection rules can change without
//! code changes:
//!
//! | Class          | Detection                                   | Window            |
//! |----------------|---------------------------------------------|-------------------|
//! | Exempt         | rate in `exempt_rates`                      | random 5% - 10%   |
//! | 3rd schedule   | marker substring in the configured column   | 0.5% - 2.0% / 0.1 |
//! | Standard       | everything else                             | 0.1% - 2.0% / 0.1 |

use invoicegen_shared::config::{
    ColumnConfig, PolicyConfig, SearchStrategy, UnparsableRatePolicy, WindowConfig,
};
use invoicegen_shared::types::Row;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use super::error::PolicyError;

/// Parts per million used for the random uplift draw.
const PPM: i64 = 1_000_000;

/// Largest number of grid points a scan window may have.
pub const MAX_GRID_POINTS: u32 = 100_000;

/// Rate class of a row, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateClass {
    /// Exempt or zero-rated.
    Exempt,
    /// 3rd schedule goods.
    ThirdSchedule,
    /// Normal taxable goods.
    Standard,
}

impl std::fmt::Display for RateClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exempt => write!(f, "exempt"),
            Self::ThirdSchedule => write!(f, "third_schedule"),
            Self::Standard => write!(f, "standard"),
        }
    }
}

/// Increase window searched for an integral-tax value.
///
/// Bounds are fractions (`0.001` is 0.1%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchWindow {
    min: Decimal,
    max: Decimal,
    grid: Decimal,
    /// Grid steps after `min`; the scan visits `steps + 1` points.
    steps: u32,
}

impl SearchWindow {
    const fn new_unchecked(min: Decimal, max: Decimal, grid: Decimal, steps: u32) -> Self {
        Self {
            min,
            max,
            grid,
            steps,
        }
    }

    /// Builds a window from percentages.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidWindow`] unless `0 <= min <= max`, the
    /// grid spacing is positive and the grid has at most
    /// [`MAX_GRID_POINTS`] points.
    pub fn from_config(config: &WindowConfig, class: &'static str) -> Result<Self, PolicyError> {
        let invalid = |reason: &str| PolicyError::InvalidWindow {
            class,
            reason: reason.to_string(),
        };

        if config.min_pct.is_sign_negative() && !config.min_pct.is_zero() {
            return Err(invalid("min_pct must not be negative"));
        }
        if config.max_pct < config.min_pct {
            return Err(invalid("max_pct must not be below min_pct"));
        }
        if config.step_pct <= Decimal::ZERO {
            return Err(invalid("step_pct must be positive"));
        }

        let steps = (config.max_pct - config.min_pct)
            .checked_div(config.step_pct)
            .and_then(|n| n.floor().to_u32())
            .filter(|n| *n < MAX_GRID_POINTS)
            .ok_or_else(|| invalid("too many grid points for step_pct"))?;

        Ok(Self::new_unchecked(
            config.min_pct / Decimal::ONE_HUNDRED,
            config.max_pct / Decimal::ONE_HUNDRED,
            config.step_pct / Decimal::ONE_HUNDRED,
            steps,
        ))
    }

    /// Smallest increase as a fraction.
    #[must_use]
    pub const fn min(&self) -> Decimal {
        self.min
    }

    /// Largest increase as a fraction.
    #[must_use]
    pub const fn max(&self) -> Decimal {
        self.max
    }

    /// Increases visited by the scan, ascending: `min, min + grid, ..., <= max`.
    pub fn grid_points(&self) -> impl Iterator<Item = Decimal> + '_ {
        (0..=self.steps).map(move |k| self.min + self.grid * Decimal::from(k))
    }

    /// `ceil(base * (1 + min))`, or `None` on overflow.
    #[must_use]
    pub fn lower_bound(&self, base: Decimal) -> Option<Decimal> {
        raise(base, self.min)
    }

    /// `ceil(base * (1 + max))`, or `None` on overflow. Also the fallback.
    #[must_use]
    pub fn upper_bound(&self, base: Decimal) -> Option<Decimal> {
        raise(base, self.max)
    }
}

/// `ceil(base * (1 + fraction))` with overflow checking.
pub(crate) fn raise(base: Decimal, fraction: Decimal) -> Option<Decimal> {
    base.checked_mul(Decimal::ONE + fraction).map(|v| v.ceil())
}

/// Random uplift range for exempt rows, held in parts per million.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpliftRange {
    min_ppm: i64,
    max_ppm: i64,
}

impl UpliftRange {
    /// Builds the range from percentages.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidWindow`] unless `0 <= min < max` at
    /// one-in-a-million resolution.
    pub fn from_config(config: &WindowConfig) -> Result<Self, PolicyError> {
        let invalid = |reason: &str| PolicyError::InvalidWindow {
            class: "exempt",
            reason: reason.to_string(),
        };
        let to_ppm = |pct: Decimal| {
            pct.checked_mul(Decimal::from(PPM / 100))
                .and_then(|ppm| ppm.round().to_i64())
                .ok_or_else(|| invalid("percentage out of range"))
        };

        let min_ppm = to_ppm(config.min_pct)?;
        let max_ppm = to_ppm(config.max_pct)?;
        if min_ppm < 0 {
            return Err(invalid("min_pct must not be negative"));
        }
        if max_ppm <= min_ppm {
            return Err(invalid("max_pct must be above min_pct"));
        }
        Ok(Self { min_ppm, max_ppm })
    }

    /// Draws a fraction uniformly from `[min, max)`.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> Decimal {
        Decimal::new(rng.random_range(self.min_ppm..self.max_ppm), 6)
    }

    /// Smallest uplift as a fraction.
    #[must_use]
    pub fn min(&self) -> Decimal {
        Decimal::new(self.min_ppm, 6)
    }

    /// Exclusive upper uplift as a fraction.
    #[must_use]
    pub fn max(&self) -> Decimal {
        Decimal::new(self.max_ppm, 6)
    }
}

/// Detection rule and window for 3rd schedule goods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThirdScheduleRule {
    column: String,
    marker: String,
    window: SearchWindow,
}

impl ThirdScheduleRule {
    /// Returns true when the row's detection column contains the marker.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        row.cell(&self.column)
            .as_text()
            .to_lowercase()
            .contains(&self.marker)
    }

    /// Increase window.
    #[must_use]
    pub const fn window(&self) -> &SearchWindow {
        &self.window
    }
}

/// The validated policy table used by the adjuster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustmentPolicy {
    /// Candidate search strategy.
    pub strategy: SearchStrategy,
    /// Handling of non-numeric rates on taxable rows.
    pub unparsable_rate: UnparsableRatePolicy,
    /// Scale extra and further tax by the value ratio.
    pub scale_secondary_taxes: bool,
    /// Column names.
    pub columns: ColumnConfig,
    exempt_rates: Vec<String>,
    exempt: UpliftRange,
    third_schedule: ThirdScheduleRule,
    standard: SearchWindow,
}

impl AdjustmentPolicy {
    /// Validates a configured policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] for malformed windows or an empty marker.
    pub fn from_config(policy: &PolicyConfig, columns: &ColumnConfig) -> Result<Self, PolicyError> {
        let marker = policy.third_schedule.marker.trim().to_lowercase();
        if marker.is_empty() {
            return Err(PolicyError::EmptyMarker);
        }

        Ok(Self {
            strategy: policy.strategy,
            unparsable_rate: policy.unparsable_rate,
            scale_secondary_taxes: policy.scale_secondary_taxes,
            columns: columns.clone(),
            exempt_rates: policy
                .exempt_rates
                .iter()
                .map(|r| r.trim().to_lowercase())
                .collect(),
            exempt: UpliftRange::from_config(&policy.exempt)?,
            third_schedule: ThirdScheduleRule {
                column: policy.third_schedule.column.clone(),
                marker,
                window: SearchWindow::from_config(
                    &policy.third_schedule.window,
                    "third_schedule",
                )?,
            },
            standard: SearchWindow::from_config(&policy.standard, "standard")?,
        })
    }

    /// Returns a copy using `strategy`.
    #[must_use]
    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Classifies a row. `rate_val` is the trimmed, lowercased rate cell.
    #[must_use]
    pub fn classify(&self, rate_val: &str, row: &Row) -> RateClass {
        if self.exempt_rates.iter().any(|r| r == rate_val) {
            RateClass::Exempt
        } else if self.third_schedule.matches(row) {
            RateClass::ThirdSchedule
        } else {
            RateClass::Standard
        }
    }

    /// Exempt uplift range.
    #[must_use]
    pub const fn exempt(&self) -> &UpliftRange {
        &self.exempt
    }

    /// 3rd schedule rule.
    #[must_use]
    pub const fn third_schedule(&self) -> &ThirdScheduleRule {
        &self.third_schedule
    }

    /// Standard window.
    #[must_use]
    pub const fn standard(&self) -> &SearchWindow {
        &self.standard
    }

    /// Window searched for a taxable class; `None` for exempt rows.
    #[must_use]
    pub const fn window_for(&self, class: RateClass) -> Option<&SearchWindow> {
        match class {
            RateClass::Exempt => None,
            RateClass::ThirdSchedule => Some(&self.third_schedule.window),
            RateClass::Standard => Some(&self.standard),
        }
    }
}

impl Default for AdjustmentPolicy {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::Step,
            unparsable_rate: UnparsableRatePolicy::PassThrough,
            scale_secondary_taxes: true,
            columns: ColumnConfig::default(),
            exempt_rates: ["exempt", "0", "0.0", "0%"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            exempt: UpliftRange {
                min_ppm: 50_000,
                max_ppm: 100_000,
            },
            third_schedule: ThirdScheduleRule {
                column: "Sale Type".to_string(),
                marker: "3rd schedule goods".to_string(),
                window: SearchWindow::new_unchecked(
                    Decimal::new(5, 3),
                    Decimal::new(20, 3),
                    Decimal::new(1, 3),
                    15,
                ),
            },
            standard: SearchWindow::new_unchecked(
                Decimal::new(1, 3),
                Decimal::new(20, 3),
                Decimal::new(1, 3),
                19,
            ),
        }
    }
}
