//! Application configuration management.
//!
//! Every field has a default, so an empty environment yields the canonical
//! adjustment policy. Percentages are written in percent (`0.1` means 0.1%).

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Column names read from and written to each row.
    pub columns: ColumnConfig,
    /// Value-adjustment policy table.
    pub policy: PolicyConfig,
    /// Batch driver settings.
    pub batch: BatchConfig,
}

/// Column names of the invoice row.
///
/// The 3rd schedule detection column lives in [`ThirdScheduleConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Tax rate column.
    pub rate: String,
    /// Value of sales excluding sales tax.
    pub value: String,
    /// Fixed / notified value or retail price column.
    pub fixed_value: String,
    /// Extra tax column.
    pub extra_tax: String,
    /// Further tax column.
    pub further_tax: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            rate: "Rate".to_string(),
            value: "Value of Sales Excluding Sales Tax".to_string(),
            fixed_value: "Fixed / notified value or Retail Price / Toll Charges".to_string(),
            extra_tax: "Extra Tax".to_string(),
            further_tax: "Further Tax".to_string(),
        }
    }
}

/// How the integer-tax candidate is searched for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Smallest multiple of the rate's integral step inside the window.
    ///
    /// Can find values between grid points, so for bases above about 1000
    /// it may differ from [`SearchStrategy::Scan`].
    #[default]
    Step,
    /// Linear scan over the percentage grid.
    Scan,
}

/// What to do with a taxable row whose rate is not a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnparsableRatePolicy {
    /// Leave the value untouched.
    #[default]
    PassThrough,
    /// Apply the forced maximum increase without an integrality check.
    Fallback,
}

/// Percentage window for one rate class.
///
/// [`AppConfig::load`] fills keys missing from a partial window with the
/// defaults of its section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct WindowConfig {
    /// Smallest increase, in percent.
    pub min_pct: Decimal,
    /// Largest increase, in percent.
    pub max_pct: Decimal,
    /// Grid spacing of the scan, in percent.
    #[serde(default)]
    pub step_pct: Decimal,
}

/// 3rd schedule detection and window.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThirdScheduleConfig {
    /// Column searched for the marker.
    pub column: String,
    /// Case-insensitive marker substring.
    pub marker: String,
    /// Increase window.
    pub window: WindowConfig,
}

impl Default for ThirdScheduleConfig {
    fn default() -> Self {
        Self {
            column: "Sale Type".to_string(),
            marker: "3rd schedule goods".to_string(),
            window: WindowConfig {
                min_pct: Decimal::new(5, 1),
                max_pct: Decimal::new(20, 1),
                step_pct: Decimal::new(1, 1),
            },
        }
    }
}

/// Adjustment policy table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Candidate search strategy.
    pub strategy: SearchStrategy,
    /// Lowercased rate values treated as exempt or zero-rated.
    pub exempt_rates: Vec<String>,
    /// Random uplift window for exempt rows; `step_pct` is ignored.
    pub exempt: WindowConfig,
    /// 3rd schedule goods.
    pub third_schedule: ThirdScheduleConfig,
    /// Normal taxable goods.
    pub standard: WindowConfig,
    /// Handling of non-numeric rates.
    pub unparsable_rate: UnparsableRatePolicy,
    /// Scale extra and further tax by the same ratio as the value.
    pub scale_secondary_taxes: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::default(),
            exempt_rates: default_exempt_rates(),
            exempt: WindowConfig {
                min_pct: Decimal::new(5, 0),
                max_pct: Decimal::new(10, 0),
                step_pct: Decimal::ZERO,
            },
            third_schedule: ThirdScheduleConfig::default(),
            standard: WindowConfig {
                min_pct: Decimal::new(1, 1),
                max_pct: Decimal::new(20, 1),
                step_pct: Decimal::new(1, 1),
            },
            unparsable_rate: UnparsableRatePolicy::default(),
            scale_secondary_taxes: true,
        }
    }
}

fn default_exempt_rates() -> Vec<String> {
    ["exempt", "0", "0.0", "0%"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Batch driver configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Base seed for per-row random generators. Random when unset.
    pub seed: Option<u64>,
    /// Worker threads. Rayon's default when unset.
    pub threads: Option<usize>,
}

impl AppConfig {
    /// Loads configuration from config files and the environment.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// the optional `extra` file, then `INVOICEGEN__*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or deserialized.
    pub fn load(extra: Option<&Path>) -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let mut builder = Self::window_defaults(config::Config::builder())?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false));

        if let Some(path) = extra {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("INVOICEGEN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Seeds every window key with its default so that a partial window
    /// from a file or the environment is merged rather than rejected.
    fn window_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        let policy = PolicyConfig::default();
        let windows = [
            ("policy.exempt", policy.exempt),
            ("policy.third_schedule.window", policy.third_schedule.window),
            ("policy.standard", policy.standard),
        ];

        windows
            .into_iter()
            .try_fold(builder, |builder, (prefix, window)| {
                builder
                    .set_default(format!("{prefix}.min_pct"), window.min_pct.to_string())?
                    .set_default(format!("{prefix}.max_pct"), window.max_pct.to_string())?
                    .set_default(format!("{prefix}.step_pct"), window.step_pct.to_string())
            })
    }
}
