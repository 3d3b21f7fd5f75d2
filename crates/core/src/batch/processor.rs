//! Parallel batch driver.

use invoicegen_shared::types::Row;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::types::{BatchReport, BatchSummary};
use crate::adjust::{AdjustError, Adjustment, ValueAdjuster};

/// Uses `configured` when given, otherwise draws a fresh seed.
#[must_use]
pub fn resolve_seed(configured: Option<u64>) -> u64 {
    configured.unwrap_or_else(rand::random)
}

/// Applies a [`ValueAdjuster`] to every row of a batch.
#[derive(Debug, Clone, Default)]
pub struct BatchProcessor {
    adjuster: ValueAdjuster,
}

impl BatchProcessor {
    /// Creates a processor around `adjuster`.
    #[must_use]
    pub const fn new(adjuster: ValueAdjuster) -> Self {
        Self { adjuster }
    }

    /// The wrapped adjuster.
    #[must_use]
    pub const fn adjuster(&self) -> &ValueAdjuster {
        &self.adjuster
    }

    /// Adjusts all rows. Output order matches input order.
    #[must_use]
    pub fn process(&self, rows: &[Row], seed: u64) -> BatchReport {
        let outcomes: Vec<(Row, Adjustment)> = rows
            .par_iter()
            .enumerate()
            .map(|(index, row)| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
                let adjustment = self.adjuster.adjust(row, &mut rng);
                (row.apply(&adjustment.patch(&self.adjuster.policy().columns)), adjustment)
            })
            .collect();

        let mut summary = BatchSummary::new(seed);
        let mut out = Vec::with_capacity(outcomes.len());
        for (index, (row, adjustment)) in outcomes.into_iter().enumerate() {
            match &adjustment {
                Adjustment::PassThrough {
                    error: AdjustError::UnparsableValue { column, raw, reason },
                    ..
                } => {
                    warn!(row = index, %column, %raw, %reason, "Row passed through unchanged");
                }
                Adjustment::Adjusted(adjusted) if !adjusted.within_window => {
                    debug!(
                        row = index,
                        class = %adjusted.class,
                        value = %adjusted.value,
                        "No integral-tax value in window, applied maximum increase"
                    );
                }
                Adjustment::Adjusted(_) => {}
            }
            summary.record(&adjustment);
            out.push(row);
        }

        info!(
            seed,
            total = summary.total,
            adjusted = summary.adjusted,
            fallbacks = summary.fallbacks,
            passed_through = summary.passed_through,
            "Batch processed"
        );

        BatchReport { rows: out, summary }
    }
}
