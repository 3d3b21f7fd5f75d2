//! Batch result types.

use invoicegen_shared::types::Row;
use serde::Serialize;

use crate::adjust::{Adjustment, RateClass};

/// Counts over one processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Seed the batch was processed with.
    pub seed: u64,
    /// Rows read.
    pub total: usize,
    /// Rows that received a new value.
    pub adjusted: usize,
    /// Adjusted exempt rows.
    pub exempt: usize,
    /// Adjusted 3rd schedule rows.
    pub third_schedule: usize,
    /// Adjusted standard rows.
    pub standard: usize,
    /// Taxable rows that fell back to the window maximum.
    pub fallbacks: usize,
    /// Rows returned unchanged.
    pub passed_through: usize,
}

impl BatchSummary {
    /// Empty summary for a batch run with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Adds one row outcome to the counts.
    pub fn record(&mut self, adjustment: &Adjustment) {
        self.total += 1;
        match adjustment.class() {
            None => self.passed_through += 1,
            Some(class) => {
                self.adjusted += 1;
                match class {
                    RateClass::Exempt => self.exempt += 1,
                    RateClass::ThirdSchedule => self.third_schedule += 1,
                    RateClass::Standard => self.standard += 1,
                }
                if adjustment.is_fallback() {
                    self.fallbacks += 1;
                }
            }
        }
    }
}

/// Output rows, in input order, and their summary.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// Adjusted rows.
    pub rows: Vec<Row>,
    /// Counts.
    pub summary: BatchSummary,
}
