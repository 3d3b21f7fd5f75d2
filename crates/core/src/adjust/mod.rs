//! Value adjustment for sale invoice rows.
//!
//! This module implements the integral-tax uplift:
//! - Policy table (rate class to window, detection rule)
//! - Candidate search (linear scan and integral step)
//! - The per-row adjuster with fail-soft pass-through
//! - Error types for rows and policies

pub mod adjuster;
pub mod error;
pub mod policy;
pub mod search;

#[cfg(test)]
mod adjuster_props;
#[cfg(test)]
mod search_props;

pub use adjuster::{AdjustedValue, Adjustment, BaseSource, ValueAdjuster};
pub use error::{AdjustError, PolicyError};
pub use policy::{AdjustmentPolicy, RateClass, SearchWindow, ThirdScheduleRule, UpliftRange};
pub use search::integral_step;
