//! Adjustment and policy error types.

use invoicegen_shared::AppError;
use thiserror::Error;

/// Row-level failure, recovered by passing the row through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdjustError {
    /// A monetary or rate cell cannot be interpreted as a number.
    #[error("column '{column}' holds unusable value '{raw}': {reason}")]
    UnparsableValue {
        /// Column that failed.
        column: String,
        /// Raw cell text.
        raw: String,
        /// Parser message.
        reason: String,
    },
}

impl AdjustError {
    pub(crate) fn unparsable(
        column: &str,
        raw: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::UnparsableValue {
            column: column.to_string(),
            raw: raw.into(),
            reason: reason.to_string(),
        }
    }
}

/// Invalid policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// A percentage window is malformed.
    #[error("Invalid {class} window: {reason}")]
    InvalidWindow {
        /// Rate class the window belongs to.
        class: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The 3rd schedule marker is blank.
    #[error("3rd schedule marker must not be empty")]
    EmptyMarker,
}

impl From<PolicyError> for AppError {
    fn from(err: PolicyError) -> Self {
        Self::Validation(err.to_string())
    }
}
