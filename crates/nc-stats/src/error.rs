//! Error types for nc-stats

use thiserror::Error;

/// Numeric library error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// Input violates a precondition of the routine (empty, too short, mismatched shapes)
    #[error("{0}")]
    InvalidInput(String),

    /// Result left the real domain or overflowed
    #[error("{0}")]
    Domain(String),

    /// Named argument rejected (unknown name, wrong type, out of range)
    #[error("invalid argument '{name}': {reason}")]
    Argument {
        /// Argument name as passed by the caller.
        name: String,
        /// Human-readable reason.
        reason: String,
    },
}

impl StatsError {
    /// Shorthand for [`StatsError::InvalidInput`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Shorthand for [`StatsError::Argument`].
    pub fn argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Argument { name: name.into(), reason: reason.into() }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StatsError>;

/// Reject a non-finite scalar produced from finite input.
pub(crate) fn ensure_finite(op: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else if value.is_nan() {
        Err(StatsError::Domain(format!("invalid value encountered in {op}")))
    } else {
        Err(StatsError::Domain(format!("overflow or divide by zero encountered in {op}")))
    }
}

/// Element-wise [`ensure_finite`].
pub(crate) fn ensure_all_finite(op: &str, values: Vec<f64>) -> Result<Vec<f64>> {
    for &v in &values {
        ensure_finite(op, v)?;
    }
    Ok(values)
}
