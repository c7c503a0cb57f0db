//! Error types for NumCalc

use thiserror::Error;

/// NumCalc error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Payload failed the input checks (shape, length, magnitude, type)
    #[error("{0}")]
    Validation(String),

    /// Calculation name not present in the service's registry
    #[error("unknown calculation '{name}' for service '{service}'. Allowed calculations: {}", allowed.join(", "))]
    UnknownCalculation {
        /// Service the lookup was made in.
        service: String,
        /// Requested name.
        name: String,
        /// Registry names, sorted.
        allowed: Vec<String>,
    },

    /// Payload is valid but does not fit the calculation's input shape
    #[error("{message}")]
    InputShape {
        /// Calculation being dispatched.
        calculation: String,
        /// What was missing or malformed.
        message: String,
    },

    /// The numeric library rejected the input or failed
    #[error("error performing '{calculation}': {message}")]
    Calculation {
        /// Calculation being dispatched.
        calculation: String,
        /// Library message.
        message: String,
    },

    /// Calculation exceeded the wall-clock limit
    #[error("calculation timed out after {seconds}s")]
    Timeout {
        /// Configured limit in seconds.
        seconds: u64,
    },

    /// Request exceeds a resource ceiling (memory estimate, concurrency)
    #[error("{0}")]
    Resource(String),

    /// Unexpected failure (panic in a calculation task, join failure)
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Stable wire name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::UnknownCalculation { .. } => "UnknownCalculationError",
            Self::InputShape { .. } => "InputShapeError",
            Self::Calculation { .. } => "CalculationError",
            Self::Timeout { .. } => "TimeoutError",
            Self::Resource(_) => "ResourceError",
            Self::Internal(_) => "InternalError",
        }
    }

    /// Calculation name, when the error is tied to one.
    pub fn calculation(&self) -> Option<&str> {
        match self {
            Self::UnknownCalculation { name, .. } => Some(name),
            Self::InputShape { calculation, .. } | Self::Calculation { calculation, .. } => {
                Some(calculation)
            }
            _ => None,
        }
    }

    pub(crate) fn shape(calculation: &str, message: impl Into<String>) -> Self {
        Self::InputShape { calculation: calculation.to_string(), message: message.into() }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(Error::Validation("x".into()).kind(), "ValidationError");
        assert_eq!(Error::Timeout { seconds: 5 }.kind(), "TimeoutError");
        assert_eq!(Error::Resource("x".into()).kind(), "ResourceError");
        assert_eq!(Error::Internal("x".into()).kind(), "InternalError");
    }

    #[test]
    fn test_unknown_calculation_lists_allowed() {
        let err = Error::UnknownCalculation {
            service: "calculator".into(),
            name: "bogus".into(),
            allowed: vec!["mean".into(), "sum".into()],
        };
        assert_eq!(err.kind(), "UnknownCalculationError");
        assert_eq!(err.calculation(), Some("bogus"));
        assert!(err.to_string().ends_with("Allowed calculations: mean, sum"));
    }

    #[test]
    fn test_calculation_message() {
        let err = Error::Calculation { calculation: "sqrt".into(), message: "bad".into() };
        assert_eq!(err.to_string(), "error performing 'sqrt': bad");
        assert_eq!(err.calculation(), Some("sqrt"));
        assert_eq!(Error::Validation("x".into()).calculation(), None);
    }
}
