//! Domain error types.

/// Failures raised by the [`Numeric`](crate::domain::num::Numeric) contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("square root of negative value {value}")]
    NegativeSquareRoot { value: String },

    #[error("arithmetic overflow")]
    Overflow,

    #[error("result is not a finite number")]
    NotFinite,

    #[error("cannot convert {input} to a numeric value")]
    Conversion { input: String },
}

/// Top-level error type for samta.
#[derive(Debug, thiserror::Error)]
pub enum SamtaError {
    #[error("index {index} out of bounds for series of length {length}")]
    OutOfBounds { index: usize, length: usize },

    #[error("invalid indicator configuration: {reason}")]
    Configuration { reason: String },

    #[error(transparent)]
    Numeric(#[from] NumError),

    #[error("invalid bar: {reason}")]
    InvalidBar { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },
}

impl SamtaError {
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        SamtaError::Configuration {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SamtaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_message() {
        let err = SamtaError::OutOfBounds {
            index: 7,
            length: 5,
        };
        assert_eq!(
            err.to_string(),
            "index 7 out of bounds for series of length 5"
        );
    }

    #[test]
    fn numeric_error_is_transparent() {
        let err: SamtaError = NumError::DivisionByZero.into();
        assert_eq!(err.to_string(), "division by zero");
        assert!(matches!(err, SamtaError::Numeric(NumError::DivisionByZero)));
    }

    #[test]
    fn config_invalid_message() {
        let err = SamtaError::ConfigInvalid {
            section: "series".into(),
            key: "cache".into(),
            reason: "unknown cache strategy 'lfu'".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [series] cache: unknown cache strategy 'lfu'"
        );
    }

    #[test]
    fn configuration_helper() {
        let err = SamtaError::configuration("period must be positive");
        assert_eq!(
            err.to_string(),
            "invalid indicator configuration: period must be positive"
        );
    }
}
