//! Error types for the configuration surface.
//!
//! Block processing never fails: out-of-range values are clamped. These errors
//! only come from parsing configurations and validating render requests.

use thiserror::Error;

/// Result type for engine configuration operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while building an oscillator from external input.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration JSON could not be parsed.
    #[error("invalid oscillator configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Oscillator kind name is not recognized.
    #[error("unknown oscillator kind '{name}' (expected one of: {expected})")]
    UnknownKind {
        /// The rejected name.
        name: String,
        /// Comma-separated list of accepted names.
        expected: String,
    },

    /// Invalid sample rate.
    #[error("invalid sample rate: {rate}")]
    InvalidSampleRate {
        /// The invalid sample rate.
        rate: f64,
    },

    /// Invalid render duration.
    #[error("invalid duration: {seconds} seconds")]
    InvalidDuration {
        /// The invalid duration.
        seconds: f64,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },
}

impl EngineError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Returns a stable error code for diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::ConfigParse(_) => "ENGINE_001",
            EngineError::UnknownKind { .. } => "ENGINE_002",
            EngineError::InvalidSampleRate { .. } => "ENGINE_003",
            EngineError::InvalidDuration { .. } => "ENGINE_004",
            EngineError::InvalidParameter { .. } => "ENGINE_005",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::InvalidSampleRate { rate: -1.0 };
        assert_eq!(err.to_string(), "invalid sample rate: -1");

        let err = EngineError::invalid_param("pitch", "must be finite");
        assert_eq!(err.to_string(), "invalid parameter 'pitch': must be finite");
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            EngineError::UnknownKind {
                name: "x".into(),
                expected: "classic".into(),
            },
            EngineError::InvalidSampleRate { rate: 0.0 },
            EngineError::InvalidDuration { seconds: 0.0 },
            EngineError::invalid_param("a", "b"),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_parse_error_converts() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: EngineError = parse.unwrap_err().into();
        assert_eq!(err.code(), "ENGINE_001");
    }
}
