//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// Input file not found.
    #[error("JSON file '{path}' not found")]
    InputNotFound { path: PathBuf },

    /// Input is not valid JSON (nor JSON Lines).
    #[error("Failed to parse JSON: {reason}")]
    Parse { reason: String },

    /// Input is valid JSON but not a table-like document.
    #[error("Unsupported JSON shape: {reason}")]
    UnsupportedShape { reason: String },

    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    /// Creates a new parse error.
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }

    /// Creates a new unsupported shape error.
    pub fn unsupported_shape(reason: impl Into<String>) -> Self {
        Self::UnsupportedShape {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = ConverterError::InputNotFound {
            path: PathBuf::from("data.json"),
        };
        assert_eq!(err.to_string(), "JSON file 'data.json' not found");
    }

    #[test]
    fn test_constructors() {
        assert!(matches!(
            ConverterError::parse("bad"),
            ConverterError::Parse { .. }
        ));
        assert!(matches!(
            ConverterError::unsupported_shape("scalar"),
            ConverterError::UnsupportedShape { .. }
        ));
    }
}
