//! Error types for data operations.
//!
//! This module defines [`DataError`] which covers all error cases that can occur
//! when translating symbols, fetching upstream data, or normalizing rows.

use thiserror::Error;

/// Errors that can occur during data operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// The symbol does not follow the `<code>.<suffix>` format.
    #[error("Invalid symbol format: {0}")]
    InvalidSymbolFormat(String),

    /// The source confirmed that the symbol does not exist.
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    /// The upstream source could not be reached or failed to answer.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// A single upstream row could not be parsed.
    #[error("Malformed row {index}: {reason}")]
    MalformedRow {
        /// Position of the row in the upstream response.
        index: usize,
        /// Why the row was rejected.
        reason: String,
    },

    /// The provider or its client was configured incorrectly.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl DataError {
    /// Returns true if retrying the same request later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_))
    }
}

/// Result type alias using [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_source_failures_are_retryable() {
        assert!(DataError::SourceUnavailable("timeout".into()).is_retryable());
        assert!(!DataError::UnknownSymbol("999999.SZ".into()).is_retryable());
        assert!(!DataError::InvalidSymbolFormat("000001".into()).is_retryable());
        assert!(
            !DataError::MalformedRow {
                index: 3,
                reason: "bad date".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_display() {
        let err = DataError::MalformedRow {
            index: 7,
            reason: "missing close".into(),
        };
        assert_eq!(err.to_string(), "Malformed row 7: missing close");
        assert_eq!(
            DataError::UnknownSymbol("000000.SZ".into()).to_string(),
            "Unknown symbol: 000000.SZ"
        );
    }
}
