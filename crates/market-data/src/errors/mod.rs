//! Error types for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for provider operations
//! - [`TableError`]: Decomposition failures for provider tables

use thiserror::Error;

/// Errors that can occur while talking to a market data provider.
///
/// Optional fields of a snapshot swallow these errors (the field becomes
/// `null`); required fields surface them as a `runtime_error` response.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider client could not be constructed at all.
    /// Reported to the host as `dependency_missing`.
    #[error("market data provider '{provider}' is unavailable: {message}")]
    ProviderUnavailable {
        /// The provider that failed to initialize
        provider: String,
        /// Why initialization failed
        message: String,
    },

    /// The requested symbol was not found by the provider.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// A provider-specific error occurred.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider does not implement the requested operation.
    #[error("Operation '{operation}' not supported by {provider}")]
    NotSupported {
        /// The operation that was requested
        operation: String,
        /// The provider that does not support it
        provider: String,
    },

    /// A request parameter does not describe a window the provider can fetch.
    #[error("Invalid {name} {value:?}: expected a YYYY-MM-DD date")]
    InvalidWindow {
        /// The request field
        name: &'static str,
        /// The value as received
        value: String,
    },

    /// The provider returned a payload we could not interpret.
    #[error("Unexpected response from {provider}: {message}")]
    MalformedResponse {
        /// The provider that returned the payload
        provider: String,
        /// Description of what was wrong
        message: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Shorthand for a [`MarketDataError::ProviderError`].
    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        Self::ProviderError {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`MarketDataError::MalformedResponse`].
    pub fn malformed(provider: &str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Whether the provider itself could not be loaded.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ProviderUnavailable { .. })
    }
}

/// A table whose shape cannot be split into columns, index and data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Index labels and rows disagree in length.
    #[error("table index has {index} labels but {rows} rows")]
    IndexMismatch { index: usize, rows: usize },

    /// A row does not have one cell per column.
    #[error("row {row} has {width} cells but the table has {columns} columns")]
    RaggedRow {
        row: usize,
        width: usize,
        columns: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_is_flagged() {
        let error = MarketDataError::ProviderUnavailable {
            provider: "yahoo".to_string(),
            message: "tls backend missing".to_string(),
        };
        assert!(error.is_unavailable());
        assert!(!MarketDataError::SymbolNotFound("ACME".to_string()).is_unavailable());
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(format!("{}", error), "Symbol not found: INVALID");

        let error = MarketDataError::provider("YAHOO", "Internal server error");
        assert_eq!(
            format!("{}", error),
            "Provider error: YAHOO - Internal server error"
        );

        let error = MarketDataError::ProviderUnavailable {
            provider: "yahoo".to_string(),
            message: "connector init failed".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "market data provider 'yahoo' is unavailable: connector init failed"
        );

        let error = MarketDataError::InvalidWindow {
            name: "start_date",
            value: "01/03/2019".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            r#"Invalid start_date "01/03/2019": expected a YYYY-MM-DD date"#
        );
    }

    #[test]
    fn test_table_error_display() {
        let error = TableError::RaggedRow {
            row: 2,
            width: 3,
            columns: 5,
        };
        assert_eq!(
            error.to_string(),
            "row 2 has 3 cells but the table has 5 columns"
        );
    }
}
