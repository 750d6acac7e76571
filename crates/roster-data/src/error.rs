//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Yahoo Finance API error
    #[error("Yahoo Finance API error: {0}")]
    YahooApi(String),

    /// Invalid date range
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date of the range
        start: String,
        /// End date of the range
        end: String,
    },

    /// A date string that is not `YYYY-MM-DD`
    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate {
        /// The offending input
        value: String,
    },

    /// No search result matched the query
    #[error("No {asset_class} match for '{query}' in {country}")]
    NoMatch {
        /// Text that was searched
        query: String,
        /// Asset class the search was scoped to
        asset_class: String,
        /// Country the search was scoped to
        country: String,
    },

    /// Missing data
    #[error("Missing data for {symbol}: {reason}")]
    MissingData {
        /// Symbol that was queried
        symbol: String,
        /// Reason for missing data
        reason: String,
    },

    /// An external call did not complete in time
    #[error("Timed out after {elapsed_ms}ms while {operation}")]
    Timeout {
        /// What was being done
        operation: String,
        /// Configured limit in milliseconds
        elapsed_ms: u64,
    },

    /// Time conversion error
    #[error("Time conversion error: {0}")]
    TimeConversion(String),

    /// Invalid symbol
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Unknown country name
    #[error("Unknown country: {0}")]
    UnknownCountry(String),

    /// Input table lacks a required column
    #[error("Missing required column '{0}' in membership input")]
    MissingColumn(String),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<yahoo_finance_api::YahooError> for DataError {
    fn from(err: yahoo_finance_api::YahooError) -> Self {
        Self::YahooApi(err.to_string())
    }
}

impl DataError {
    /// Whether the error comes from malformed input rather than the remote service.
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDate { .. }
                | Self::InvalidDateRange { .. }
                | Self::MissingColumn(_)
                | Self::UnknownCountry(_)
        )
    }
}
