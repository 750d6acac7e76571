//! Error types for the Roster core.

use chrono::NaiveDate;
use roster_data::DataError;
use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, RosterError>;

/// Errors that abort a run.
///
/// Per-company and per-symbol failures never surface here; they are collected
/// alongside the results instead.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Window start falls after its end.
    #[error("Invalid window: start {start} is after end {end}")]
    InvalidWindow {
        /// Window start
        start: NaiveDate,
        /// Window end
        end: NaiveDate,
    },

    /// Input or data access error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
