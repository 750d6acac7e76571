//! Wide table of daily percentage-change returns.
//!
//! Each symbol's history is fetched on its own; a symbol whose fetch fails is
//! skipped and reported, never fatal. Series are merged by an outer join on
//! date: the table's dates are the union of all series' dates and a symbol
//! without data on a date leaves that cell empty. The table is built once
//! from the collected series rather than grown join by join.

use crate::call::with_timeout;
use crate::error::Result;
use crate::progress::{Progress, Stage};
use crate::symbols::resolver::DEFAULT_CALL_TIMEOUT;
use crate::window::DateWindow;
use chrono::{DateTime, NaiveDate};
use futures::stream::{self, StreamExt};
use polars::prelude::*;
use roster_data::{DailyChange, DataError, MarketDataSource};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A symbol left out of the returns table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSymbol {
    /// Ticker symbol.
    pub symbol: String,
    /// Why its history could not be used.
    pub reason: String,
}

/// One symbol's values, aligned with [`ReturnsTable::dates`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnsColumn {
    /// Ticker symbol.
    pub symbol: String,
    /// Percentage change per date; `None` where the symbol has no data.
    pub values: Vec<Option<f64>>,
}

/// Daily percentage changes: one row per date, one column per symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnsTable {
    dates: Vec<NaiveDate>,
    columns: Vec<ReturnsColumn>,
}

impl ReturnsTable {
    /// Outer-join per-symbol series on date.
    ///
    /// Series are sorted ascending; when a series repeats a date the last
    /// value wins. A symbol appearing twice keeps only its first series.
    pub fn from_series(series: Vec<(String, Vec<DailyChange>)>) -> Self {
        let mut seen = HashSet::new();
        let per_symbol: Vec<(String, BTreeMap<NaiveDate, f64>)> = series
            .into_iter()
            .filter(|(symbol, _)| seen.insert(symbol.clone()))
            .map(|(symbol, changes)| {
                let by_date = changes
                    .into_iter()
                    .map(|c| (c.date, c.change_pct))
                    .collect::<BTreeMap<_, _>>();
                (symbol, by_date)
            })
            .collect();

        let dates: Vec<NaiveDate> = per_symbol
            .iter()
            .flat_map(|(_, by_date)| by_date.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let columns = per_symbol
            .into_iter()
            .map(|(symbol, by_date)| ReturnsColumn {
                values: dates.iter().map(|d| by_date.get(d).copied()).collect(),
                symbol,
            })
            .collect();

        Self { dates, columns }
    }

    /// Trading dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Columns, in symbol order of the input.
    pub fn columns(&self) -> &[ReturnsColumn] {
        &self.columns
    }

    /// Symbols with a column.
    pub fn symbols(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.symbol.as_str()).collect()
    }

    /// Values for `symbol`, aligned with [`Self::dates`].
    pub fn column(&self, symbol: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.symbol == symbol)
            .map(|c| c.values.as_slice())
    }

    /// Value for `symbol` on `date`, if present.
    pub fn value(&self, date: NaiveDate, symbol: &str) -> Option<f64> {
        let row = self.dates.binary_search(&date).ok()?;
        self.column(symbol)?.get(row).copied().flatten()
    }

    /// Number of dates.
    pub fn height(&self) -> usize {
        self.dates.len()
    }

    /// Number of symbol columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no symbol columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate rows as `(date, values)` with values in column order.
    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, Vec<Option<f64>>)> + '_ {
        self.dates.iter().enumerate().map(|(i, date)| {
            let values = self.columns.iter().map(|c| c.values[i]).collect();
            (*date, values)
        })
    }

    /// Convert to a Polars DataFrame with a `date` column and one Float64 column per symbol.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RosterError::Polars`] if a symbol collides with the `date`
    /// column name.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let epoch = DateTime::UNIX_EPOCH.date_naive();
        let days: Vec<i32> = self
            .dates
            .iter()
            .map(|d| d.signed_duration_since(epoch).num_days() as i32)
            .collect();

        let mut columns: Vec<Column> = Vec::with_capacity(self.columns.len() + 1);
        columns.push(
            Series::new("date".into(), days)
                .cast(&DataType::Date)?
                .into(),
        );
        for column in &self.columns {
            columns.push(Series::new(column.symbol.as_str().into(), column.values.clone()).into());
        }

        Ok(DataFrame::new(columns)?)
    }
}

/// Returns table plus the symbols that had to be left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReturnsOutcome {
    /// Merged returns.
    pub table: ReturnsTable,
    /// Symbols whose history could not be fetched, in input order.
    pub skipped: Vec<SkippedSymbol>,
}

/// Call limits for history fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchConfig {
    /// Maximum fetches in flight.
    pub concurrency: usize,
    /// Limit for each fetch.
    pub call_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Fetch every symbol's daily changes over `window` and merge them.
///
/// Duplicate symbols are fetched once. Values outside the window are
/// discarded. An empty series counts as a failed fetch.
pub async fn aggregate_returns<S: MarketDataSource>(
    source: &S,
    symbols: &[String],
    window: &DateWindow,
    config: &FetchConfig,
    progress: &dyn Progress,
) -> ReturnsOutcome {
    let symbols = crate::symbols::resolver::distinct(symbols);
    progress.begin(Stage::Fetch, symbols.len());
    info!(
        symbols = symbols.len(),
        window = %window,
        "Fetching percentage change returns"
    );

    let outcomes: Vec<(String, roster_data::Result<Vec<DailyChange>>)> = stream::iter(symbols)
        .map(|symbol| async move {
            let fetch = source.fetch_history(&symbol, window.start(), window.end());
            let outcome = with_timeout(config.call_timeout, "fetching history", fetch)
                .await
                .and_then(|history| {
                    let in_window: Vec<DailyChange> = history
                        .into_iter()
                        .filter(|c| window.contains(c.date))
                        .collect();
                    if in_window.is_empty() {
                        Err(DataError::MissingData {
                            symbol: symbol.clone(),
                            reason: "no data inside the window".to_string(),
                        })
                    } else {
                        Ok(in_window)
                    }
                });
            progress.advance(&symbol);
            (symbol, outcome)
        })
        .buffered(config.concurrency.max(1))
        .collect()
        .await;

    let mut series = Vec::new();
    let mut skipped = Vec::new();
    for (symbol, outcome) in outcomes {
        match outcome {
            Ok(history) => {
                debug!(symbol = %symbol, days = history.len(), "Fetched returns");
                series.push((symbol, history));
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Skipping symbol");
                skipped.push(SkippedSymbol {
                    symbol,
                    reason: e.to_string(),
                });
            }
        }
    }

    let table = ReturnsTable::from_series(series);
    progress.finish(Stage::Fetch);
    info!(
        columns = table.width(),
        dates = table.height(),
        skipped = skipped.len(),
        "Done fetching percentage change returns"
    );

    ReturnsOutcome { table, skipped }
}
