//! An in-memory [`MarketDataSource`] for offline runs and tests.

use crate::error::{DataError, Result};
use crate::source::{AssetClass, Country, DailyChange, Instrument, MarketDataSource};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Serves canned search results and histories.
///
/// Queries with no registered instrument fail with [`DataError::NoMatch`];
/// symbols with no registered history fail with [`DataError::MissingData`].
/// Every call is recorded so callers can assert on what was asked. Queries
/// or symbols registered with [`InMemorySource::with_delay`] answer late.
#[derive(Debug, Default)]
pub struct InMemorySource {
    instruments: HashMap<String, Instrument>,
    histories: HashMap<String, Vec<DailyChange>>,
    delays: HashMap<String, Duration>,
    searches: Mutex<Vec<String>>,
    fetches: Mutex<Vec<String>>,
}

impl InMemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `symbol` as the search result for `query`.
    pub fn with_instrument(mut self, query: impl Into<String>, symbol: impl Into<String>) -> Self {
        let query = query.into();
        let symbol = symbol.into();
        self.instruments.insert(
            query.clone(),
            Instrument {
                symbol,
                name: query.clone(),
                exchange: "LSE".to_string(),
            },
        );
        self
    }

    /// Register the daily change history of `symbol`.
    pub fn with_history(mut self, symbol: impl Into<String>, history: Vec<DailyChange>) -> Self {
        self.histories.insert(symbol.into(), history);
        self
    }

    /// Wait `delay` before answering a search for, or a fetch of, `key`.
    pub fn with_delay(mut self, key: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(key.into(), delay);
        self
    }

    async fn wait(&self, key: &str) {
        if let Some(delay) = self.delays.get(key) {
            tokio::time::sleep(*delay).await;
        }
    }

    /// Queries passed to `search`, in call order.
    pub fn searches(&self) -> Vec<String> {
        self.searches
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Symbols passed to `fetch_history`, in call order.
    pub fn fetches(&self) -> Vec<String> {
        self.fetches
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

fn record(log: &Mutex<Vec<String>>, value: &str) {
    if let Ok(mut calls) = log.lock() {
        calls.push(value.to_string());
    }
}

impl MarketDataSource for InMemorySource {
    async fn search(
        &self,
        query: &str,
        asset_class: AssetClass,
        country: Country,
    ) -> Result<Instrument> {
        record(&self.searches, query);
        self.wait(query).await;
        self.instruments
            .get(query)
            .cloned()
            .ok_or_else(|| DataError::NoMatch {
                query: query.to_string(),
                asset_class: asset_class.to_string(),
                country: country.to_string(),
            })
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyChange>> {
        record(&self.fetches, symbol);
        self.wait(symbol).await;
        let history = self
            .histories
            .get(symbol)
            .ok_or_else(|| DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "no history registered".to_string(),
            })?;

        Ok(history
            .iter()
            .filter(|c| c.date >= start && c.date <= end)
            .copied()
            .collect())
    }
}
