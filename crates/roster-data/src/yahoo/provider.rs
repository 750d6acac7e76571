//! Symbol search and daily change history from Yahoo Finance.

use crate::error::{DataError, Result};
use crate::source::{
    AssetClass, Country, DailyChange, Instrument, MarketDataSource, percentage_changes,
};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::debug;
use yahoo_finance_api as yahoo;

/// Default spacing between requests.
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(500);

/// Calendar days fetched before the window start so the first trading day in
/// the window has a prior close to compare against.
const HISTORY_LOOKBACK_DAYS: i64 = 10;

/// Spaces consecutive requests by a minimum interval.
struct RateLimiter {
    last_request: Option<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    const fn new(min_interval: Duration) -> Self {
        Self {
            last_request: None,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// Yahoo Finance market data provider with rate limiting.
pub struct YahooProvider {
    connector: yahoo::YahooConnector,
    rate_limiter: Mutex<RateLimiter>,
}

impl std::fmt::Debug for YahooProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooProvider").finish_non_exhaustive()
    }
}

impl YahooProvider {
    /// Create a provider with the default rate limit (2 req/sec).
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP connector cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(DEFAULT_RATE_LIMIT)
    }

    /// Create a provider that waits at least `min_interval` between requests.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP connector cannot be built.
    pub fn with_rate_limit(min_interval: Duration) -> Result<Self> {
        Ok(Self {
            connector: yahoo::YahooConnector::new()?,
            rate_limiter: Mutex::new(RateLimiter::new(min_interval)),
        })
    }

    async fn throttle(&self) {
        self.rate_limiter.lock().await.wait().await;
    }
}

/// Midnight UTC of `date` as a `time::OffsetDateTime`.
fn to_offset_date_time(date: NaiveDate) -> Result<time::OffsetDateTime> {
    let timestamp = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| DataError::TimeConversion(format!("invalid midnight for {date}")))?
        .and_utc()
        .timestamp();
    time::OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| DataError::TimeConversion(e.to_string()))
}

impl MarketDataSource for YahooProvider {
    async fn search(
        &self,
        query: &str,
        asset_class: AssetClass,
        country: Country,
    ) -> Result<Instrument> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DataError::InvalidSymbol("Empty search text".to_string()));
        }

        self.throttle().await;
        let result = self.connector.search_ticker(query).await?;

        // Results come back ranked; the first qualifying listing is the best match.
        result
            .quotes
            .into_iter()
            .find(|item| {
                item.quote_type.eq_ignore_ascii_case(asset_class.quote_type())
                    && country.lists_on(&item.exchange)
            })
            .map(|item| {
                debug!(query, symbol = %item.symbol, exchange = %item.exchange, "Search matched");
                Instrument {
                    symbol: item.symbol,
                    name: item.short_name,
                    exchange: item.exchange,
                }
            })
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
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let from = to_offset_date_time(start - ChronoDuration::days(HISTORY_LOOKBACK_DAYS))?;
        // The upper bound is exclusive on Yahoo's side.
        let to = to_offset_date_time(end + ChronoDuration::days(1))?;

        self.throttle().await;
        let response = self.connector.get_quote_history(symbol, from, to).await?;
        let quotes = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        let mut closes: Vec<(NaiveDate, f64)> = quotes
            .iter()
            .filter_map(|q| {
                let secs = i64::try_from(q.timestamp).ok()?;
                DateTime::from_timestamp(secs, 0).map(|dt| (dt.date_naive(), q.close))
            })
            .collect();
        closes.sort_by_key(|(date, _)| *date);
        closes.dedup_by_key(|(date, _)| *date);

        let changes: Vec<DailyChange> = percentage_changes(&closes)
            .into_iter()
            .filter(|c| c.date >= start && c.date <= end)
            .collect();

        if changes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }

        debug!(symbol, days = changes.len(), "Fetched history");
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_to_offset_date_time() {
        let odt = to_offset_date_time(d(2014, 1, 1)).unwrap();
        assert_eq!(odt.unix_timestamp(), 1_388_534_400);
    }

    #[tokio::test]
    async fn test_rate_limiter_first_call_is_immediate() {
        let mut limiter = RateLimiter::new(Duration::from_secs(60));
        let before = Instant::now();
        limiter.wait().await;
        assert!(before.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_invalid_date_range() {
        let provider = YahooProvider::new().unwrap();
        let result = provider
            .fetch_history("BARC.L", d(2021, 6, 30), d(2021, 1, 1))
            .await;
        assert!(matches!(result, Err(DataError::InvalidDateRange { .. })));
    }

    #[tokio::test]
    async fn test_invalid_symbol() {
        let provider = YahooProvider::new().unwrap();
        let result = provider
            .fetch_history("", d(2021, 1, 1), d(2021, 6, 30))
            .await;
        assert!(matches!(result, Err(DataError::InvalidSymbol(_))));
    }

    #[tokio::test]
    async fn test_empty_search_text() {
        let provider = YahooProvider::new().unwrap();
        let result = provider
            .search("   ", AssetClass::Equity, Country::UnitedKingdom)
            .await;
        assert!(matches!(result, Err(DataError::InvalidSymbol(_))));
    }

    #[tokio::test]
    #[ignore = "requires network access to Yahoo Finance"]
    async fn test_search_live() {
        let provider = YahooProvider::new().unwrap();
        let instrument = provider
            .search("Barclays", AssetClass::Equity, Country::UnitedKingdom)
            .await
            .unwrap();
        assert_eq!(instrument.symbol, "BARC.L");
    }

    #[tokio::test]
    #[ignore = "requires network access to Yahoo Finance"]
    async fn test_fetch_history_live() {
        let provider = YahooProvider::new().unwrap();
        let changes = provider
            .fetch_history("BARC.L", d(2021, 1, 4), d(2021, 1, 29))
            .await
            .unwrap();
        assert!(!changes.is_empty());
        assert_eq!(changes[0].date, d(2021, 1, 4));
    }
}
