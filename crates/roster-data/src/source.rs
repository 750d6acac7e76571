//! The market data capability the core depends on.
//!
//! Two operations are needed: a name search that returns the single best
//! instrument for a company, and a history fetch returning daily percentage
//! changes. Any financial-data API that can answer both can drive a run.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;

/// Asset class a search is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AssetClass {
    /// Common stock.
    #[default]
    Equity,
    /// Exchange-traded fund.
    Etf,
}

impl AssetClass {
    /// Quote type string used by Yahoo search results.
    pub const fn quote_type(&self) -> &'static str {
        match self {
            Self::Equity => "EQUITY",
            Self::Etf => "ETF",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equity => write!(f, "equity"),
            Self::Etf => write!(f, "ETF"),
        }
    }
}

/// Country whose listings a search is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Country {
    /// London Stock Exchange listings.
    #[default]
    UnitedKingdom,
    /// NYSE, Nasdaq and NYSE American listings.
    UnitedStates,
    /// Xetra and Frankfurt listings.
    Germany,
    /// Euronext Paris listings.
    France,
}

impl Country {
    /// All supported countries.
    pub const fn all() -> [Self; 4] {
        [
            Self::UnitedKingdom,
            Self::UnitedStates,
            Self::Germany,
            Self::France,
        ]
    }

    /// Human readable name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UnitedKingdom => "United Kingdom",
            Self::UnitedStates => "United States",
            Self::Germany => "Germany",
            Self::France => "France",
        }
    }

    /// Yahoo exchange codes for this country's primary venues.
    pub const fn exchanges(&self) -> &'static [&'static str] {
        match self {
            Self::UnitedKingdom => &["LSE", "IOB"],
            Self::UnitedStates => &["NYQ", "NMS", "NGM", "NCM", "ASE", "PCX"],
            Self::Germany => &["GER", "FRA"],
            Self::France => &["PAR"],
        }
    }

    /// Whether a Yahoo exchange code belongs to this country.
    pub fn lists_on(&self, exchange: &str) -> bool {
        self.exchanges()
            .iter()
            .any(|code| code.eq_ignore_ascii_case(exchange))
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Country {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.to_lowercase().replace([' ', '-', '_'], "");

        let country = match normalized.as_str() {
            "unitedkingdom" | "uk" | "gb" | "greatbritain" => Self::UnitedKingdom,
            "unitedstates" | "us" | "usa" => Self::UnitedStates,
            "germany" | "de" => Self::Germany,
            "france" | "fr" => Self::France,
            _ => return Err(DataError::UnknownCountry(s.to_string())),
        };

        Ok(country)
    }
}

/// A tradable instrument returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Ticker symbol.
    pub symbol: String,
    /// Display name reported by the service.
    pub name: String,
    /// Exchange code.
    pub exchange: String,
}

/// One day's percentage change relative to the prior close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyChange {
    /// Trading date.
    pub date: NaiveDate,
    /// Percentage change, e.g. `1.25` for +1.25%.
    pub change_pct: f64,
}

impl DailyChange {
    /// Create a new daily change.
    pub const fn new(date: NaiveDate, change_pct: f64) -> Self {
        Self { date, change_pct }
    }
}

/// A financial-data service capable of symbol search and history retrieval.
pub trait MarketDataSource {
    /// Return the single best match for `query` among `asset_class` listings in `country`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NoMatch`] when nothing qualifies, or the underlying
    /// service error.
    fn search(
        &self,
        query: &str,
        asset_class: AssetClass,
        country: Country,
    ) -> impl Future<Output = Result<Instrument>>;

    /// Fetch daily percentage changes for `symbol` between `start` and `end` inclusive.
    ///
    /// Ordering of the returned series is unspecified.
    fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<DailyChange>>>;
}

/// Convert a series of closing prices into daily percentage changes.
///
/// `closes` must be ordered ascending by date. The first entry only serves as
/// the base for the second and produces no change of its own. Entries with a
/// non-positive previous close are dropped.
pub fn percentage_changes(closes: &[(NaiveDate, f64)]) -> Vec<DailyChange> {
    closes
        .windows(2)
        .filter_map(|pair| {
            let (_, prev) = pair[0];
            let (date, close) = pair[1];
            (prev > 0.0 && close.is_finite())
                .then(|| DailyChange::new(date, (close / prev - 1.0) * 100.0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, day).unwrap()
    }

    #[rstest]
    #[case("united kingdom", Country::UnitedKingdom)]
    #[case("UK", Country::UnitedKingdom)]
    #[case("United-States", Country::UnitedStates)]
    #[case("germany", Country::Germany)]
    #[case("FR", Country::France)]
    fn test_country_from_str(#[case] input: &str, #[case] expected: Country) {
        assert_eq!(input.parse::<Country>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_country() {
        let err = "atlantis".parse::<Country>().unwrap_err();
        assert!(matches!(err, DataError::UnknownCountry(_)));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_country_exchanges() {
        assert!(Country::UnitedKingdom.lists_on("LSE"));
        assert!(Country::UnitedKingdom.lists_on("lse"));
        assert!(!Country::UnitedKingdom.lists_on("NMS"));
        assert!(Country::UnitedStates.lists_on("NMS"));
    }

    #[test]
    fn test_percentage_changes() {
        let closes = vec![(d(1), 100.0), (d(2), 102.0), (d(3), 96.9)];
        let changes = percentage_changes(&closes);

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].date, d(2));
        assert_relative_eq!(changes[0].change_pct, 2.0, epsilon = 1e-9);
        assert_eq!(changes[1].date, d(3));
        assert_relative_eq!(changes[1].change_pct, -5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_percentage_changes_skips_zero_base() {
        let closes = vec![(d(1), 0.0), (d(2), 10.0), (d(3), 11.0)];
        let changes = percentage_changes(&closes);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].date, d(3));
    }

    #[test]
    fn test_percentage_changes_short_input() {
        assert!(percentage_changes(&[]).is_empty());
        assert!(percentage_changes(&[(d(1), 10.0)]).is_empty());
    }
}
