//! Company name to ticker symbol resolution.
//!
//! Each distinct company is searched once. A failed search never stops the
//! batch: the company gets an empty symbol and an entry in the error list.

use crate::call::with_timeout;
use crate::progress::{Progress, Stage};
use futures::stream::{self, StreamExt};
use roster_data::{AssetClass, Country, DataError, MarketDataSource};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default limit for a single external call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// A company and the symbol it resolved to. An empty symbol means the lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMapping {
    /// Company display name.
    pub company: String,
    /// Resolved ticker, or empty.
    pub symbol: String,
}

impl SymbolMapping {
    /// Create a mapping.
    pub fn new(company: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            symbol: symbol.into(),
        }
    }

    /// Create a mapping for a company that could not be resolved.
    pub fn unresolved(company: impl Into<String>) -> Self {
        Self::new(company, String::new())
    }

    /// Whether a symbol was found.
    pub fn is_resolved(&self) -> bool {
        !self.symbol.is_empty()
    }
}

/// A company whose symbol could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionError {
    /// Company display name.
    pub company: String,
    /// Why the lookup failed.
    pub reason: String,
}

/// Outcome of resolving a batch of companies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// One mapping per distinct input company, in input order.
    pub mappings: Vec<SymbolMapping>,
    /// Companies that failed, in input order.
    pub errors: Vec<ResolutionError>,
}

impl Resolution {
    /// Mappings with a non-empty symbol.
    pub fn resolved(&self) -> impl Iterator<Item = &SymbolMapping> {
        self.mappings.iter().filter(|m| m.is_resolved())
    }
}

/// Search scope and call limits for resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Asset class searched.
    pub asset_class: AssetClass,
    /// Country whose listings are searched.
    pub country: Country,
    /// Maximum lookups in flight.
    pub concurrency: usize,
    /// Limit for each lookup.
    pub call_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            asset_class: AssetClass::Equity,
            country: Country::UnitedKingdom,
            concurrency: 1,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Distinct values in first-seen order.
pub(crate) fn distinct(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}

/// Resolve every distinct company in `companies` to a ticker symbol.
pub async fn resolve_symbols<S: MarketDataSource>(
    source: &S,
    companies: &[String],
    config: &ResolverConfig,
    progress: &dyn Progress,
) -> Resolution {
    let companies = distinct(companies);
    progress.begin(Stage::Resolve, companies.len());
    info!(
        companies = companies.len(),
        country = %config.country,
        "Resolving constituent symbols"
    );

    let outcomes: Vec<(String, roster_data::Result<String>)> = stream::iter(companies)
        .map(|company| async move {
            let lookup = source.search(&company, config.asset_class, config.country);
            let outcome = with_timeout(config.call_timeout, "searching", lookup)
                .await
                .and_then(|instrument| {
                    if instrument.symbol.is_empty() {
                        Err(DataError::InvalidSymbol(format!(
                            "empty symbol returned for '{company}'"
                        )))
                    } else {
                        Ok(instrument.symbol)
                    }
                });
            progress.advance(&company);
            (company, outcome)
        })
        .buffered(config.concurrency.max(1))
        .collect()
        .await;

    let mut resolution = Resolution::default();
    for (company, outcome) in outcomes {
        match outcome {
            Ok(symbol) => {
                debug!(company = %company, symbol = %symbol, "Resolved symbol");
                resolution.mappings.push(SymbolMapping::new(company, symbol));
            }
            Err(e) => {
                warn!(company = %company, error = %e, "Symbol resolution failed");
                resolution.errors.push(ResolutionError {
                    company: company.clone(),
                    reason: e.to_string(),
                });
                resolution.mappings.push(SymbolMapping::unresolved(company));
            }
        }
    }

    progress.finish(Stage::Resolve);
    info!(
        resolved = resolution.mappings.len() - resolution.errors.len(),
        failed = resolution.errors.len(),
        "Done resolving symbols"
    );

    resolution
}
