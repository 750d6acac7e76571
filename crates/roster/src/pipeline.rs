//! End-to-end run over an in-memory membership table.
//!
//! The stages run in order: filter the constituents present for the whole
//! window, resolve their symbols, match the membership history against the
//! resolved symbols, then fetch and merge daily returns. Per-item failures are
//! collected in the output; nothing here aborts.

use crate::progress::Progress;
use crate::returns::{FetchConfig, ReturnsTable, SkippedSymbol, aggregate_returns};
use crate::symbols::{
    DEFAULT_BATCH_SIZE, DEFAULT_CALL_TIMEOUT, MatchedConstituent, Resolution, ResolverConfig,
    match_constituents, resolve_symbols, unique_symbols,
};
use crate::universe::{MembershipTable, common_constituents};
use crate::window::DateWindow;
use roster_data::{AssetClass, Country, MarketDataSource};
use std::fmt;
use std::time::Duration;
use tracing::info;

/// Settings for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Country whose listings symbols are resolved against.
    pub country: Country,
    /// Asset class searched.
    pub asset_class: AssetClass,
    /// Records per matcher batch.
    pub batch_size: usize,
    /// Maximum external calls in flight.
    pub concurrency: usize,
    /// Limit for each external call.
    pub call_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            country: Country::UnitedKingdom,
            asset_class: AssetClass::Equity,
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: 1,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl PipelineConfig {
    /// Settings for the resolution stage.
    pub const fn resolver(&self) -> ResolverConfig {
        ResolverConfig {
            asset_class: self.asset_class,
            country: self.country,
            concurrency: self.concurrency,
            call_timeout: self.call_timeout,
        }
    }

    /// Settings for the fetch stage.
    pub const fn fetch(&self) -> FetchConfig {
        FetchConfig {
            concurrency: self.concurrency,
            call_timeout: self.call_timeout,
        }
    }
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The window the run covered.
    pub window: DateWindow,
    /// Companies present for the whole window.
    pub constituents: Vec<String>,
    /// Symbol mappings and resolution failures.
    pub resolution: Resolution,
    /// Membership history joined with resolved symbols.
    pub matched: Vec<MatchedConstituent>,
    /// Merged daily returns.
    pub returns: ReturnsTable,
    /// Symbols left out of the returns table.
    pub skipped: Vec<SkippedSymbol>,
}

impl PipelineOutput {
    /// Counts describing the run.
    pub fn report(&self) -> PipelineReport {
        let unresolved = self.resolution.errors.len();
        let symbols_requested = unique_symbols(&self.matched).len();
        PipelineReport {
            window: self.window,
            months: self.window.months(),
            constituents: self.constituents.len(),
            resolved: self.resolution.mappings.len() - unresolved,
            unresolved,
            matched_rows: self.matched.len(),
            symbols_requested,
            symbols_fetched: self.returns.width(),
            symbols_skipped: self.skipped.len(),
            trading_days: self.returns.height(),
        }
    }
}

/// Summary counts of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
    /// Window covered.
    pub window: DateWindow,
    /// Months in the window.
    pub months: usize,
    /// Companies present for the whole window.
    pub constituents: usize,
    /// Companies with a symbol.
    pub resolved: usize,
    /// Companies without a symbol.
    pub unresolved: usize,
    /// Matched membership rows.
    pub matched_rows: usize,
    /// Distinct symbols whose history was requested.
    pub symbols_requested: usize,
    /// Symbols with a returns column.
    pub symbols_fetched: usize,
    /// Symbols skipped after a failed fetch.
    pub symbols_skipped: usize,
    /// Rows in the returns table.
    pub trading_days: usize,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Window:              {} ({} months)", self.window, self.months)?;
        writeln!(f, "Common constituents: {}", self.constituents)?;
        writeln!(
            f,
            "Symbols resolved:    {} ({} unresolved)",
            self.resolved, self.unresolved
        )?;
        writeln!(f, "Matched rows:        {}", self.matched_rows)?;
        writeln!(
            f,
            "Returns columns:     {} of {} ({} skipped)",
            self.symbols_fetched, self.symbols_requested, self.symbols_skipped
        )?;
        write!(f, "Trading days:        {}", self.trading_days)
    }
}

/// Runs the constituent returns pipeline against a market data source.
#[derive(Debug)]
pub struct Pipeline<'a, S> {
    source: &'a S,
    config: PipelineConfig,
}

impl<'a, S: MarketDataSource> Pipeline<'a, S> {
    /// Create a pipeline over `source`.
    pub const fn new(source: &'a S, config: PipelineConfig) -> Self {
        Self { source, config }
    }

    /// The run settings.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage for `window`.
    pub async fn run(
        &self,
        table: &MembershipTable,
        window: DateWindow,
        progress: &dyn Progress,
    ) -> PipelineOutput {
        info!(window = %window, records = table.len(), "Starting run");

        let constituents = common_constituents(table, &window);

        let resolution = resolve_symbols(
            self.source,
            &constituents,
            &self.config.resolver(),
            progress,
        )
        .await;

        let matched = match_constituents(table, &resolution.mappings, self.config.batch_size);
        let symbols = unique_symbols(&matched);

        let outcome =
            aggregate_returns(self.source, &symbols, &window, &self.config.fetch(), progress)
                .await;

        info!("Run complete");

        PipelineOutput {
            window,
            constituents,
            resolution,
            matched,
            returns: outcome.table,
            skipped: outcome.skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.country, Country::UnitedKingdom);
        assert_eq!(config.asset_class, AssetClass::Equity);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.call_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_stage_configs_follow_pipeline_config() {
        let config = PipelineConfig {
            country: Country::Germany,
            concurrency: 4,
            call_timeout: Duration::from_secs(5),
            ..PipelineConfig::default()
        };

        let resolver = config.resolver();
        assert_eq!(resolver.country, Country::Germany);
        assert_eq!(resolver.concurrency, 4);

        let fetch = config.fetch();
        assert_eq!(fetch.concurrency, 4);
        assert_eq!(fetch.call_timeout, Duration::from_secs(5));
    }
}
