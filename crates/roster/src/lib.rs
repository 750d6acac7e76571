#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/roster/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod call;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod returns;
pub mod symbols;
pub mod universe;
pub mod window;

// Re-export the data crate
pub use roster_data as data;

pub use error::{Result, RosterError};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput, PipelineReport};
pub use progress::{NoProgress, Progress, Stage};
pub use returns::{FetchConfig, ReturnsOutcome, ReturnsTable, SkippedSymbol, aggregate_returns};
pub use symbols::{
    MatchedConstituent, Resolution, ResolutionError, ResolverConfig, SymbolMapping,
    match_constituents, resolve_symbols, unique_symbols,
};
pub use universe::{MembershipTable, Universe, common_constituents};
pub use window::{DateWindow, end_of_month, months_between};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
