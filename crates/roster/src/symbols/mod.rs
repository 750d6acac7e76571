//! Symbol resolution and matching.

pub mod matcher;
pub mod resolver;

pub use matcher::{DEFAULT_BATCH_SIZE, MatchedConstituent, match_constituents, unique_symbols};
pub use resolver::{
    DEFAULT_CALL_TIMEOUT, Resolution, ResolutionError, ResolverConfig, SymbolMapping,
    resolve_symbols,
};
