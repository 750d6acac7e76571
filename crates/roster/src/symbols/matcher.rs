//! Join membership history with resolved symbols.

use super::resolver::SymbolMapping;
use crate::universe::MembershipTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Records joined per batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// A membership record enriched with its company's symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedConstituent {
    /// Sampling date.
    pub date: NaiveDate,
    /// Company display name.
    pub company: String,
    /// Resolved ticker.
    pub symbol: String,
}

/// Inner-join `table` with `mappings` on company name.
///
/// Companies with no mapping, or with an empty symbol, are dropped. Records
/// are processed `batch_size` at a time (a size of zero is treated as one);
/// the result is the same for every batch size and keeps table order.
pub fn match_constituents(
    table: &MembershipTable,
    mappings: &[SymbolMapping],
    batch_size: usize,
) -> Vec<MatchedConstituent> {
    let lookup: HashMap<&str, &str> = mappings
        .iter()
        .filter(|m| m.is_resolved())
        .map(|m| (m.company.as_str(), m.symbol.as_str()))
        .collect();

    let mut matched = Vec::new();
    for batch in table.records().chunks(batch_size.max(1)) {
        matched.extend(batch.iter().filter_map(|record| {
            lookup
                .get(record.company.as_str())
                .map(|symbol| MatchedConstituent {
                    date: record.date,
                    company: record.company.clone(),
                    symbol: (*symbol).to_string(),
                })
        }));
    }

    info!(
        records = table.len(),
        matched = matched.len(),
        "Matched constituents with their symbols"
    );

    matched
}

/// Distinct symbols in first-seen order.
pub fn unique_symbols(matched: &[MatchedConstituent]) -> Vec<String> {
    let mut seen = HashSet::new();
    matched
        .iter()
        .filter(|m| seen.insert(m.symbol.as_str()))
        .map(|m| m.symbol.clone())
        .collect()
}
