//! Index membership history.
//!
//! This module holds the membership table loaded from the external scraper
//! output and the filter that finds companies present throughout a window.

pub mod filter;

pub use filter::{common_constituents, presence_counts};
pub use roster_data::MembershipRecord;

use crate::window::DateWindow;
use std::collections::HashSet;

/// Trait for sets of index constituents.
pub trait Universe {
    /// Distinct company names, in first-seen order.
    fn companies(&self) -> Vec<String>;

    /// Check if a company is in the universe.
    fn contains(&self, company: &str) -> bool {
        self.companies().iter().any(|c| c == company)
    }

    /// Get the number of distinct companies.
    fn size(&self) -> usize {
        self.companies().len()
    }
}

/// Every `(date, company)` membership observation for an index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipTable {
    records: Vec<MembershipRecord>,
}

impl MembershipTable {
    /// Create a table from loaded records.
    pub const fn new(records: Vec<MembershipRecord>) -> Self {
        Self { records }
    }

    /// All records, in load order.
    pub fn records(&self) -> &[MembershipRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records dated inside `window`.
    pub fn within<'a>(
        &'a self,
        window: &'a DateWindow,
    ) -> impl Iterator<Item = &'a MembershipRecord> + 'a {
        self.records.iter().filter(|r| window.contains(r.date))
    }

    /// A new table holding only the records dated inside `window`.
    pub fn restrict(&self, window: &DateWindow) -> Self {
        Self::new(self.within(window).cloned().collect())
    }
}

impl Universe for MembershipTable {
    fn companies(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.company.as_str()))
            .map(|r| r.company.clone())
            .collect()
    }
}

impl From<Vec<MembershipRecord>> for MembershipTable {
    fn from(records: Vec<MembershipRecord>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<MembershipRecord> for MembershipTable {
    fn from_iter<I: IntoIterator<Item = MembershipRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
