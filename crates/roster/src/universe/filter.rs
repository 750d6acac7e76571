//! Companies present for the whole of a date window.
//!
//! Membership is assumed to be sampled once per month. A company qualifies
//! when its number of observations inside the window equals the window's
//! month count exactly. Tables sampled at any other frequency therefore yield
//! no common constituents at all.

use super::MembershipTable;
use crate::window::DateWindow;
use std::collections::BTreeMap;
use tracing::info;

/// Observations per company inside `window`, keyed by company name.
///
/// Records with a blank company are ignored.
pub fn presence_counts(table: &MembershipTable, window: &DateWindow) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in table.within(window) {
        if record.company.trim().is_empty() {
            continue;
        }
        *counts.entry(record.company.clone()).or_insert(0) += 1;
    }
    counts
}

/// Companies observed in every month of `window`, sorted by name.
pub fn common_constituents(table: &MembershipTable, window: &DateWindow) -> Vec<String> {
    let expected = window.months();
    let counts = presence_counts(table, window);
    let seen = counts.len();

    let common: Vec<String> = counts
        .into_iter()
        .filter_map(|(company, count)| (count == expected).then_some(company))
        .collect();

    info!(
        window = %window,
        months = expected,
        seen,
        common = common.len(),
        "Filtered common constituents"
    );

    common
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::universe::MembershipRecord;
    use chrono::{Datelike, NaiveDate};

    fn month_end(m: u32) -> NaiveDate {
        crate::window::end_of_month(NaiveDate::from_ymd_opt(2020, m, 1).unwrap())
    }

    fn window(first: u32, last: u32) -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2020, first, 1).unwrap(),
            month_end(last),
        )
        .unwrap()
    }

    fn records(company: &str, months: impl IntoIterator<Item = u32>) -> Vec<MembershipRecord> {
        months
            .into_iter()
            .map(|m| MembershipRecord::new(month_end(m), company))
            .collect()
    }

    #[test]
    fn test_full_presence_required() {
        let mut rows = records("A", 1..=6);
        rows.extend(records("B", [1, 2, 3, 5, 6]));
        let table = MembershipTable::new(rows);

        assert_eq!(common_constituents(&table, &window(1, 6)), vec!["A"]);
    }

    #[test]
    fn test_row_order_invariance() {
        let mut rows = records("A", 1..=3);
        rows.extend(records("B", 1..=3));
        rows.extend(records("C", [1, 3]));
        let forward = MembershipTable::new(rows.clone());
        rows.reverse();
        rows.swap(0, 4);
        let shuffled = MembershipTable::new(rows);

        let w = window(1, 3);
        assert_eq!(common_constituents(&forward, &w), vec!["A", "B"]);
        assert_eq!(
            common_constituents(&forward, &w),
            common_constituents(&shuffled, &w)
        );
    }

    #[test]
    fn test_records_outside_window_ignored() {
        let mut rows = records("A", 1..=12);
        rows.extend(records("B", 4..=6));
        let table = MembershipTable::new(rows);

        assert_eq!(common_constituents(&table, &window(4, 6)), vec!["A", "B"]);
    }

    #[test]
    fn test_exact_match_excludes_oversampled() {
        // Two observations in one month: four rows for a three month window.
        let mut rows = records("A", 1..=3);
        rows.push(MembershipRecord::new(
            NaiveDate::from_ymd_opt(2020, 2, 14).unwrap(),
            "A",
        ));
        rows.extend(records("B", 1..=3));
        let table = MembershipTable::new(rows);

        assert_eq!(common_constituents(&table, &window(1, 3)), vec!["B"]);
    }

    #[test]
    fn test_weekly_sampling_yields_nothing() {
        let rows: Vec<MembershipRecord> = (0..13)
            .map(|week| {
                MembershipRecord::new(
                    NaiveDate::from_ymd_opt(2020, 1, 3).unwrap() + chrono::Duration::weeks(week),
                    "A",
                )
            })
            .collect();
        assert!(rows.iter().all(|r| r.date.month() <= 4));
        let table = MembershipTable::new(rows);

        assert!(common_constituents(&table, &window(1, 3)).is_empty());
    }

    #[test]
    fn test_blank_company_dropped() {
        let mut rows = records("A", 1..=2);
        rows.extend(records("  ", 1..=2));
        let table = MembershipTable::new(rows);

        let counts = presence_counts(&table, &window(1, 2));
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get("A"), Some(&2));
    }

    #[test]
    fn test_results_subset_of_table() {
        let mut rows = records("A", 1..=3);
        rows.extend(records("B", 1..=3));
        let table = MembershipTable::new(rows);

        for company in common_constituents(&table, &window(1, 3)) {
            assert!(table.records().iter().any(|r| r.company == company));
        }
    }
}
