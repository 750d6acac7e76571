//! Index membership records and their CSV input.
//!
//! The membership table is produced by an external scraper: one row per
//! `(date, company)` pair the company was an index constituent. Only the
//! `Date` and `Company` columns are read; anything else in the file is
//! ignored.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Date format accepted everywhere in Roster.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`DataError::InvalidDate`] for anything else.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| DataError::InvalidDate {
        value: value.to_string(),
    })
}

/// A company's presence in the index on a given date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MembershipRecord {
    /// Sampling date.
    pub date: NaiveDate,
    /// Company display name.
    pub company: String,
}

impl MembershipRecord {
    /// Create a new membership record.
    pub fn new(date: NaiveDate, company: impl Into<String>) -> Self {
        Self {
            date,
            company: company.into(),
        }
    }
}

/// Read membership records from a CSV file.
///
/// # Errors
///
/// Fails if the file cannot be opened, lacks a `Date` or `Company` column, or
/// holds a non-blank date that does not parse.
pub fn read_membership_csv(path: &Path) -> Result<Vec<MembershipRecord>> {
    let file = File::open(path)?;
    let records = read_membership(file)?;
    info!(
        path = %path.display(),
        rows = records.len(),
        "Loaded membership table"
    );
    Ok(records)
}

/// Read membership records from any CSV source.
///
/// Column names are matched case-insensitively. Rows with a blank date or
/// company are dropped.
///
/// # Errors
///
/// See [`read_membership_csv`].
pub fn read_membership<R: Read>(reader: R) -> Result<Vec<MembershipRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    };
    let date_idx = position("Date")?;
    let company_idx = position("Company")?;

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for row in rdr.records() {
        let row = row?;
        let date = row.get(date_idx).unwrap_or_default();
        let company = row.get(company_idx).unwrap_or_default();

        if date.is_empty() || company.is_empty() {
            dropped += 1;
            continue;
        }

        records.push(MembershipRecord::new(parse_date(date)?, company));
    }

    if dropped > 0 {
        debug!(dropped, "Dropped membership rows with missing fields");
    }

    Ok(records)
}
