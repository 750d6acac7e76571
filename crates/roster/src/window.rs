//! Date windows and month counting.
//!
//! Month counts are inclusive of both the start and the end month. A window
//! from 2014-01-31 to 2014-12-31 spans twelve months. No day-level rounding
//! is applied: an end date of 2015-01-01 counts January 2015 as a thirteenth
//! month, so windows are expected to end on the last day of a month.

use crate::error::{Result, RosterError};
use chrono::{Datelike, Months, NaiveDate};
use roster_data::parse_date;
use std::fmt;

/// Number of calendar months touched by `[start, end]`, counting both ends.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32) + 1
}

/// Last day of the month containing `date`.
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// A closed date interval `[start, end]` with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Create a window.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::InvalidWindow`] if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(RosterError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Create a window from two `YYYY-MM-DD` strings.
    ///
    /// # Errors
    ///
    /// Fails if either string is not a valid date, or the dates are reversed.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// First day of the window.
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the window.
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive month count; the expected number of monthly samples.
    pub fn months(&self) -> usize {
        // start <= end, so the count is at least one
        months_between(self.start, self.end) as usize
    }

    /// Whether `date` falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Whether the end date is the last day of its month.
    pub fn ends_on_month_end(&self) -> bool {
        end_of_month(self.end) == self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}
