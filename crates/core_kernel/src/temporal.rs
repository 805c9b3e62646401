//! Financial period and date-range types
//!
//! Transaction and document dates must fall inside the currently open
//! financial period; the period is looked up by a collaborator and handed to
//! the engine as data, never queried through ambient state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifiers::PeriodId;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid period: start {start} must not be after end {end}")]
    InvalidPeriod { start: String, end: String },

    #[error("Financial period {0} is closed")]
    PeriodClosed(String),
}

/// An inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TemporalError> {
        if start > end {
            return Err(TemporalError::InvalidPeriod {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// A tenant's financial (accounting) period
///
/// Postings are only accepted while the period is open. Closing is a
/// one-way operation performed by period-end processing outside this core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialPeriod {
    pub id: PeriodId,
    pub range: DateRange,
    /// When the period was closed, None while open
    pub closed_at: Option<DateTime<Utc>>,
}

impl FinancialPeriod {
    /// Creates an open period spanning the given range
    pub fn open(id: PeriodId, range: DateRange) -> Self {
        Self {
            id,
            range,
            closed_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Returns true if the period is open and the date falls inside it
    pub fn accepts(&self, date: NaiveDate) -> bool {
        self.is_open() && self.range.contains(date)
    }

    /// Closes the period
    pub fn close(&mut self) -> Result<(), TemporalError> {
        if !self.is_open() {
            return Err(TemporalError::PeriodClosed(self.id.to_string()));
        }
        self.closed_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        assert!(DateRange::new(date(2026, 2, 1), date(2026, 1, 1)).is_err());
    }

    #[test]
    fn range_contains_is_inclusive() {
        let range = DateRange::new(date(2026, 1, 1), date(2026, 1, 31)).unwrap();
        assert!(range.contains(date(2026, 1, 1)));
        assert!(range.contains(date(2026, 1, 31)));
        assert!(!range.contains(date(2026, 2, 1)));
    }

    #[test]
    fn closed_period_accepts_nothing() {
        let range = DateRange::new(date(2026, 1, 1), date(2026, 1, 31)).unwrap();
        let mut period = FinancialPeriod::open(PeriodId::new(), range);
        assert!(period.accepts(date(2026, 1, 15)));

        period.close().unwrap();
        assert!(!period.accepts(date(2026, 1, 15)));
        assert!(period.close().is_err());
    }
}
