//! Month-based reporting period.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::{DomainError, DomainResult};

/// Days into a new month during which the previous month is still the default.
pub const DEFAULT_GRACE_PERIOD_DAYS: u32 = 2;

const MIN_YEAR: i32 = 2000;
const MAX_YEAR: i32 = 2100;

/// A reporting window of one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReportingPeriod {
    year: i32,
    month: u32,
}

impl ReportingPeriod {
    pub fn new(year: i32, month: u32) -> DomainResult<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(DomainError::InvalidTimeWindow(format!(
                "Year must be between {MIN_YEAR} and {MAX_YEAR}"
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(DomainError::InvalidTimeWindow(
                "Month must be between 1 and 12".to_string(),
            ));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> DomainResult<Self> {
        Self::new(date.year(), date.month())
    }

    /// Default window for `today`: the previous month while still inside the
    /// grace period at the start of a month, otherwise the current month.
    pub fn default_for(today: NaiveDate, grace_period_days: u32) -> DomainResult<Self> {
        if today.day() <= grace_period_days {
            let (year, month) = if today.month() == 1 {
                (today.year() - 1, 12)
            } else {
                (today.year(), today.month() - 1)
            };
            return Self::new(year, month);
        }
        Self::from_date(today)
    }

    /// The month before `today`'s month, regardless of the day.
    pub fn previous_for(today: NaiveDate) -> DomainResult<Self> {
        Self::default_for(today, 31)
    }

    /// Parse a `YYYY-MM` string.
    pub fn parse_iso(value: &str) -> DomainResult<Self> {
        let malformed =
            || DomainError::InvalidTimeWindow("Time window must be in YYYY-MM format".to_string());

        let (year, month) = value.trim().split_once('-').ok_or_else(malformed)?;
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(malformed());
        }
        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;
        Self::new(year, month)
    }

    pub const fn year(&self) -> i32 {
        self.year
    }

    pub const fn month(&self) -> u32 {
        self.month
    }

    /// `YYYY-MM` representation used for storage and display.
    pub fn to_iso_month(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl TryFrom<String> for ReportingPeriod {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_iso(&value)
    }
}

impl From<ReportingPeriod> for String {
    fn from(period: ReportingPeriod) -> Self {
        period.to_iso_month()
    }
}
