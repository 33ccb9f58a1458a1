//! In-world calendar.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DAYS_PER_MONTH: u32 = 30;
pub const MONTHS_PER_YEAR: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("invalid date {day}/{month}/{year}")]
    Invalid { day: u32, month: u32, year: u32 },

    #[error("world date cannot move backwards from {from} to {to}")]
    Regression { from: WorldDate, to: WorldDate },
}

/// Calendar triple. Months have 30 days, years have 12 months.
///
/// Field order matters: the derived ordering compares year, then month, then day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorldDate {
    pub year: u32,
    pub month: u32,
    pub day: u32,
}

impl WorldDate {
    /// The latest date the calendar can hold.
    pub const LAST: WorldDate = WorldDate {
        year: u32::MAX,
        month: MONTHS_PER_YEAR,
        day: DAYS_PER_MONTH,
    };

    pub fn new(day: u32, month: u32, year: u32) -> Result<Self, DateError> {
        let date = Self { year, month, day };
        if date.is_valid() {
            Ok(date)
        } else {
            Err(DateError::Invalid { day, month, year })
        }
    }

    pub fn is_valid(&self) -> bool {
        (1..=DAYS_PER_MONTH).contains(&self.day)
            && (1..=MONTHS_PER_YEAR).contains(&self.month)
            && self.year >= 1
    }

    /// The date `days` later, rolling over months and years.
    pub fn add_days(&self, days: u32) -> Self {
        let ordinal = self.ordinal() + u64::from(days);
        Self::from_ordinal(ordinal)
    }

    /// Days elapsed from `self` to `later`, or 0 if `later` is not after `self`.
    pub fn days_until(&self, later: &WorldDate) -> u64 {
        later.ordinal().saturating_sub(self.ordinal())
    }

    fn ordinal(&self) -> u64 {
        let days_per_year = u64::from(DAYS_PER_MONTH * MONTHS_PER_YEAR);
        u64::from(self.year.saturating_sub(1)) * days_per_year
            + u64::from(self.month.saturating_sub(1)) * u64::from(DAYS_PER_MONTH)
            + u64::from(self.day.saturating_sub(1))
    }

    /// Dates past the last representable year stop at its final day.
    fn from_ordinal(ordinal: u64) -> Self {
        let days_per_year = u64::from(DAYS_PER_MONTH * MONTHS_PER_YEAR);
        let Ok(year) = u32::try_from(ordinal / days_per_year + 1) else {
            return Self::LAST;
        };
        let rest = (ordinal % days_per_year) as u32;
        Self {
            year,
            month: rest / DAYS_PER_MONTH + 1,
            day: rest % DAYS_PER_MONTH + 1,
        }
    }
}

impl Default for WorldDate {
    fn default() -> Self {
        Self {
            year: 1,
            month: 1,
            day: 1,
        }
    }
}

impl std::fmt::Display for WorldDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "day {}, month {}, year {}", self.day, self.month, self.year)
    }
}
