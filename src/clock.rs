//! Time source.
//!
//! Age, licence, rest and staleness checks all read "now" through the
//! `Clock` trait so that tests can pin the date.

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Source of the current track-local date and time.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Today's date according to a clock.
pub fn today(clock: &dyn Clock) -> NaiveDate {
    clock.now().date()
}

/// Wall clock in the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock stopped at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Noon on the given date.
    pub fn on(date: NaiveDate) -> Self {
        Self(date.and_hms_opt(12, 0, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Whole years elapsed between `born` and `on` (0 if `on` precedes `born`).
pub fn age_in_years(born: NaiveDate, on: NaiveDate) -> u32 {
    on.years_since(born).unwrap_or(0)
}
