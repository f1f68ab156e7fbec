use chrono::{NaiveDate, Utc};

/// Source of the current date for defaulted parameters. Injectable so that
/// operations depending on "today" stay deterministic under test.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock implementation used by real callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Test double pinned to a fixed date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
