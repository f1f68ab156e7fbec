use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IntervalUnit {
    Day,
    Week,
    Month,
}

/// Declarative repeat pattern for a planned transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecurrenceType {
    /// Single occurrence on the start date.
    None,
    Daily,
    Weekly,
    Monthly,
    /// Every `every` units, e.g. every 10 days or every 2 months.
    EveryN { every: u32, unit: IntervalUnit },
}

/// Set of weekday flags constraining which days of the week a weekly rule
/// may fire on. Stored as a bitmask indexed from Monday.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);

    pub fn from_days(days: &[Weekday]) -> Self {
        let mut set = WeekdaySet::EMPTY;
        for day in days {
            set.insert(*day);
        }
        set
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RecurrenceEnd {
    #[default]
    Never,
    OnDate(NaiveDate),
    AfterOccurrences(u32),
}

/// Repeat rule owned by a planned transaction. Validated at creation time;
/// materialization assumes a valid rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub recurrence: RecurrenceType,
    #[serde(default)]
    pub weekdays: WeekdaySet,
    #[serde(default)]
    pub only_workdays: bool,
    #[serde(default)]
    pub end: RecurrenceEnd,
}

impl RecurrenceRule {
    pub fn new(recurrence: RecurrenceType) -> Self {
        Self {
            recurrence,
            weekdays: WeekdaySet::EMPTY,
            only_workdays: false,
            end: RecurrenceEnd::Never,
        }
    }

    pub fn with_weekdays(mut self, days: &[Weekday]) -> Self {
        self.weekdays = WeekdaySet::from_days(days);
        self
    }

    pub fn with_end(mut self, end: RecurrenceEnd) -> Self {
        self.end = end;
        self
    }

    pub fn workdays_only(mut self) -> Self {
        self.only_workdays = true;
        self
    }

    /// Checks structural constraints: a positive interval, and weekday
    /// flags only on rules that step in weeks.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if let RecurrenceType::EveryN { every, .. } = self.recurrence {
            if every == 0 {
                return Err(LedgerError::Validation(
                    "recurrence interval must be at least 1".into(),
                ));
            }
        }
        if !self.weekdays.is_empty() && !self.steps_in_weeks() {
            return Err(LedgerError::Validation(
                "weekday constraints are only valid for weekly rules".into(),
            ));
        }
        if let RecurrenceEnd::AfterOccurrences(0) = self.end {
            return Err(LedgerError::Validation(
                "occurrence count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Checks the rule against the owning transaction's start date.
    pub fn validate_against(&self, start_date: NaiveDate) -> Result<(), LedgerError> {
        self.validate()?;
        if let RecurrenceEnd::OnDate(end_date) = self.end {
            if end_date < start_date {
                return Err(LedgerError::Validation(format!(
                    "end date {end_date} precedes start date {start_date}"
                )));
            }
        }
        Ok(())
    }

    pub fn steps_in_weeks(&self) -> bool {
        matches!(
            self.recurrence,
            RecurrenceType::Weekly
                | RecurrenceType::EveryN {
                    unit: IntervalUnit::Week,
                    ..
                }
        )
    }

    /// Whether the candidate at `sequence`/`date` is still inside the end
    /// condition. The date checked is the rule date, before any workday
    /// shift, so shifting cannot extend a series past its declared end.
    pub fn allows(&self, sequence: u32, date: NaiveDate) -> bool {
        match &self.end {
            RecurrenceEnd::Never => true,
            RecurrenceEnd::OnDate(end_date) => date <= *end_date,
            RecurrenceEnd::AfterOccurrences(limit) => sequence < *limit,
        }
    }
}

/// Steps `months` whole months forward from `anchor`, clamping to the last
/// valid day of shorter months (Jan 31 + 1 month is Feb 28/29).
pub fn step_months(anchor: NaiveDate, months: u32) -> NaiveDate {
    let mut year = anchor.year();
    let mut month = anchor.month() as i32 + months as i32;
    while month > 12 {
        month -= 12;
        year += 1;
    }
    let day = anchor.day().min(days_in_month(year, month as u32));
    NaiveDate::from_ymd_opt(year, month as u32, day).unwrap_or(anchor)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 28).unwrap());
    (first_next - Duration::days(1)).day()
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The next non-weekend date at or after `date`.
pub fn next_workday(date: NaiveDate) -> NaiveDate {
    let mut candidate = date;
    while is_weekend(candidate) {
        candidate += Duration::days(1);
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_step_clamps_to_short_months() {
        let anchor = date(2024, 1, 31);
        assert_eq!(step_months(anchor, 1), date(2024, 2, 29));
        assert_eq!(step_months(anchor, 2), date(2024, 3, 31));
        assert_eq!(step_months(date(2023, 1, 31), 1), date(2023, 2, 28));
        assert_eq!(step_months(date(2024, 11, 30), 3), date(2025, 2, 28));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let rule = RecurrenceRule::new(RecurrenceType::EveryN {
            every: 0,
            unit: IntervalUnit::Day,
        });
        let err = rule.validate().expect_err("zero interval must fail");
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn weekdays_require_weekly_stepping() {
        let rule = RecurrenceRule::new(RecurrenceType::Monthly).with_weekdays(&[Weekday::Mon]);
        assert!(rule.validate().is_err());

        let rule = RecurrenceRule::new(RecurrenceType::Weekly).with_weekdays(&[Weekday::Mon]);
        assert!(rule.validate().is_ok());

        let rule = RecurrenceRule::new(RecurrenceType::EveryN {
            every: 2,
            unit: IntervalUnit::Week,
        })
        .with_weekdays(&[Weekday::Fri]);
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn end_date_must_not_precede_start() {
        let rule = RecurrenceRule::new(RecurrenceType::Daily)
            .with_end(RecurrenceEnd::OnDate(date(2024, 1, 1)));
        assert!(rule.validate_against(date(2024, 2, 1)).is_err());
        assert!(rule.validate_against(date(2023, 12, 1)).is_ok());
    }

    #[test]
    fn weekday_set_membership() {
        let set = WeekdaySet::from_days(&[Weekday::Mon, Weekday::Fri]);
        assert!(set.contains(Weekday::Mon));
        assert!(set.contains(Weekday::Fri));
        assert!(!set.contains(Weekday::Tue));
        assert!(!WeekdaySet::EMPTY.contains(Weekday::Mon));
    }

    #[test]
    fn workday_helper_skips_weekends() {
        assert_eq!(next_workday(date(2024, 1, 6)), date(2024, 1, 8));
        assert_eq!(next_workday(date(2024, 1, 7)), date(2024, 1, 8));
        assert_eq!(next_workday(date(2024, 1, 8)), date(2024, 1, 8));
    }
}
