use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};

use super::ledger::DateWindow;
use super::planned::{PlannedOccurrence, PlannedTransaction};
use super::recurrence::{
    is_weekend, next_workday, step_months, IntervalUnit, RecurrenceRule, RecurrenceType,
};

/// Hard cap on occurrences produced by a single materialization run.
pub const MAX_OCCURRENCES_PER_RUN: usize = 1024;

/// A rule date before windowing and workday shifting. `sequence` is the
/// monotone occurrence index counted from the rule's start date.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    sequence: u32,
    date: NaiveDate,
}

/// Expands the planned transaction's rule over `[start_date, window.end]`
/// and returns the occurrences inside `window` that do not exist yet.
///
/// Candidates are always enumerated from the rule's start date, so the
/// occurrence sequence is stable across arbitrary windows; re-running over
/// an overlapping window re-derives the same candidates and skips the ones
/// already materialized. Count-based end conditions therefore terminate
/// after exactly `n` occurrences ever, regardless of how the visible
/// window scrolls.
pub fn materialize_occurrences(
    planned: &PlannedTransaction,
    existing: &[&PlannedOccurrence],
    window: DateWindow,
    max_per_run: usize,
) -> Vec<PlannedOccurrence> {
    if !planned.active {
        return Vec::new();
    }
    let one_shot = RecurrenceRule::new(RecurrenceType::None);
    let rule = planned.rule.as_ref().unwrap_or(&one_shot);
    let cap = max_per_run.min(MAX_OCCURRENCES_PER_RUN).max(1);

    let mut seen_sequences: BTreeSet<u32> =
        existing.iter().map(|occurrence| occurrence.sequence).collect();
    let mut taken_dates: BTreeSet<NaiveDate> = existing
        .iter()
        .map(|occurrence| occurrence.scheduled_date)
        .collect();

    let mut created = Vec::new();
    for candidate in rule_candidates(rule, planned.start_date, window.end, cap) {
        if seen_sequences.contains(&candidate.sequence) {
            continue;
        }
        let mut date = candidate.date;
        if rule.only_workdays && is_weekend(date) {
            date = next_workday(date);
            // A shifted date must not land on an already-generated one.
            while taken_dates.contains(&date) {
                date = next_workday(date + Duration::days(1));
            }
        }
        if !window.contains(date) {
            continue;
        }
        if taken_dates.contains(&date) {
            continue;
        }
        seen_sequences.insert(candidate.sequence);
        taken_dates.insert(date);
        created.push(PlannedOccurrence::new(
            planned.id,
            candidate.sequence,
            date,
            planned.amount,
        ));
        if created.len() >= cap {
            break;
        }
    }
    created
}

/// Rule dates from `start` up to `until` inclusive, end condition applied
/// to the unshifted date.
fn rule_candidates(
    rule: &RecurrenceRule,
    start: NaiveDate,
    until: NaiveDate,
    cap: usize,
) -> Vec<Candidate> {
    match &rule.recurrence {
        RecurrenceType::None => {
            if start <= until {
                vec![Candidate {
                    sequence: 0,
                    date: start,
                }]
            } else {
                Vec::new()
            }
        }
        RecurrenceType::Daily => linear_candidates(rule, start, 1, until, cap),
        RecurrenceType::Weekly => {
            if rule.weekdays.is_empty() {
                linear_candidates(rule, start, 7, until, cap)
            } else {
                weekday_candidates(rule, start, 1, until, cap)
            }
        }
        RecurrenceType::Monthly => monthly_candidates(rule, start, 1, until, cap),
        RecurrenceType::EveryN { every, unit } => match unit {
            IntervalUnit::Day => linear_candidates(rule, start, *every as i64, until, cap),
            IntervalUnit::Week => {
                if rule.weekdays.is_empty() {
                    linear_candidates(rule, start, *every as i64 * 7, until, cap)
                } else {
                    weekday_candidates(rule, start, *every, until, cap)
                }
            }
            IntervalUnit::Month => monthly_candidates(rule, start, *every, until, cap),
        },
    }
}

fn linear_candidates(
    rule: &RecurrenceRule,
    start: NaiveDate,
    step_days: i64,
    until: NaiveDate,
    cap: usize,
) -> Vec<Candidate> {
    let mut result = Vec::new();
    let mut sequence = 0u32;
    let mut date = start;
    while date <= until && result.len() < cap && rule.allows(sequence, date) {
        result.push(Candidate { sequence, date });
        sequence += 1;
        date += Duration::days(step_days);
    }
    result
}

/// Monthly steps are computed from the anchor each time so a rule anchored
/// on the 31st returns to the 31st after a clamped short month.
fn monthly_candidates(
    rule: &RecurrenceRule,
    start: NaiveDate,
    every_months: u32,
    until: NaiveDate,
    cap: usize,
) -> Vec<Candidate> {
    let mut result = Vec::new();
    let mut sequence = 0u32;
    loop {
        let date = step_months(start, sequence * every_months);
        if date > until || result.len() >= cap || !rule.allows(sequence, date) {
            break;
        }
        result.push(Candidate { sequence, date });
        sequence += 1;
    }
    result
}

/// Day-by-day walk emitting only member weekdays inside interval-aligned
/// weeks. Week zero is the seven days starting at the rule's start date.
fn weekday_candidates(
    rule: &RecurrenceRule,
    start: NaiveDate,
    every_weeks: u32,
    until: NaiveDate,
    cap: usize,
) -> Vec<Candidate> {
    let mut result = Vec::new();
    let mut sequence = 0u32;
    let mut date = start;
    while date <= until && result.len() < cap {
        let week_index = (date - start).num_days().div_euclid(7);
        if week_index % every_weeks as i64 == 0 && rule.weekdays.contains(date.weekday()) {
            if !rule.allows(sequence, date) {
                break;
            }
            result.push(Candidate { sequence, date });
            sequence += 1;
        }
        date += Duration::days(1);
    }
    result
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;
    use crate::ledger::planned::FlowKind;
    use crate::ledger::recurrence::RecurrenceEnd;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window(start: NaiveDate, end: NaiveDate) -> DateWindow {
        DateWindow::new(start, end).unwrap()
    }

    fn planned_with(rule: RecurrenceRule, start: NaiveDate) -> PlannedTransaction {
        PlannedTransaction::new("rent", dec!(500), FlowKind::Expense, start).with_rule(rule)
    }

    fn run(
        planned: &PlannedTransaction,
        existing: &[PlannedOccurrence],
        win: DateWindow,
    ) -> Vec<PlannedOccurrence> {
        let refs: Vec<&PlannedOccurrence> = existing.iter().collect();
        materialize_occurrences(planned, &refs, win, MAX_OCCURRENCES_PER_RUN)
    }

    #[test]
    fn one_shot_rule_emits_start_date_inside_window() {
        let planned = planned_with(
            RecurrenceRule::new(RecurrenceType::None),
            date(2024, 3, 10),
        );
        let created = run(&planned, &[], window(date(2024, 3, 1), date(2024, 3, 31)));
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].scheduled_date, date(2024, 3, 10));

        let outside = run(&planned, &[], window(date(2024, 4, 1), date(2024, 4, 30)));
        assert!(outside.is_empty());
    }

    #[test]
    fn no_rule_behaves_like_one_shot() {
        let planned =
            PlannedTransaction::new("refund", dec!(80), FlowKind::Income, date(2024, 5, 2));
        let created = run(&planned, &[], window(date(2024, 5, 1), date(2024, 5, 31)));
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].sequence, 0);
    }

    #[test]
    fn inactive_template_materializes_nothing() {
        let mut planned = planned_with(RecurrenceRule::new(RecurrenceType::Daily), date(2024, 1, 1));
        planned.active = false;
        let created = run(&planned, &[], window(date(2024, 1, 1), date(2024, 1, 31)));
        assert!(created.is_empty());
    }

    #[test]
    fn weekly_rule_with_weekdays_matches_expected_dates() {
        let rule = RecurrenceRule::new(RecurrenceType::Weekly).with_weekdays(&[
            Weekday::Mon,
            Weekday::Wed,
            Weekday::Fri,
        ]);
        let planned = planned_with(rule, date(2024, 1, 1));
        let created = run(&planned, &[], window(date(2024, 1, 1), date(2024, 1, 15)));
        let dates: Vec<NaiveDate> = created.iter().map(|o| o.scheduled_date).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 1),
                date(2024, 1, 3),
                date(2024, 1, 5),
                date(2024, 1, 8),
                date(2024, 1, 10),
                date(2024, 1, 12),
                date(2024, 1, 15),
            ]
        );
    }

    #[test]
    fn biweekly_weekday_rule_skips_off_weeks() {
        let rule = RecurrenceRule::new(RecurrenceType::EveryN {
            every: 2,
            unit: IntervalUnit::Week,
        })
        .with_weekdays(&[Weekday::Mon]);
        let planned = planned_with(rule, date(2024, 1, 1));
        let created = run(&planned, &[], window(date(2024, 1, 1), date(2024, 2, 5)));
        let dates: Vec<NaiveDate> = created.iter().map(|o| o.scheduled_date).collect();
        assert_eq!(
            dates,
            vec![date(2024, 1, 1), date(2024, 1, 15), date(2024, 1, 29)]
        );
    }

    #[test]
    fn monthly_rule_clamps_to_month_end() {
        let planned = planned_with(
            RecurrenceRule::new(RecurrenceType::Monthly),
            date(2024, 1, 31),
        );
        let created = run(&planned, &[], window(date(2024, 1, 1), date(2024, 4, 30)));
        let dates: Vec<NaiveDate> = created.iter().map(|o| o.scheduled_date).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 31),
                date(2024, 2, 29),
                date(2024, 3, 31),
                date(2024, 4, 30),
            ]
        );
    }

    #[test]
    fn rematerialization_is_idempotent_over_overlapping_windows() {
        let planned = planned_with(RecurrenceRule::new(RecurrenceType::Daily), date(2024, 1, 1));
        let mut existing = run(&planned, &[], window(date(2024, 1, 1), date(2024, 1, 10)));
        assert_eq!(existing.len(), 10);

        let second = run(&planned, &existing, window(date(2024, 1, 5), date(2024, 1, 20)));
        assert_eq!(second.len(), 10);
        existing.extend(second);

        let mut dates: Vec<NaiveDate> = existing.iter().map(|o| o.scheduled_date).collect();
        let total = dates.len();
        dates.sort();
        dates.dedup();
        assert_eq!(dates.len(), total, "duplicate occurrence dates emitted");

        let third = run(&planned, &existing, window(date(2024, 1, 1), date(2024, 1, 20)));
        assert!(third.is_empty());
    }

    #[test]
    fn count_end_condition_is_exact_across_windows() {
        let rule = RecurrenceRule::new(RecurrenceType::Daily)
            .with_end(RecurrenceEnd::AfterOccurrences(5));
        let planned = planned_with(rule, date(2024, 1, 1));

        let mut existing = run(&planned, &[], window(date(2024, 1, 1), date(2024, 1, 3)));
        assert_eq!(existing.len(), 3);
        existing.extend(run(
            &planned,
            &existing,
            window(date(2024, 1, 1), date(2024, 2, 1)),
        ));
        assert_eq!(existing.len(), 5);

        let more = run(&planned, &existing, window(date(2024, 1, 1), date(2024, 12, 31)));
        assert!(more.is_empty());
    }

    #[test]
    fn date_end_condition_stops_the_series() {
        let rule = RecurrenceRule::new(RecurrenceType::Weekly)
            .with_end(RecurrenceEnd::OnDate(date(2024, 1, 20)));
        let planned = planned_with(rule, date(2024, 1, 1));
        let created = run(&planned, &[], window(date(2024, 1, 1), date(2024, 3, 1)));
        let dates: Vec<NaiveDate> = created.iter().map(|o| o.scheduled_date).collect();
        assert_eq!(
            dates,
            vec![date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15)]
        );
    }

    #[test]
    fn workday_shift_never_collides() {
        // 2024-01-05 is a Friday; the Sat/Sun candidates both shift forward.
        let rule = RecurrenceRule::new(RecurrenceType::Daily).workdays_only();
        let planned = planned_with(rule, date(2024, 1, 5));
        let created = run(&planned, &[], window(date(2024, 1, 5), date(2024, 1, 12)));
        let dates: Vec<NaiveDate> = created.iter().map(|o| o.scheduled_date).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 5),
                date(2024, 1, 8),
                date(2024, 1, 9),
                date(2024, 1, 10),
                date(2024, 1, 11),
                date(2024, 1, 12),
            ]
        );
        let mut unique = dates.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), dates.len());
        assert!(dates.iter().all(|d| !is_weekend(*d)));
    }

    #[test]
    fn shifted_series_stays_idempotent_on_rerun() {
        let rule = RecurrenceRule::new(RecurrenceType::Daily).workdays_only();
        let planned = planned_with(rule, date(2024, 1, 5));
        let existing = run(&planned, &[], window(date(2024, 1, 5), date(2024, 1, 12)));
        let again = run(&planned, &existing, window(date(2024, 1, 5), date(2024, 1, 12)));
        assert!(again.is_empty());
    }

    #[test]
    fn occurrences_carry_template_amount_and_parent() {
        let planned = planned_with(RecurrenceRule::new(RecurrenceType::Daily), date(2024, 1, 1));
        let created = run(&planned, &[], window(date(2024, 1, 1), date(2024, 1, 2)));
        assert!(created
            .iter()
            .all(|o| o.amount == dec!(500) && o.planned_id == planned.id));
        assert_ne!(created[0].id, Uuid::nil());
    }
}
