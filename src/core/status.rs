use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::LedgerError;
use crate::ledger::loan::LoanPayment;
use crate::ledger::planned::{OccurrenceStatus, PlannedOccurrence};

/// Seam shared by the two entry kinds the status machine governs: planned
/// occurrences and loan payments follow the same lifecycle.
pub trait StatusCarrier {
    fn carrier_id(&self) -> Uuid;
    fn scheduled_date(&self) -> NaiveDate;
    fn status(&self) -> OccurrenceStatus;
    fn record_execution(&mut self, status: OccurrenceStatus, date: NaiveDate, amount: Decimal);
    fn record_skip(&mut self, date: NaiveDate, reason: Option<String>);
}

impl StatusCarrier for PlannedOccurrence {
    fn carrier_id(&self) -> Uuid {
        self.id
    }

    fn scheduled_date(&self) -> NaiveDate {
        self.scheduled_date
    }

    fn status(&self) -> OccurrenceStatus {
        self.status
    }

    fn record_execution(&mut self, status: OccurrenceStatus, date: NaiveDate, amount: Decimal) {
        self.status = status;
        self.executed_date = Some(date);
        self.executed_amount = Some(amount);
    }

    fn record_skip(&mut self, date: NaiveDate, reason: Option<String>) {
        self.status = OccurrenceStatus::Skipped;
        self.skipped_on = Some(date);
        self.skip_reason = reason;
    }
}

impl StatusCarrier for LoanPayment {
    fn carrier_id(&self) -> Uuid {
        self.id
    }

    fn scheduled_date(&self) -> NaiveDate {
        self.scheduled_date
    }

    fn status(&self) -> OccurrenceStatus {
        self.status
    }

    fn record_execution(&mut self, status: OccurrenceStatus, date: NaiveDate, amount: Decimal) {
        self.status = status;
        self.executed_date = Some(date);
        self.executed_amount = Some(amount);
    }

    fn record_skip(&mut self, date: NaiveDate, reason: Option<String>) {
        self.status = OccurrenceStatus::Skipped;
        self.skipped_on = Some(date);
        self.skip_reason = reason;
    }
}

/// Marks a pending entry executed, choosing `Executed` or `ExecutedLate`
/// by comparing the execution date to the scheduled date. Terminal states
/// reject the transition without mutating the entry.
pub fn execute<C: StatusCarrier>(
    carrier: &mut C,
    executed_date: NaiveDate,
    executed_amount: Decimal,
) -> Result<OccurrenceStatus, LedgerError> {
    ensure_pending(carrier, "execute")?;
    let status = if executed_date <= carrier.scheduled_date() {
        OccurrenceStatus::Executed
    } else {
        OccurrenceStatus::ExecutedLate
    };
    carrier.record_execution(status, executed_date, executed_amount);
    Ok(status)
}

/// Marks a pending entry skipped, retaining the optional reason for audit.
pub fn skip<C: StatusCarrier>(
    carrier: &mut C,
    skip_date: NaiveDate,
    reason: Option<String>,
) -> Result<(), LedgerError> {
    ensure_pending(carrier, "skip")?;
    carrier.record_skip(skip_date, reason);
    Ok(())
}

fn ensure_pending<C: StatusCarrier>(
    carrier: &C,
    attempted: &'static str,
) -> Result<(), LedgerError> {
    if carrier.status().is_terminal() {
        return Err(LedgerError::InvalidStateTransition {
            entity: carrier.carrier_id(),
            from: carrier.status(),
            attempted,
        });
    }
    Ok(())
}

/// Read-side urgency of a pending entry relative to a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    Overdue,
    DueSoon,
    Future,
}

impl DueStatus {
    pub fn classify(scheduled: NaiveDate, reference: NaiveDate, due_soon_days: i64) -> DueStatus {
        if scheduled < reference {
            return DueStatus::Overdue;
        }
        if scheduled <= reference + Duration::days(due_soon_days) {
            DueStatus::DueSoon
        } else {
            DueStatus::Future
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::ledger::planned::PlannedOccurrence;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn occurrence() -> PlannedOccurrence {
        PlannedOccurrence::new(Uuid::new_v4(), 0, date(2024, 6, 15), dec!(100))
    }

    #[test]
    fn execute_on_time_marks_executed() {
        let mut entry = occurrence();
        let status = execute(&mut entry, date(2024, 6, 15), dec!(100)).unwrap();
        assert_eq!(status, OccurrenceStatus::Executed);
        assert_eq!(entry.executed_date, Some(date(2024, 6, 15)));
        assert_eq!(entry.executed_amount, Some(dec!(100)));
    }

    #[test]
    fn execute_after_due_date_marks_executed_late() {
        let mut entry = occurrence();
        let status = execute(&mut entry, date(2024, 6, 20), dec!(90)).unwrap();
        assert_eq!(status, OccurrenceStatus::ExecutedLate);
    }

    #[test]
    fn skip_records_reason_and_date() {
        let mut entry = occurrence();
        skip(&mut entry, date(2024, 6, 14), Some("on vacation".into())).unwrap();
        assert_eq!(entry.status, OccurrenceStatus::Skipped);
        assert_eq!(entry.skipped_on, Some(date(2024, 6, 14)));
        assert_eq!(entry.skip_reason.as_deref(), Some("on vacation"));
    }

    #[test]
    fn terminal_states_reject_further_transitions_without_mutation() {
        let mut entry = occurrence();
        execute(&mut entry, date(2024, 6, 15), dec!(100)).unwrap();
        let before = entry.clone();

        let err = execute(&mut entry, date(2024, 6, 16), dec!(50)).expect_err("must fail");
        assert!(matches!(err, LedgerError::InvalidStateTransition { .. }));
        let err = skip(&mut entry, date(2024, 6, 16), None).expect_err("must fail");
        assert!(matches!(
            err,
            LedgerError::InvalidStateTransition {
                from: OccurrenceStatus::Executed,
                ..
            }
        ));
        assert_eq!(entry.executed_date, before.executed_date);
        assert_eq!(entry.executed_amount, before.executed_amount);
        assert_eq!(entry.status, before.status);
    }

    #[test]
    fn skipped_entries_cannot_be_executed() {
        let mut entry = occurrence();
        skip(&mut entry, date(2024, 6, 10), None).unwrap();
        assert!(execute(&mut entry, date(2024, 6, 15), dec!(100)).is_err());
    }

    #[test]
    fn due_status_classification_boundaries() {
        let reference = date(2024, 6, 15);
        assert_eq!(
            DueStatus::classify(date(2024, 6, 14), reference, 7),
            DueStatus::Overdue
        );
        assert_eq!(
            DueStatus::classify(date(2024, 6, 15), reference, 7),
            DueStatus::DueSoon
        );
        assert_eq!(
            DueStatus::classify(date(2024, 6, 22), reference, 7),
            DueStatus::DueSoon
        );
        assert_eq!(
            DueStatus::classify(date(2024, 6, 23), reference, 7),
            DueStatus::Future
        );
    }
}
