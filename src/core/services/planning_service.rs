//! Business logic for planned transactions and their occurrences.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::core::clock::Clock;
use crate::core::services::ServiceResult;
use crate::core::status;
use crate::errors::LedgerError;
use crate::ledger::ledger::{DateWindow, Ledger};
use crate::ledger::materialize::materialize_occurrences;
use crate::ledger::planned::{Category, PlannedOccurrence, PlannedTransaction};

/// Validated operations over planned transactions, categories, and the
/// occurrence lifecycle. A returned error implies no ledger change.
pub struct PlanningService;

impl PlanningService {
    pub fn add_category(ledger: &mut Ledger, category: Category) -> ServiceResult<Uuid> {
        Ok(ledger.add_category(category))
    }

    /// Adds a planned transaction after validating its recurrence rule and
    /// category reference.
    pub fn add_planned(ledger: &mut Ledger, planned: PlannedTransaction) -> ServiceResult<Uuid> {
        if let Some(category_id) = planned.category_id {
            ledger
                .category(category_id)
                .ok_or(LedgerError::CategoryNotFound(category_id))?;
        }
        if let Some(rule) = &planned.rule {
            rule.validate_against(planned.start_date)?;
        }
        Ok(ledger.add_planned(planned))
    }

    pub fn set_active(ledger: &mut Ledger, planned_id: Uuid, active: bool) -> ServiceResult<()> {
        let planned = ledger
            .planned_transaction_mut(planned_id)
            .ok_or(LedgerError::PlannedTransactionNotFound(planned_id))?;
        planned.active = active;
        ledger.touch();
        Ok(())
    }

    /// Expands the transaction's rule over `window` and persists the new
    /// occurrences. Idempotent: re-running over overlapping windows never
    /// duplicates an occurrence.
    pub fn materialize(
        ledger: &mut Ledger,
        planned_id: Uuid,
        window: DateWindow,
        config: &CoreConfig,
    ) -> ServiceResult<Vec<PlannedOccurrence>> {
        let created = {
            let planned = ledger
                .planned_transaction(planned_id)
                .ok_or(LedgerError::PlannedTransactionNotFound(planned_id))?;
            let existing: Vec<&PlannedOccurrence> = ledger.occurrences_for(planned_id).collect();
            materialize_occurrences(planned, &existing, window, config.max_occurrences_per_run)
        };
        tracing::debug!(
            planned = %planned_id,
            created = created.len(),
            "materialized occurrences"
        );
        for occurrence in &created {
            ledger.add_occurrence(occurrence.clone());
        }
        Ok(created)
    }

    /// Marks an occurrence executed and stores the reference to the
    /// realized transaction record created by the caller.
    pub fn execute_occurrence(
        ledger: &mut Ledger,
        occurrence_id: Uuid,
        executed_date: NaiveDate,
        executed_amount: Decimal,
        realized_transaction_id: Option<Uuid>,
    ) -> ServiceResult<PlannedOccurrence> {
        let occurrence = ledger
            .occurrence_mut(occurrence_id)
            .ok_or(LedgerError::OccurrenceNotFound(occurrence_id))?;
        status::execute(occurrence, executed_date, executed_amount)?;
        occurrence.realized_transaction_id = realized_transaction_id;
        let snapshot = occurrence.clone();
        ledger.touch();
        Ok(snapshot)
    }

    /// Marks an occurrence skipped; the skip date is drawn from the
    /// injected clock.
    pub fn skip_occurrence(
        ledger: &mut Ledger,
        occurrence_id: Uuid,
        reason: Option<String>,
        clock: &dyn Clock,
    ) -> ServiceResult<PlannedOccurrence> {
        let today = clock.today();
        let occurrence = ledger
            .occurrence_mut(occurrence_id)
            .ok_or(LedgerError::OccurrenceNotFound(occurrence_id))?;
        status::skip(occurrence, today, reason)?;
        let snapshot = occurrence.clone();
        ledger.touch();
        Ok(snapshot)
    }

    /// Removes a planned transaction together with its occurrences. The
    /// occurrences only outlive skips and executions while their parent
    /// exists; deleting the parent is the audited escape hatch.
    pub fn remove_planned(
        ledger: &mut Ledger,
        planned_id: Uuid,
    ) -> ServiceResult<PlannedTransaction> {
        let position = ledger
            .planned
            .iter()
            .position(|planned| planned.id == planned_id)
            .ok_or(LedgerError::PlannedTransactionNotFound(planned_id))?;
        let removed = ledger.planned.remove(position);
        ledger
            .occurrences
            .retain(|occurrence| occurrence.planned_id != planned_id);
        ledger.touch();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::core::clock::FixedClock;
    use crate::core::services::ServiceError;
    use crate::errors::ErrorKind;
    use crate::ledger::planned::{FlowKind, OccurrenceStatus};
    use crate::ledger::recurrence::{RecurrenceRule, RecurrenceType};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn weekly_planned() -> PlannedTransaction {
        PlannedTransaction::new("gym", dec!(30), FlowKind::Expense, date(2024, 1, 1))
            .with_rule(RecurrenceRule::new(RecurrenceType::Weekly))
    }

    #[test]
    fn add_planned_rejects_unknown_category() {
        let mut ledger = Ledger::new("plans");
        let planned = weekly_planned().with_category(Uuid::new_v4());
        let err = PlanningService::add_planned(&mut ledger, planned)
            .expect_err("unknown category must fail");
        assert_eq!(err.kind(), ErrorKind::ReferentialIntegrity);
        assert!(ledger.planned.is_empty());
    }

    #[test]
    fn materialize_then_execute_and_skip() {
        let mut ledger = Ledger::new("plans");
        let config = CoreConfig::default();
        let planned_id = PlanningService::add_planned(&mut ledger, weekly_planned()).unwrap();
        let window = DateWindow::new(date(2024, 1, 1), date(2024, 1, 15)).unwrap();
        let created =
            PlanningService::materialize(&mut ledger, planned_id, window, &config).unwrap();
        assert_eq!(created.len(), 3);

        let realized = Uuid::new_v4();
        let executed = PlanningService::execute_occurrence(
            &mut ledger,
            created[0].id,
            date(2024, 1, 1),
            dec!(30),
            Some(realized),
        )
        .unwrap();
        assert_eq!(executed.status, OccurrenceStatus::Executed);
        assert_eq!(executed.realized_transaction_id, Some(realized));

        let clock = FixedClock(date(2024, 1, 9));
        let skipped =
            PlanningService::skip_occurrence(&mut ledger, created[1].id, Some("closed".into()), &clock)
                .unwrap();
        assert_eq!(skipped.status, OccurrenceStatus::Skipped);
        assert_eq!(skipped.skipped_on, Some(date(2024, 1, 9)));
    }

    #[test]
    fn materialize_unknown_template_fails() {
        let mut ledger = Ledger::new("plans");
        let window = DateWindow::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        let err = PlanningService::materialize(
            &mut ledger,
            Uuid::new_v4(),
            window,
            &CoreConfig::default(),
        )
        .expect_err("unknown template must fail");
        assert!(matches!(
            err,
            ServiceError::Ledger(LedgerError::PlannedTransactionNotFound(_))
        ));
    }

    #[test]
    fn remove_planned_drops_occurrences() {
        let mut ledger = Ledger::new("plans");
        let config = CoreConfig::default();
        let planned_id = PlanningService::add_planned(&mut ledger, weekly_planned()).unwrap();
        let window = DateWindow::new(date(2024, 1, 1), date(2024, 2, 1)).unwrap();
        PlanningService::materialize(&mut ledger, planned_id, window, &config).unwrap();
        assert!(!ledger.occurrences.is_empty());

        PlanningService::remove_planned(&mut ledger, planned_id).unwrap();
        assert!(ledger.occurrences.is_empty());
    }
}
