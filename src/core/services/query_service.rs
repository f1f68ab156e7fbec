//! Read-side aggregation for presentation layers. Queries never fail on
//! empty data; they return empty collections.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::core::status::DueStatus;
use crate::core::transfer;
use crate::ledger::ledger::{DateWindow, Ledger};
use crate::ledger::loan::{DebtTransfer, LoanPayment, LoanStatus};
use crate::ledger::planned::{FlowKind, OccurrenceStatus, PlannedOccurrence};

/// A pending occurrence paired with its urgency classification.
#[derive(Debug, Clone, Copy)]
pub struct PendingEntry<'a> {
    pub occurrence: &'a PlannedOccurrence,
    pub due: DueStatus,
}

/// Projected and realized totals over the occurrences in a window.
/// Skipped occurrences count toward neither side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowSummary {
    pub pending_income: Decimal,
    pub pending_expense: Decimal,
    pub executed_income: Decimal,
    pub executed_expense: Decimal,
}

impl WindowSummary {
    pub fn net(&self) -> Decimal {
        self.pending_income + self.executed_income
            - self.pending_expense
            - self.executed_expense
    }
}

/// A pending payment past its scheduled date.
#[derive(Debug, Clone, Copy)]
pub struct OverdueEntry<'a> {
    pub payment: &'a LoanPayment,
    pub overdue_days: i64,
}

/// Per-loan aggregate used by listing screens.
#[derive(Debug, Clone)]
pub struct LoanStatistics {
    pub loan_id: Uuid,
    pub description: String,
    pub status: LoanStatus,
    pub holder_id: Uuid,
    pub total_paid: Decimal,
    pub outstanding: Decimal,
    pub overdue_count: usize,
    pub next_due: Option<NaiveDate>,
}

pub struct QueryService;

impl QueryService {
    pub fn occurrences_on(ledger: &Ledger, date: NaiveDate) -> Vec<&PlannedOccurrence> {
        let mut result: Vec<&PlannedOccurrence> = ledger
            .occurrences
            .iter()
            .filter(|occurrence| occurrence.scheduled_date == date)
            .collect();
        result.sort_by_key(|occurrence| (occurrence.planned_id, occurrence.sequence));
        result
    }

    pub fn occurrences_in(ledger: &Ledger, window: DateWindow) -> Vec<&PlannedOccurrence> {
        let mut result: Vec<&PlannedOccurrence> = ledger
            .occurrences
            .iter()
            .filter(|occurrence| window.contains(occurrence.scheduled_date))
            .collect();
        result.sort_by_key(|occurrence| (occurrence.scheduled_date, occurrence.sequence));
        result
    }

    /// Pending occurrences classified against `reference`, most urgent
    /// first.
    pub fn pending_occurrences<'a>(
        ledger: &'a Ledger,
        reference: NaiveDate,
        config: &CoreConfig,
    ) -> Vec<PendingEntry<'a>> {
        let mut result: Vec<PendingEntry<'a>> = ledger
            .occurrences
            .iter()
            .filter(|occurrence| occurrence.status == OccurrenceStatus::Pending)
            .map(|occurrence| PendingEntry {
                occurrence,
                due: DueStatus::classify(
                    occurrence.scheduled_date,
                    reference,
                    config.due_soon_window_days,
                ),
            })
            .collect();
        result.sort_by_key(|entry| entry.occurrence.scheduled_date);
        result
    }

    /// Income/expense totals over a window, split by lifecycle side.
    /// Executed entries count their executed amount; pending entries their
    /// scheduled amount.
    pub fn window_summary(ledger: &Ledger, window: DateWindow) -> WindowSummary {
        let mut summary = WindowSummary::default();
        for occurrence in ledger
            .occurrences
            .iter()
            .filter(|occurrence| window.contains(occurrence.scheduled_date))
        {
            let Some(planned) = ledger.planned_transaction(occurrence.planned_id) else {
                continue;
            };
            match occurrence.status {
                OccurrenceStatus::Pending => match planned.flow {
                    FlowKind::Income => summary.pending_income += occurrence.amount,
                    FlowKind::Expense => summary.pending_expense += occurrence.amount,
                },
                OccurrenceStatus::Executed | OccurrenceStatus::ExecutedLate => {
                    let amount = occurrence.executed_amount.unwrap_or(occurrence.amount);
                    match planned.flow {
                        FlowKind::Income => summary.executed_income += amount,
                        FlowKind::Expense => summary.executed_expense += amount,
                    }
                }
                OccurrenceStatus::Skipped => {}
            }
        }
        summary
    }

    pub fn payments_for(ledger: &Ledger, loan_id: Uuid) -> Vec<&LoanPayment> {
        let mut result: Vec<&LoanPayment> = ledger.payments_for(loan_id).collect();
        result.sort_by_key(|payment| payment.sequence);
        result
    }

    /// Pending payments across all loans that are past due at `reference`,
    /// oldest first.
    pub fn overdue_payments(ledger: &Ledger, reference: NaiveDate) -> Vec<OverdueEntry<'_>> {
        let mut result: Vec<OverdueEntry<'_>> = ledger
            .payments
            .iter()
            .filter(|payment| payment.overdue_days(reference) > 0)
            .map(|payment| OverdueEntry {
                payment,
                overdue_days: payment.overdue_days(reference),
            })
            .collect();
        result.sort_by_key(|entry| entry.payment.scheduled_date);
        result
    }

    /// Sum of pending payment totals; zero for an unknown loan.
    pub fn remaining_debt(ledger: &Ledger, loan_id: Uuid) -> Decimal {
        transfer::remaining_debt(ledger, loan_id)
    }

    /// Transfer history, ascending by transfer date.
    pub fn transfer_history(ledger: &Ledger, loan_id: Uuid) -> Vec<&DebtTransfer> {
        transfer::transfer_history(ledger, loan_id)
    }

    pub fn loan_statistics(ledger: &Ledger, reference: NaiveDate) -> Vec<LoanStatistics> {
        ledger
            .loans
            .iter()
            .map(|loan| {
                let mut total_paid = Decimal::ZERO;
                let mut outstanding = Decimal::ZERO;
                let mut overdue_count = 0usize;
                let mut next_due: Option<NaiveDate> = None;
                for payment in ledger.payments_for(loan.id) {
                    match payment.status {
                        OccurrenceStatus::Executed | OccurrenceStatus::ExecutedLate => {
                            total_paid += payment.executed_amount.unwrap_or(payment.total_amount);
                        }
                        OccurrenceStatus::Pending => {
                            outstanding += payment.total_amount;
                            if payment.overdue_days(reference) > 0 {
                                overdue_count += 1;
                            } else if next_due.is_none()
                                || Some(payment.scheduled_date) < next_due
                            {
                                next_due = Some(payment.scheduled_date);
                            }
                        }
                        OccurrenceStatus::Skipped => {}
                    }
                }
                LoanStatistics {
                    loan_id: loan.id,
                    description: loan.description.clone(),
                    status: loan.status,
                    holder_id: loan.effective_holder(),
                    total_paid,
                    outstanding,
                    overdue_count,
                    next_due,
                }
            })
            .collect()
    }
}
