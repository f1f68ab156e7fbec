//! Business logic for lenders, loans, schedules, and debt transfers.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::core::clock::Clock;
use crate::core::schedule::{build_schedule, ScheduleRequest};
use crate::core::services::ServiceResult;
use crate::core::status;
use crate::core::transfer::{self, TransferRequest};
use crate::errors::LedgerError;
use crate::ledger::ledger::Ledger;
use crate::ledger::loan::{DebtTransfer, Lender, Loan, LoanPayment, LoanStatus, SplitPolicy};
use crate::ledger::planned::OccurrenceStatus;

/// Validated operations over the loan side of the ledger. A returned error
/// implies no ledger change.
pub struct LoanService;

impl LoanService {
    /// Registers a lender; names are unique case-insensitively.
    pub fn add_lender(ledger: &mut Ledger, lender: Lender) -> ServiceResult<Uuid> {
        if ledger.lender_by_name(&lender.name).is_some() {
            return Err(LedgerError::DuplicateLenderName(lender.name).into());
        }
        Ok(ledger.add_lender(lender))
    }

    pub fn add_loan(ledger: &mut Ledger, loan: Loan) -> ServiceResult<Uuid> {
        let lender_id = loan.original_lender();
        ledger
            .lender(lender_id)
            .ok_or(LedgerError::LenderNotFound(lender_id))?;
        if loan.principal <= Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "loan principal must be positive, got {}",
                loan.principal
            ))
            .into());
        }
        if loan.term_months == 0 {
            return Err(
                LedgerError::Validation("loan term must be at least one month".into()).into(),
            );
        }
        if loan.annual_rate_percent < Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "annual rate cannot be negative, got {}",
                loan.annual_rate_percent
            ))
            .into());
        }
        Ok(ledger.add_loan(loan))
    }

    /// Generates the loan's amortization schedule under the given split
    /// policy. Pending payments from an earlier generation are replaced.
    ///
    /// A schedule containing executed or skipped payments refuses to
    /// regenerate unless `force` is set; a forced run keeps those rows
    /// untouched and re-amortizes the unexecuted principal over the
    /// remaining periods.
    pub fn generate_schedule(
        ledger: &mut Ledger,
        loan_id: Uuid,
        policy: SplitPolicy,
        force: bool,
        config: &CoreConfig,
    ) -> ServiceResult<Vec<LoanPayment>> {
        let loan = ledger
            .loan(loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?
            .clone();
        let retained: Vec<(u32, NaiveDate, Decimal, OccurrenceStatus)> = ledger
            .payments_for(loan_id)
            .filter(|payment| payment.status.is_terminal())
            .map(|payment| {
                (
                    payment.sequence,
                    payment.scheduled_date,
                    payment.principal_amount,
                    payment.status,
                )
            })
            .collect();

        if !retained.is_empty() && !force {
            return Err(LedgerError::ScheduleAlreadyExecuted(loan_id).into());
        }

        let new_payments = if retained.is_empty() {
            build_schedule(&ScheduleRequest::for_loan(&loan), policy, config.rounding_dp)?
        } else {
            let executed_principal: Decimal = retained
                .iter()
                .filter(|(_, _, _, status)| {
                    matches!(
                        status,
                        OccurrenceStatus::Executed | OccurrenceStatus::ExecutedLate
                    )
                })
                .map(|(_, _, principal, _)| *principal)
                .sum();
            let residual = loan.principal - executed_principal;
            let periods = loan.term_months.saturating_sub(retained.len() as u32);
            if periods == 0 || residual <= Decimal::ZERO {
                Vec::new()
            } else {
                let anchor = retained
                    .iter()
                    .map(|(_, scheduled, _, _)| *scheduled)
                    .max()
                    .unwrap_or(loan.issue_date);
                let last_sequence = retained
                    .iter()
                    .map(|(sequence, _, _, _)| *sequence)
                    .max()
                    .unwrap_or(0);
                let request = ScheduleRequest {
                    loan_id,
                    holder_id: loan.effective_holder(),
                    principal: residual,
                    annual_rate_percent: loan.annual_rate_percent,
                    periods,
                    anchor_date: anchor,
                    first_sequence: last_sequence + 1,
                };
                build_schedule(&request, policy, config.rounding_dp)?
            }
        };

        ledger
            .payments
            .retain(|payment| payment.loan_id != loan_id || payment.status.is_terminal());
        ledger.touch();
        for payment in &new_payments {
            ledger.add_payment(payment.clone());
        }
        tracing::info!(loan = %loan_id, policy = ?policy, "loan schedule generated");
        Ok(new_payments)
    }

    /// Executes a payment; when nothing is left pending afterwards the
    /// loan is settled.
    pub fn execute_payment(
        ledger: &mut Ledger,
        payment_id: Uuid,
        executed_date: NaiveDate,
        executed_amount: Decimal,
    ) -> ServiceResult<LoanPayment> {
        let payment = ledger
            .payment_mut(payment_id)
            .ok_or(LedgerError::PaymentNotFound(payment_id))?;
        let loan_id = payment.loan_id;
        status::execute(payment, executed_date, executed_amount)?;
        let snapshot = payment.clone();

        let none_pending = ledger
            .payments_for(loan_id)
            .all(|payment| payment.status != OccurrenceStatus::Pending);
        if none_pending {
            if let Some(loan) = ledger.loan_mut(loan_id) {
                loan.status = LoanStatus::PaidOff;
                tracing::info!(loan = %loan_id, "loan settled");
            }
        }
        ledger.touch();
        Ok(snapshot)
    }

    pub fn skip_payment(
        ledger: &mut Ledger,
        payment_id: Uuid,
        reason: Option<String>,
        clock: &dyn Clock,
    ) -> ServiceResult<LoanPayment> {
        let today = clock.today();
        let payment = ledger
            .payment_mut(payment_id)
            .ok_or(LedgerError::PaymentNotFound(payment_id))?;
        status::skip(payment, today, reason)?;
        let snapshot = payment.clone();
        ledger.touch();
        Ok(snapshot)
    }

    /// Transfers the loan's receivable to another lender. The transfer
    /// date defaults to the injected clock's today.
    pub fn transfer_debt(
        ledger: &mut Ledger,
        loan_id: Uuid,
        to_lender_id: Uuid,
        transfer_date: Option<NaiveDate>,
        transfer_amount: Decimal,
        reason: Option<String>,
        clock: &dyn Clock,
    ) -> ServiceResult<DebtTransfer> {
        let request = TransferRequest {
            to_lender_id,
            transfer_date: transfer_date.unwrap_or_else(|| clock.today()),
            transfer_amount,
            reason,
            expected_from: None,
        };
        Ok(transfer::transfer_debt(ledger, loan_id, request)?)
    }

    pub fn remaining_debt(ledger: &Ledger, loan_id: Uuid) -> ServiceResult<Decimal> {
        ledger
            .loan(loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?;
        Ok(transfer::remaining_debt(ledger, loan_id))
    }
}
