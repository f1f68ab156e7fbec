use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::errors::LedgerError;
use crate::ledger::loan::{Loan, LoanPayment, SplitPolicy};
use crate::ledger::recurrence::step_months;

/// Parameters for one amortization run. Decoupled from the `Loan` entity
/// so a forced regeneration can re-amortize a residual balance starting at
/// a later sequence and anchor date.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub loan_id: Uuid,
    pub holder_id: Uuid,
    pub principal: Decimal,
    pub annual_rate_percent: Decimal,
    pub periods: u32,
    /// Payment `k` (1-based within this run) lands `k` months after this
    /// date, clamped to month ends.
    pub anchor_date: NaiveDate,
    pub first_sequence: u32,
}

impl ScheduleRequest {
    pub fn for_loan(loan: &Loan) -> Self {
        Self {
            loan_id: loan.id,
            holder_id: loan.effective_holder(),
            principal: loan.principal,
            annual_rate_percent: loan.annual_rate_percent,
            periods: loan.term_months,
            anchor_date: loan.issue_date,
            first_sequence: 1,
        }
    }
}

/// Produces the ordered amortization schedule for the request, one pending
/// payment per month. The final period absorbs all rounding remainder so
/// the principal components sum to the requested principal exactly.
pub fn build_schedule(
    request: &ScheduleRequest,
    policy: SplitPolicy,
    rounding_dp: u32,
) -> Result<Vec<LoanPayment>, LedgerError> {
    if request.periods == 0 {
        return Err(LedgerError::Validation(
            "loan term must be at least one month".into(),
        ));
    }
    if request.principal <= Decimal::ZERO {
        return Err(LedgerError::Validation(format!(
            "loan principal must be positive, got {}",
            request.principal
        )));
    }
    if request.annual_rate_percent < Decimal::ZERO {
        return Err(LedgerError::Validation(format!(
            "annual rate cannot be negative, got {}",
            request.annual_rate_percent
        )));
    }

    let periods = request.periods;
    let monthly_rate = request.annual_rate_percent / dec!(100) / dec!(12);
    let level_payment = annuity_payment(request.principal, monthly_rate, periods)
        .round_dp(rounding_dp);
    let level_principal = (request.principal / Decimal::from(periods)).round_dp(rounding_dp);

    let mut payments = Vec::with_capacity(periods as usize);
    let mut balance = request.principal;
    for period in 0..periods {
        let interest = (balance * monthly_rate).round_dp(rounding_dp);
        let principal_part = if period == periods - 1 {
            balance
        } else {
            match policy {
                SplitPolicy::Annuity => level_payment - interest,
                SplitPolicy::Differentiated => level_principal,
            }
        };
        let scheduled = step_months(request.anchor_date, period + 1);
        payments.push(LoanPayment::new(
            request.loan_id,
            request.first_sequence + period,
            scheduled,
            principal_part,
            interest,
            request.holder_id,
        ));
        balance -= principal_part;
    }
    Ok(payments)
}

/// Level payment for the standard annuity formula
/// `P * i(1+i)^n / ((1+i)^n - 1)`; collapses to `P/n` at zero rate.
fn annuity_payment(principal: Decimal, monthly_rate: Decimal, periods: u32) -> Decimal {
    if monthly_rate.is_zero() {
        return principal / Decimal::from(periods);
    }
    let growth = (Decimal::ONE + monthly_rate).powu(periods as u64);
    principal * (monthly_rate * growth) / (growth - Decimal::ONE)
}
