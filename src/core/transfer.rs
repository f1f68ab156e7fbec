use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::LedgerError;
use crate::ledger::ledger::Ledger;
use crate::ledger::loan::{DebtTransfer, LoanStatus};
use crate::ledger::planned::OccurrenceStatus;

/// Input to a debt transfer. The source lender is implicit (the loan's
/// current effective holder); `expected_from` lets a caller assert who it
/// believes holds the debt and fail fast when that assertion is stale.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub to_lender_id: Uuid,
    pub transfer_date: NaiveDate,
    pub transfer_amount: Decimal,
    pub reason: Option<String>,
    pub expected_from: Option<Uuid>,
}

/// Records a holder change for a loan: appends the immutable transfer
/// record, re-points every pending payment to the new holder, and updates
/// the loan's cached effective holder. All preconditions are checked
/// before the first mutation, so a returned error implies an untouched
/// ledger. Executed payments keep the holder recorded at execution time.
pub fn transfer_debt(
    ledger: &mut Ledger,
    loan_id: Uuid,
    request: TransferRequest,
) -> Result<DebtTransfer, LedgerError> {
    let loan = ledger.loan(loan_id).ok_or(LedgerError::LoanNotFound(loan_id))?;
    ledger
        .lender(request.to_lender_id)
        .ok_or(LedgerError::LenderNotFound(request.to_lender_id))?;

    if loan.status == LoanStatus::PaidOff {
        return Err(LedgerError::LoanAlreadySettled(loan_id));
    }
    let holder = loan.effective_holder();
    if request.to_lender_id == holder {
        return Err(LedgerError::SelfTransferRejected {
            loan: loan_id,
            lender: request.to_lender_id,
        });
    }
    if request.transfer_amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidTransferAmount(request.transfer_amount));
    }
    if let Some(expected) = request.expected_from {
        if expected != holder {
            return Err(LedgerError::TransferSourceMismatch {
                loan: loan_id,
                expected,
                actual: holder,
            });
        }
    }

    let previous_amount = remaining_debt(ledger, loan_id);
    let transfer = DebtTransfer {
        id: Uuid::new_v4(),
        loan_id,
        from_lender_id: holder,
        to_lender_id: request.to_lender_id,
        transfer_date: request.transfer_date,
        transfer_amount: request.transfer_amount,
        previous_amount,
        amount_difference: request.transfer_amount - previous_amount,
        reason: request.reason,
        recorded_at: Utc::now(),
    };

    for payment in ledger
        .payments_for_mut(loan_id)
        .filter(|payment| payment.status == OccurrenceStatus::Pending)
    {
        payment.holder_id = request.to_lender_id;
    }
    if let Some(loan) = ledger.loan_mut(loan_id) {
        loan.set_effective_holder(request.to_lender_id);
    }
    ledger.add_transfer(transfer.clone());
    tracing::info!(
        loan = %loan_id,
        from = %holder,
        to = %request.to_lender_id,
        "debt transfer recorded"
    );
    Ok(transfer)
}

/// All transfers for a loan, ascending by transfer date. The underlying
/// store is append-only and the sort is stable, so same-day transfers keep
/// their recording order.
pub fn transfer_history(ledger: &Ledger, loan_id: Uuid) -> Vec<&DebtTransfer> {
    let mut history: Vec<&DebtTransfer> = ledger.transfers_for(loan_id).collect();
    history.sort_by_key(|transfer| transfer.transfer_date);
    history
}

/// Outstanding balance: the sum of pending payment totals.
pub fn remaining_debt(ledger: &Ledger, loan_id: Uuid) -> Decimal {
    ledger
        .payments_for(loan_id)
        .filter(|payment| payment.status == OccurrenceStatus::Pending)
        .map(|payment| payment.total_amount)
        .sum()
}
