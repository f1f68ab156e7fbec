use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::planned::OccurrenceStatus;

/// A creditor entity. Identity is immutable; names are unique within a
/// ledger (enforced at the service boundary).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lender {
    pub id: Uuid,
    pub name: String,
    pub kind: LenderKind,
}

impl Lender {
    pub fn new(name: impl Into<String>, kind: LenderKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LenderKind {
    Bank,
    Microfinance,
    Individual,
    Collector,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum LoanStatus {
    #[default]
    Active,
    PaidOff,
    Defaulted,
}

/// How a schedule splits each payment into principal and interest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SplitPolicy {
    /// Level total payment; interest computed on the declining balance,
    /// principal takes the rest.
    Annuity,
    /// Level principal portion; total declines as interest shrinks.
    Differentiated,
}

/// A borrowed amount with an amortized repayment schedule.
///
/// `original_lender_id` records who issued the loan and never changes;
/// `current_holder_id` tracks who currently owns the receivable and is kept
/// consistent with the latest debt transfer. Both are private so the
/// invariant cannot be bypassed by field access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: Uuid,
    pub description: String,
    pub principal: Decimal,
    /// Nominal annual rate as a percentage, e.g. 12.5 for 12.5%.
    pub annual_rate_percent: Decimal,
    pub term_months: u32,
    pub issue_date: NaiveDate,
    pub status: LoanStatus,
    original_lender_id: Uuid,
    current_holder_id: Uuid,
}

impl Loan {
    pub fn new(
        description: impl Into<String>,
        principal: Decimal,
        annual_rate_percent: Decimal,
        term_months: u32,
        issue_date: NaiveDate,
        original_lender_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            principal,
            annual_rate_percent,
            term_months,
            issue_date,
            status: LoanStatus::Active,
            original_lender_id,
            current_holder_id: original_lender_id,
        }
    }

    pub fn original_lender(&self) -> Uuid {
        self.original_lender_id
    }

    /// The lender currently entitled to receive outstanding payments.
    pub fn effective_holder(&self) -> Uuid {
        self.current_holder_id
    }

    pub(crate) fn set_effective_holder(&mut self, holder: Uuid) {
        self.current_holder_id = holder;
    }
}

/// One scheduled installment of a loan. Attributed to the loan's effective
/// holder at the time it falls due or is paid; once executed the holder is
/// frozen as recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanPayment {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub sequence: u32,
    pub scheduled_date: NaiveDate,
    pub principal_amount: Decimal,
    pub interest_amount: Decimal,
    pub total_amount: Decimal,
    pub holder_id: Uuid,
    pub status: OccurrenceStatus,
    pub executed_date: Option<NaiveDate>,
    pub executed_amount: Option<Decimal>,
    pub skip_reason: Option<String>,
    pub skipped_on: Option<NaiveDate>,
}

impl LoanPayment {
    pub fn new(
        loan_id: Uuid,
        sequence: u32,
        scheduled_date: NaiveDate,
        principal_amount: Decimal,
        interest_amount: Decimal,
        holder_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            loan_id,
            sequence,
            scheduled_date,
            principal_amount,
            interest_amount,
            total_amount: principal_amount + interest_amount,
            holder_id,
            status: OccurrenceStatus::Pending,
            executed_date: None,
            executed_amount: None,
            skip_reason: None,
            skipped_on: None,
        }
    }

    /// Days past the scheduled date as of `reference`; zero for anything
    /// not pending or not yet due. Computed, never stored.
    pub fn overdue_days(&self, reference: NaiveDate) -> i64 {
        if self.status != OccurrenceStatus::Pending || reference <= self.scheduled_date {
            return 0;
        }
        (reference - self.scheduled_date).num_days()
    }
}

/// Immutable record of a holder change. Append-only; history for a loan is
/// ordered by transfer date, ties broken by recording order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtTransfer {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub from_lender_id: Uuid,
    pub to_lender_id: Uuid,
    pub transfer_date: NaiveDate,
    /// Price the receivable changed hands at.
    pub transfer_amount: Decimal,
    /// Outstanding balance immediately before the transfer.
    pub previous_amount: Decimal,
    pub amount_difference: Decimal,
    pub reason: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
