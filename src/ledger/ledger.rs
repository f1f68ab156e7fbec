use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::LedgerError;

use super::{
    loan::{DebtTransfer, Lender, Loan, LoanPayment},
    planned::{Category, PlannedOccurrence, PlannedTransaction},
};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Inclusive date range used for materialization and queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, LedgerError> {
        if end < start {
            return Err(LedgerError::Validation(format!(
                "window end {end} precedes start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Arena-style store for every scheduling entity. Relationships are held
/// as opaque ids and resolved through explicit lookups; there are no live
/// object graphs between loans, payments, and transfers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub planned: Vec<PlannedTransaction>,
    #[serde(default)]
    pub occurrences: Vec<PlannedOccurrence>,
    #[serde(default)]
    pub lenders: Vec<Lender>,
    #[serde(default)]
    pub loans: Vec<Loan>,
    #[serde(default)]
    pub payments: Vec<LoanPayment>,
    #[serde(default)]
    pub transfers: Vec<DebtTransfer>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Ledger::schema_version_default")]
    pub schema_version: u8,
}

impl Ledger {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            categories: Vec::new(),
            planned: Vec::new(),
            occurrences: Vec::new(),
            lenders: Vec::new(),
            loans: Vec::new(),
            payments: Vec::new(),
            transfers: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn add_category(&mut self, category: Category) -> Uuid {
        let id = category.id;
        self.categories.push(category);
        self.touch();
        id
    }

    pub fn add_planned(&mut self, planned: PlannedTransaction) -> Uuid {
        let id = planned.id;
        self.planned.push(planned);
        self.touch();
        id
    }

    pub fn add_occurrence(&mut self, occurrence: PlannedOccurrence) -> Uuid {
        let id = occurrence.id;
        self.occurrences.push(occurrence);
        self.touch();
        id
    }

    pub fn add_lender(&mut self, lender: Lender) -> Uuid {
        let id = lender.id;
        self.lenders.push(lender);
        self.touch();
        id
    }

    pub fn add_loan(&mut self, loan: Loan) -> Uuid {
        let id = loan.id;
        self.loans.push(loan);
        self.touch();
        id
    }

    pub fn add_payment(&mut self, payment: LoanPayment) -> Uuid {
        let id = payment.id;
        self.payments.push(payment);
        self.touch();
        id
    }

    pub fn add_transfer(&mut self, transfer: DebtTransfer) -> Uuid {
        let id = transfer.id;
        self.transfers.push(transfer);
        self.touch();
        id
    }

    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn planned_transaction(&self, id: Uuid) -> Option<&PlannedTransaction> {
        self.planned.iter().find(|planned| planned.id == id)
    }

    pub fn planned_transaction_mut(&mut self, id: Uuid) -> Option<&mut PlannedTransaction> {
        self.planned.iter_mut().find(|planned| planned.id == id)
    }

    pub fn occurrence(&self, id: Uuid) -> Option<&PlannedOccurrence> {
        self.occurrences.iter().find(|occurrence| occurrence.id == id)
    }

    pub fn occurrence_mut(&mut self, id: Uuid) -> Option<&mut PlannedOccurrence> {
        self.occurrences
            .iter_mut()
            .find(|occurrence| occurrence.id == id)
    }

    pub fn occurrences_for(&self, planned_id: Uuid) -> impl Iterator<Item = &PlannedOccurrence> {
        self.occurrences
            .iter()
            .filter(move |occurrence| occurrence.planned_id == planned_id)
    }

    pub fn lender(&self, id: Uuid) -> Option<&Lender> {
        self.lenders.iter().find(|lender| lender.id == id)
    }

    pub fn lender_by_name(&self, name: &str) -> Option<&Lender> {
        self.lenders
            .iter()
            .find(|lender| lender.name.eq_ignore_ascii_case(name))
    }

    pub fn loan(&self, id: Uuid) -> Option<&Loan> {
        self.loans.iter().find(|loan| loan.id == id)
    }

    pub fn loan_mut(&mut self, id: Uuid) -> Option<&mut Loan> {
        self.loans.iter_mut().find(|loan| loan.id == id)
    }

    pub fn payment(&self, id: Uuid) -> Option<&LoanPayment> {
        self.payments.iter().find(|payment| payment.id == id)
    }

    pub fn payment_mut(&mut self, id: Uuid) -> Option<&mut LoanPayment> {
        self.payments.iter_mut().find(|payment| payment.id == id)
    }

    pub fn payments_for(&self, loan_id: Uuid) -> impl Iterator<Item = &LoanPayment> {
        self.payments
            .iter()
            .filter(move |payment| payment.loan_id == loan_id)
    }

    pub fn payments_for_mut(&mut self, loan_id: Uuid) -> impl Iterator<Item = &mut LoanPayment> {
        self.payments
            .iter_mut()
            .filter(move |payment| payment.loan_id == loan_id)
    }

    pub fn transfers_for(&self, loan_id: Uuid) -> impl Iterator<Item = &DebtTransfer> {
        self.transfers
            .iter()
            .filter(move |transfer| transfer.loan_id == loan_id)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}
