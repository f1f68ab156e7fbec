use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::recurrence::RecurrenceRule;

/// Direction of money flow for a planned transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FlowKind {
    Income,
    Expense,
}

/// Categorises planned activity for reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub kind: FlowKind,
}

impl Category {
    pub fn new(name: impl Into<String>, kind: FlowKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
        }
    }
}

/// Template for a recurring income or expense. Owns zero or one
/// recurrence rule and any number of materialized occurrences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedTransaction {
    pub id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub flow: FlowKind,
    pub category_id: Option<Uuid>,
    pub start_date: NaiveDate,
    #[serde(default = "PlannedTransaction::active_default")]
    pub active: bool,
    pub rule: Option<RecurrenceRule>,
}

impl PlannedTransaction {
    pub fn new(
        description: impl Into<String>,
        amount: Decimal,
        flow: FlowKind,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount,
            flow,
            category_id: None,
            start_date,
            active: true,
            rule: None,
        }
    }

    pub fn with_rule(mut self, rule: RecurrenceRule) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn with_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    fn active_default() -> bool {
        true
    }
}

/// Lifecycle state shared by planned occurrences and loan payments.
/// `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum OccurrenceStatus {
    #[default]
    Pending,
    Executed,
    ExecutedLate,
    Skipped,
}

impl OccurrenceStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OccurrenceStatus::Pending)
    }
}

impl fmt::Display for OccurrenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OccurrenceStatus::Pending => "pending",
            OccurrenceStatus::Executed => "executed",
            OccurrenceStatus::ExecutedLate => "executed-late",
            OccurrenceStatus::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

/// One concrete, dated instance materialized from a planned transaction.
/// `sequence` is the rule-relative occurrence index; it is the anchor for
/// count-based end conditions and for idempotent re-materialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedOccurrence {
    pub id: Uuid,
    pub planned_id: Uuid,
    pub sequence: u32,
    pub scheduled_date: NaiveDate,
    pub amount: Decimal,
    pub status: OccurrenceStatus,
    pub executed_date: Option<NaiveDate>,
    pub executed_amount: Option<Decimal>,
    /// Reference to the realized transaction record created by the caller.
    pub realized_transaction_id: Option<Uuid>,
    pub skip_reason: Option<String>,
    pub skipped_on: Option<NaiveDate>,
}

impl PlannedOccurrence {
    pub fn new(planned_id: Uuid, sequence: u32, scheduled_date: NaiveDate, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            planned_id,
            sequence,
            scheduled_date,
            amount,
            status: OccurrenceStatus::Pending,
            executed_date: None,
            executed_amount: None,
            realized_transaction_id: None,
            skip_reason: None,
            skipped_on: None,
        }
    }
}
