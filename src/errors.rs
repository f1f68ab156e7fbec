use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::OccurrenceStatus;

/// Broad classification of a [`LedgerError`], mirroring how callers are
/// expected to react rather than which operation produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    InvalidStateTransition,
    ReferentialIntegrity,
    BusinessRule,
    Persistence,
}

/// Error type that captures scheduling-core failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid state transition on {entity}: {from} cannot {attempted}")]
    InvalidStateTransition {
        entity: Uuid,
        from: OccurrenceStatus,
        attempted: &'static str,
    },
    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),
    #[error("Planned transaction not found: {0}")]
    PlannedTransactionNotFound(Uuid),
    #[error("Occurrence not found: {0}")]
    OccurrenceNotFound(Uuid),
    #[error("Lender not found: {0}")]
    LenderNotFound(Uuid),
    #[error("Loan not found: {0}")]
    LoanNotFound(Uuid),
    #[error("Loan payment not found: {0}")]
    PaymentNotFound(Uuid),
    #[error("Lender name already in use: {0}")]
    DuplicateLenderName(String),
    #[error("Loan {0} is already settled")]
    LoanAlreadySettled(Uuid),
    #[error("Lender {lender} already holds loan {loan}")]
    SelfTransferRejected { loan: Uuid, lender: Uuid },
    #[error("Transfer amount must be positive, got {0}")]
    InvalidTransferAmount(Decimal),
    #[error("Loan {loan} is held by {actual}, not {expected}")]
    TransferSourceMismatch {
        loan: Uuid,
        expected: Uuid,
        actual: Uuid,
    },
    #[error("Schedule for loan {0} already has non-pending payments")]
    ScheduleAlreadyExecuted(Uuid),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) | LedgerError::InvalidTransferAmount(_) => {
                ErrorKind::Validation
            }
            LedgerError::InvalidStateTransition { .. } => ErrorKind::InvalidStateTransition,
            LedgerError::CategoryNotFound(_)
            | LedgerError::PlannedTransactionNotFound(_)
            | LedgerError::OccurrenceNotFound(_)
            | LedgerError::LenderNotFound(_)
            | LedgerError::LoanNotFound(_)
            | LedgerError::PaymentNotFound(_) => ErrorKind::ReferentialIntegrity,
            LedgerError::DuplicateLenderName(_)
            | LedgerError::LoanAlreadySettled(_)
            | LedgerError::SelfTransferRejected { .. }
            | LedgerError::TransferSourceMismatch { .. }
            | LedgerError::ScheduleAlreadyExecuted(_) => ErrorKind::BusinessRule,
            LedgerError::Storage(_) | LedgerError::Io(_) | LedgerError::Serde(_) => {
                ErrorKind::Persistence
            }
        }
    }
}
