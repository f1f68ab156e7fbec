pub mod loan_service;
pub mod planning_service;
pub mod query_service;

pub use loan_service::LoanService;
pub use planning_service::PlanningService;
pub use query_service::{
    LoanStatistics, OverdueEntry, PendingEntry, QueryService, WindowSummary,
};

use crate::errors::{ErrorKind, LedgerError};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("{0}")]
    Invalid(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Ledger(error) => error.kind(),
            ServiceError::Invalid(_) => ErrorKind::Validation,
        }
    }
}
