//! Domain model, date algebra, and occurrence materialization.

#[allow(clippy::module_inception)]
pub mod ledger;
pub mod loan;
pub mod materialize;
pub mod planned;
pub mod recurrence;

pub use ledger::{DateWindow, Ledger, CURRENT_SCHEMA_VERSION};
pub use loan::{DebtTransfer, Lender, LenderKind, Loan, LoanPayment, LoanStatus, SplitPolicy};
pub use materialize::{materialize_occurrences, MAX_OCCURRENCES_PER_RUN};
pub use planned::{Category, FlowKind, OccurrenceStatus, PlannedOccurrence, PlannedTransaction};
pub use recurrence::{
    IntervalUnit, RecurrenceEnd, RecurrenceRule, RecurrenceType, WeekdaySet,
};
