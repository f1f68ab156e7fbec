use serde::{Deserialize, Serialize};

use crate::ledger::materialize::MAX_OCCURRENCES_PER_RUN;

/// Tunables handed explicitly to the operations that need them. There is
/// no ambient configuration state; callers construct one value and pass it
/// down, which keeps materialization and schedule generation pure
/// functions of their inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoreConfig {
    /// Upper bound on occurrences created by one materialization call.
    pub max_occurrences_per_run: usize,
    /// Width of the "due soon" band used by pending-entry classification.
    pub due_soon_window_days: i64,
    /// Decimal places money amounts are rounded to.
    pub rounding_dp: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_occurrences_per_run: MAX_OCCURRENCES_PER_RUN,
            due_soon_window_days: 7,
            rounding_dp: 2,
        }
    }
}
