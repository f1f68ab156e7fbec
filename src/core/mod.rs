//! Coordination layer: status machine, schedule generation, debt
//! transfers, and the service facades consumed by presentation layers.

pub mod clock;
pub mod schedule;
pub mod services;
pub mod status;
pub mod transfer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use status::DueStatus;
