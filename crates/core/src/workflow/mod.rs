//! Check-in and door-sale workflows over a [`DoorStore`](crate::store::DoorStore).

mod board;
mod counter;
mod error;
pub mod ledger;

pub use board::{filter_and_sort, BoardStats, CheckInOutcome, PreorderBoard};
pub use counter::{normalize_name, SaleCounter};
pub use error::{CheckInError, SaleError};
pub use ledger::{reconcile_ledger, repair_ledger, LedgerReport};
