//! Data access for the door collections: preorders, door sales and the
//! attendance ledger.

mod sqlite;
mod traits;
mod types;

pub use sqlite::SqliteDoorStore;
pub use traits::{DoorStore, StoreError};
pub use types::{Attendance, DoorSale, NewDoorSale, NewPreorder, Preorder};
