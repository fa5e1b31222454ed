use async_trait::async_trait;
use thiserror::Error;

use super::types::{Attendance, DoorSale, NewDoorSale, NewPreorder, Preorder};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Record not found: {0}")]
    NotFound(i64),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(ref err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Constraint(e.to_string())
            }
            rusqlite::Error::SqliteFailure(ref err, _)
                if matches!(
                    err.code,
                    rusqlite::ErrorCode::DatabaseBusy
                        | rusqlite::ErrorCode::DatabaseLocked
                        | rusqlite::ErrorCode::CannotOpen
                ) =>
            {
                StoreError::Unavailable(e.to_string())
            }
            rusqlite::Error::FromSqlConversionFailure(..) => {
                StoreError::Serialization(e.to_string())
            }
            _ => StoreError::Database(e.to_string()),
        }
    }
}

/// Data access for preorders, door sales and the attendance ledger.
///
/// Every call either fully succeeds or fully fails. Nothing here retries.
/// An empty collection is `Ok(vec![])`; a failed read is always an error.
#[async_trait]
pub trait DoorStore: Send + Sync {
    /// All preorders, ordered by name ascending.
    async fn fetch_preorders(&self) -> Result<Vec<Preorder>, StoreError>;

    /// Import a preorder.
    async fn create_preorder(&self, preorder: &NewPreorder) -> Result<Preorder, StoreError>;

    /// Set a preorder's checked-in count and touch its `updated_at`.
    ///
    /// Bounds are the caller's responsibility.
    async fn set_preorder_checked(&self, id: i64, new_count: i64) -> Result<Preorder, StoreError>;

    /// All door sales, most recent date first, ties by id descending.
    async fn fetch_door_sales(&self) -> Result<Vec<DoorSale>, StoreError>;

    /// Insert a door sale dated today.
    async fn create_door_sale(&self, sale: &NewDoorSale) -> Result<DoorSale, StoreError>;

    /// Append one ledger entry with the given signed count.
    async fn insert_attendance(&self, delta: i64) -> Result<Attendance, StoreError>;

    /// All ledger entries in insertion order.
    async fn fetch_attendances(&self) -> Result<Vec<Attendance>, StoreError>;

    /// Set the checked-in count and, when `delta > 0`, append the matching
    /// ledger entry as a single unit.
    async fn check_in_with_ledger(
        &self,
        id: i64,
        new_count: i64,
        delta: i64,
    ) -> Result<(Preorder, Option<Attendance>), StoreError>;

    /// Insert a door sale and its ledger entry as a single unit.
    async fn create_door_sale_with_ledger(
        &self,
        sale: &NewDoorSale,
    ) -> Result<(DoorSale, Attendance), StoreError>;
}
