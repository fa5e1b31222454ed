//! Record types for the three door collections.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A pre-purchased ticket batch awaiting physical check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preorder {
    pub id: i64,
    pub full_name: String,
    /// Total admissions purchased.
    pub quantity: i64,
    /// Admissions checked in so far. `None` means nobody has arrived yet.
    pub checked_in_count: Option<i64>,
    pub final_price: i64,
    pub payment_method: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Option<i64>,
}

impl Preorder {
    /// Admissions checked in, treating a missing count as zero.
    pub fn checked_in(&self) -> i64 {
        self.checked_in_count.unwrap_or(0)
    }

    /// Admissions still expected at the door.
    pub fn remaining(&self) -> i64 {
        self.quantity - self.checked_in()
    }

    pub fn is_complete(&self) -> bool {
        self.remaining() <= 0
    }

    /// Whether `value` is an admissible checked-in count for this preorder.
    pub fn accepts_count(&self, value: i64) -> bool {
        (0..=self.quantity).contains(&value)
    }
}

/// An on-site ticket purchase. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorSale {
    pub id: i64,
    pub full_name: String,
    pub quantity: i64,
    /// Price fixed at the moment of sale.
    pub final_price: i64,
    pub payment_method: String,
    /// Calendar date of the sale.
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Option<i64>,
}

/// Append-only ledger entry carrying an admission delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: i64,
    pub count: i64,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Option<i64>,
}

/// Insert payload for a door sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDoorSale {
    pub full_name: String,
    pub quantity: i64,
    pub final_price: i64,
    pub payment_method: String,
}

/// Import payload for a preorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPreorder {
    pub full_name: String,
    pub quantity: i64,
    pub final_price: i64,
    pub payment_method: String,
    pub date: NaiveDate,
}
