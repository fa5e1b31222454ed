//! Testing utilities and an in-memory store with failure injection.
//!
//! # Example
//!
//! ```rust,ignore
//! use puerta_core::testing::{fixtures, MockDoorStore, StoreOp};
//!
//! let store = MockDoorStore::with_preorders(vec![fixtures::preorder(1, "Ana", 3, Some(1))]);
//! store.fail_on(StoreOp::InsertAttendance, StoreError::Unavailable("down".into())).await;
//! ```

mod mock_store;

pub use mock_store::{MockDoorStore, StoreOp};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{NaiveDate, Utc};

    use crate::store::{NewPreorder, Preorder};

    /// A preorder with the given identity and counts.
    pub fn preorder(id: i64, full_name: &str, quantity: i64, checked_in: Option<i64>) -> Preorder {
        let now = Utc::now();
        Preorder {
            id,
            full_name: full_name.to_string(),
            quantity,
            checked_in_count: checked_in,
            final_price: quantity * 5000,
            payment_method: "MercadoPago".to_string(),
            date: event_date(),
            created_at: now,
            updated_at: now,
            user_id: None,
        }
    }

    /// An import payload for a preorder.
    pub fn new_preorder(full_name: &str, quantity: i64) -> NewPreorder {
        NewPreorder {
            full_name: full_name.to_string(),
            quantity,
            final_price: quantity * 5000,
            payment_method: "MercadoPago".to_string(),
            date: event_date(),
        }
    }

    fn event_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap_or_default()
    }
}
