use thiserror::Error;

use crate::store::{DoorSale, Preorder, StoreError};

/// Why a check-in update did not complete.
#[derive(Debug, Error)]
pub enum CheckInError {
    #[error("Preorder not found: {0}")]
    NotFound(i64),

    #[error("Check-in count {value} out of range for preorder {id} (0..={quantity})")]
    OutOfRange { id: i64, value: i64, quantity: i64 },

    #[error("Preorder {0} already has an update in flight")]
    Busy(i64),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The count was committed but its ledger entry was not.
    #[error("Check-in for preorder {id} committed without its ledger entry of {delta}: {source}", id = .preorder.id)]
    LedgerDiverged {
        preorder: Preorder,
        delta: i64,
        source: StoreError,
    },
}

impl CheckInError {
    /// Rejected locally, before any store call.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            CheckInError::NotFound(_) | CheckInError::OutOfRange { .. } | CheckInError::Busy(_)
        )
    }

    pub(crate) fn metric_label(&self) -> &'static str {
        match self {
            CheckInError::NotFound(_) | CheckInError::OutOfRange { .. } | CheckInError::Busy(_) => {
                "rejected"
            }
            CheckInError::Store(_) => "store_error",
            CheckInError::LedgerDiverged { .. } => "ledger_diverged",
        }
    }
}

/// Why a door sale was not fully recorded.
#[derive(Debug, Error)]
pub enum SaleError {
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    #[error("Price of {0} admissions exceeds the supported range")]
    PriceOverflow(i64),

    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The sale was committed but its ledger entry was not.
    #[error("Door sale {id} committed without its ledger entry: {source}", id = .sale.id)]
    LedgerDiverged { sale: DoorSale, source: StoreError },
}

impl SaleError {
    /// Rejected locally, before any store call.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SaleError::InvalidQuantity(_)
                | SaleError::PriceOverflow(_)
                | SaleError::UnknownPaymentMethod(_)
        )
    }

    pub(crate) fn metric_label(&self) -> &'static str {
        match self {
            SaleError::InvalidQuantity(_)
            | SaleError::PriceOverflow(_)
            | SaleError::UnknownPaymentMethod(_) => "rejected",
            SaleError::Store(_) => "store_error",
            SaleError::LedgerDiverged { .. } => "ledger_diverged",
        }
    }
}
