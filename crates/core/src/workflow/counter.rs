//! Door sale counter.
//!
//! Unlike the check-in board, the sale list only changes after the store
//! confirms the sale.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::SaleError;
use crate::config::{LedgerMode, SalesConfig};
use crate::metrics::{ADMISSIONS_RECORDED, DOOR_SALES, LEDGER_DIVERGENCES};
use crate::store::{DoorSale, DoorStore, NewDoorSale, StoreError};

/// Door sale surface state: recorded sales, most recent first.
pub struct SaleCounter {
    store: Arc<dyn DoorStore>,
    mode: LedgerMode,
    sales: SalesConfig,
    rows: RwLock<Vec<DoorSale>>,
}

impl SaleCounter {
    pub fn new(store: Arc<dyn DoorStore>, sales: SalesConfig, mode: LedgerMode) -> Self {
        Self {
            store,
            mode,
            sales,
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Replace the local rows with the store's door sales.
    pub async fn load(&self) -> Result<usize, StoreError> {
        let sales = self.store.fetch_door_sales().await?;
        let count = sales.len();
        *self.rows.write().await = sales;
        debug!(count, "Loaded door sales");
        Ok(count)
    }

    pub async fn rows(&self) -> Vec<DoorSale> {
        self.rows.read().await.clone()
    }

    pub fn unit_price(&self) -> i64 {
        self.sales.unit_price
    }

    pub fn payment_methods(&self) -> &[String] {
        &self.sales.payment_methods
    }

    /// Total price for `quantity` admissions, or `None` if it overflows.
    pub fn quote(&self, quantity: i64) -> Option<i64> {
        quantity.checked_mul(self.sales.unit_price)
    }

    /// Price of a sale of `quantity` admissions.
    ///
    /// Rejects the same quantities `record_sale` rejects, without touching
    /// the store.
    pub fn price(&self, quantity: i64) -> Result<i64, SaleError> {
        if quantity < 1 {
            return Err(SaleError::InvalidQuantity(quantity));
        }
        self.quote(quantity).ok_or(SaleError::PriceOverflow(quantity))
    }

    /// Change owed for a cash payment, or `None` if `tendered` is short.
    pub fn change_due(&self, quantity: i64, tendered: i64) -> Option<i64> {
        let total = self.quote(quantity)?;
        tendered.checked_sub(total).filter(|change| *change >= 0)
    }

    /// Record a walk-up sale and its admissions.
    ///
    /// Every door sale is attended at the moment of sale, so the ledger
    /// entry always carries the full quantity.
    pub async fn record_sale(
        &self,
        full_name: &str,
        quantity: i64,
        payment_method: &str,
    ) -> Result<DoorSale, SaleError> {
        let result = self.apply_sale(full_name, quantity, payment_method).await;
        match &result {
            Ok(sale) => {
                DOOR_SALES.with_label_values(&["ok"]).inc();
                ADMISSIONS_RECORDED.inc_by(sale.quantity.unsigned_abs());
            }
            Err(e) => {
                DOOR_SALES.with_label_values(&[e.metric_label()]).inc();
            }
        }
        result
    }

    async fn apply_sale(
        &self,
        full_name: &str,
        quantity: i64,
        payment_method: &str,
    ) -> Result<DoorSale, SaleError> {
        let final_price = self.price(quantity)?;
        if !self.sales.payment_methods.iter().any(|m| m == payment_method) {
            return Err(SaleError::UnknownPaymentMethod(payment_method.to_string()));
        }

        let new_sale = NewDoorSale {
            full_name: normalize_name(full_name, &self.sales.placeholder_name),
            quantity,
            final_price,
            payment_method: payment_method.to_string(),
        };

        let sale = match self.mode {
            LedgerMode::Sequential => {
                let sale = self.store.create_door_sale(&new_sale).await?;
                self.rows.write().await.insert(0, sale.clone());

                if let Err(source) = self.store.insert_attendance(sale.quantity).await {
                    LEDGER_DIVERGENCES.with_label_values(&["door_sale"]).inc();
                    warn!(
                        sale_id = sale.id,
                        quantity = sale.quantity,
                        error = %source,
                        "Door sale committed but ledger entry failed"
                    );
                    return Err(SaleError::LedgerDiverged { sale, source });
                }
                sale
            }
            LedgerMode::Transactional => {
                let (sale, _entry) = self.store.create_door_sale_with_ledger(&new_sale).await?;
                self.rows.write().await.insert(0, sale.clone());
                sale
            }
        };

        info!(
            sale_id = sale.id,
            quantity = sale.quantity,
            final_price = sale.final_price,
            payment_method = %sale.payment_method,
            "Door sale recorded"
        );
        Ok(sale)
    }
}

/// Trimmed buyer name, or `placeholder` when blank.
pub fn normalize_name(full_name: &str, placeholder: &str) -> String {
    let trimmed = full_name.trim();
    if trimmed.is_empty() {
        placeholder.to_string()
    } else {
        trimmed.to_string()
    }
}
