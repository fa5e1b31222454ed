//! Mock door store for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Local, Utc};
use tokio::sync::RwLock;

use crate::store::{
    Attendance, DoorSale, DoorStore, NewDoorSale, NewPreorder, Preorder, StoreError,
};

/// Store operations, for failure injection and call assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    FetchPreorders,
    CreatePreorder,
    SetPreorderChecked,
    FetchDoorSales,
    CreateDoorSale,
    InsertAttendance,
    FetchAttendances,
    CheckInWithLedger,
    CreateDoorSaleWithLedger,
}

#[derive(Debug, Default)]
struct MockState {
    preorders: Vec<Preorder>,
    door_sales: Vec<DoorSale>,
    attendances: Vec<Attendance>,
    last_id: i64,
    failures: HashMap<StoreOp, StoreError>,
    calls: Vec<StoreOp>,
}

impl MockState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    /// Record the call and return the injected failure, if any.
    fn enter(&mut self, op: StoreOp) -> Result<(), StoreError> {
        self.calls.push(op);
        self.check(op)
    }

    fn check(&self, op: StoreOp) -> Result<(), StoreError> {
        match self.failures.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn apply_checked(&mut self, id: i64, new_count: i64) -> Result<Preorder, StoreError> {
        let row = self
            .preorders
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound(id))?;
        row.checked_in_count = Some(new_count);
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    fn apply_door_sale(&mut self, sale: &NewDoorSale) -> Result<DoorSale, StoreError> {
        if sale.full_name.is_empty() {
            return Err(StoreError::Constraint(
                "door_sales.full_name cannot be empty".to_string(),
            ));
        }
        let now = Utc::now();
        let created = DoorSale {
            id: self.next_id(),
            full_name: sale.full_name.clone(),
            quantity: sale.quantity,
            final_price: sale.final_price,
            payment_method: sale.payment_method.clone(),
            date: Local::now().date_naive(),
            created_at: now,
            updated_at: now,
            user_id: None,
        };
        self.door_sales.push(created.clone());
        Ok(created)
    }

    fn apply_attendance(&mut self, delta: i64) -> Attendance {
        let now = Utc::now();
        let entry = Attendance {
            id: self.next_id(),
            count: delta,
            timestamp: now,
            created_at: now,
            updated_at: now,
            user_id: None,
        };
        self.attendances.push(entry.clone());
        entry
    }
}

/// In-memory implementation of [`DoorStore`].
///
/// Failures are injected per operation and persist until cleared. The
/// transactional operations also honour failures injected on their
/// component operations, and fail before mutating anything.
#[derive(Debug, Default)]
pub struct MockDoorStore {
    state: RwLock<MockState>,
}

impl MockDoorStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock store seeded with preorders (ids are kept as given).
    pub fn with_preorders(preorders: Vec<Preorder>) -> Self {
        let last_id = preorders.iter().map(|p| p.id).max().unwrap_or(0);
        Self {
            state: RwLock::new(MockState {
                preorders,
                last_id,
                ..Default::default()
            }),
        }
    }

    /// Make every call to `op` fail with `error`.
    pub async fn fail_on(&self, op: StoreOp, error: StoreError) {
        self.state.write().await.failures.insert(op, error);
    }

    /// Stop failing `op`.
    pub async fn clear_failure(&self, op: StoreOp) {
        self.state.write().await.failures.remove(&op);
    }

    /// Operations invoked so far, in order.
    pub async fn calls(&self) -> Vec<StoreOp> {
        self.state.read().await.calls.clone()
    }

    /// Number of times `op` was invoked.
    pub async fn call_count(&self, op: StoreOp) -> usize {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|c| **c == op)
            .count()
    }

    pub async fn preorder(&self, id: i64) -> Option<Preorder> {
        self.state
            .read()
            .await
            .preorders
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub async fn door_sales(&self) -> Vec<DoorSale> {
        self.state.read().await.door_sales.clone()
    }

    pub async fn attendances(&self) -> Vec<Attendance> {
        self.state.read().await.attendances.clone()
    }
}

#[async_trait]
impl DoorStore for MockDoorStore {
    async fn fetch_preorders(&self) -> Result<Vec<Preorder>, StoreError> {
        let mut state = self.state.write().await;
        state.enter(StoreOp::FetchPreorders)?;
        let mut preorders = state.preorders.clone();
        preorders.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(preorders)
    }

    async fn create_preorder(&self, preorder: &NewPreorder) -> Result<Preorder, StoreError> {
        let mut state = self.state.write().await;
        state.enter(StoreOp::CreatePreorder)?;
        let now = Utc::now();
        let created = Preorder {
            id: state.next_id(),
            full_name: preorder.full_name.clone(),
            quantity: preorder.quantity,
            checked_in_count: None,
            final_price: preorder.final_price,
            payment_method: preorder.payment_method.clone(),
            date: preorder.date,
            created_at: now,
            updated_at: now,
            user_id: None,
        };
        state.preorders.push(created.clone());
        Ok(created)
    }

    async fn set_preorder_checked(&self, id: i64, new_count: i64) -> Result<Preorder, StoreError> {
        let mut state = self.state.write().await;
        state.enter(StoreOp::SetPreorderChecked)?;
        state.apply_checked(id, new_count)
    }

    async fn fetch_door_sales(&self) -> Result<Vec<DoorSale>, StoreError> {
        let mut state = self.state.write().await;
        state.enter(StoreOp::FetchDoorSales)?;
        let mut sales = state.door_sales.clone();
        sales.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(sales)
    }

    async fn create_door_sale(&self, sale: &NewDoorSale) -> Result<DoorSale, StoreError> {
        let mut state = self.state.write().await;
        state.enter(StoreOp::CreateDoorSale)?;
        state.apply_door_sale(sale)
    }

    async fn insert_attendance(&self, delta: i64) -> Result<Attendance, StoreError> {
        let mut state = self.state.write().await;
        state.enter(StoreOp::InsertAttendance)?;
        Ok(state.apply_attendance(delta))
    }

    async fn fetch_attendances(&self) -> Result<Vec<Attendance>, StoreError> {
        let mut state = self.state.write().await;
        state.enter(StoreOp::FetchAttendances)?;
        Ok(state.attendances.clone())
    }

    async fn check_in_with_ledger(
        &self,
        id: i64,
        new_count: i64,
        delta: i64,
    ) -> Result<(Preorder, Option<Attendance>), StoreError> {
        let mut state = self.state.write().await;
        state.enter(StoreOp::CheckInWithLedger)?;
        state.check(StoreOp::SetPreorderChecked)?;
        if delta > 0 {
            state.check(StoreOp::InsertAttendance)?;
        }
        if !state.preorders.iter().any(|p| p.id == id) {
            return Err(StoreError::NotFound(id));
        }

        let preorder = state.apply_checked(id, new_count)?;
        let entry = (delta > 0).then(|| state.apply_attendance(delta));
        Ok((preorder, entry))
    }

    async fn create_door_sale_with_ledger(
        &self,
        sale: &NewDoorSale,
    ) -> Result<(DoorSale, Attendance), StoreError> {
        let mut state = self.state.write().await;
        state.enter(StoreOp::CreateDoorSaleWithLedger)?;
        state.check(StoreOp::CreateDoorSale)?;
        state.check(StoreOp::InsertAttendance)?;

        let created = state.apply_door_sale(sale)?;
        let entry = state.apply_attendance(sale.quantity);
        Ok((created, entry))
    }
}
