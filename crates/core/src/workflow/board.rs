//! Preorder check-in board.
//!
//! Holds the process-local copy of the preorder list used by the check-in
//! surface. Updates are applied optimistically and rolled back wholesale to
//! a snapshot when the store rejects them.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::CheckInError;
use crate::config::LedgerMode;
use crate::metrics::{ADMISSIONS_RECORDED, CHECK_IN_UPDATES, LEDGER_DIVERGENCES};
use crate::store::{Attendance, DoorStore, Preorder, StoreError};

/// Result of a committed check-in update.
#[derive(Debug, Clone, Serialize)]
pub struct CheckInOutcome {
    /// Canonical row returned by the store.
    pub preorder: Preorder,
    /// Checked-in count before the update.
    pub previous: i64,
    /// `new - previous`. Only positive deltas reach the ledger.
    pub delta: i64,
    pub ledger_entry: Option<Attendance>,
}

/// Counters shown above the check-in list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoardStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

/// Check-in surface state for preorders.
pub struct PreorderBoard {
    store: Arc<dyn DoorStore>,
    mode: LedgerMode,
    rows: RwLock<Vec<Preorder>>,
    busy: Mutex<HashSet<i64>>,
}

/// Clears a row's busy mark when dropped.
struct BusyGuard<'a> {
    busy: &'a Mutex<HashSet<i64>>,
    id: i64,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut busy) = self.busy.lock() {
            busy.remove(&self.id);
        }
    }
}

impl PreorderBoard {
    pub fn new(store: Arc<dyn DoorStore>, mode: LedgerMode) -> Self {
        Self {
            store,
            mode,
            rows: RwLock::new(Vec::new()),
            busy: Mutex::new(HashSet::new()),
        }
    }

    /// Replace the local rows with the store's preorders.
    ///
    /// On failure the current rows are kept.
    pub async fn load(&self) -> Result<usize, StoreError> {
        let preorders = self.store.fetch_preorders().await?;
        let count = preorders.len();
        *self.rows.write().await = preorders;
        debug!(count, "Loaded preorders");
        Ok(count)
    }

    /// Current local rows, in store order.
    pub async fn rows(&self) -> Vec<Preorder> {
        self.rows.read().await.clone()
    }

    /// Rows matching `query`, incomplete first, then by name.
    pub async fn view(&self, query: &str) -> Vec<Preorder> {
        filter_and_sort(&self.rows.read().await, query)
    }

    pub async fn stats(&self) -> BoardStats {
        let rows = self.rows.read().await;
        let completed = rows.iter().filter(|p| p.is_complete()).count();
        BoardStats {
            total: rows.len(),
            pending: rows.len() - completed,
            completed,
        }
    }

    /// Whether an update for `id` is in flight.
    pub fn is_busy(&self, id: i64) -> bool {
        self.busy
            .lock()
            .map(|busy| busy.contains(&id))
            .unwrap_or(false)
    }

    /// Set the checked-in count of preorder `id` to `new_value`.
    ///
    /// A positive delta appends one attendance entry. A decrease writes no
    /// ledger entry. Any store failure restores the rows captured before the
    /// optimistic update.
    ///
    /// The restore replaces every row, including rows other updates committed
    /// while this one was in flight. Call [`load`](Self::load) after an error
    /// to pick up the store's current state.
    pub async fn update_check_in(
        &self,
        id: i64,
        new_value: i64,
    ) -> Result<CheckInOutcome, CheckInError> {
        let result = self.apply_check_in(id, new_value).await;
        match &result {
            Ok(outcome) => {
                CHECK_IN_UPDATES.with_label_values(&["ok"]).inc();
                if let Some(entry) = &outcome.ledger_entry {
                    ADMISSIONS_RECORDED.inc_by(entry.count.unsigned_abs());
                }
            }
            Err(e) => {
                CHECK_IN_UPDATES.with_label_values(&[e.metric_label()]).inc();
            }
        }
        result
    }

    async fn apply_check_in(
        &self,
        id: i64,
        new_value: i64,
    ) -> Result<CheckInOutcome, CheckInError> {
        let (snapshot, previous, _busy) = {
            let mut rows = self.rows.write().await;
            let row = rows
                .iter()
                .find(|p| p.id == id)
                .ok_or(CheckInError::NotFound(id))?;

            if !row.accepts_count(new_value) {
                return Err(CheckInError::OutOfRange {
                    id,
                    value: new_value,
                    quantity: row.quantity,
                });
            }
            let previous = row.checked_in();

            let busy = self.mark_busy(id)?;
            let snapshot = rows.clone();
            if let Some(row) = rows.iter_mut().find(|p| p.id == id) {
                row.checked_in_count = Some(new_value);
            }
            (snapshot, previous, busy)
        };

        let delta = new_value - previous;
        let committed = match self.mode {
            LedgerMode::Sequential => self.write_sequential(id, new_value, delta).await,
            LedgerMode::Transactional => self
                .store
                .check_in_with_ledger(id, new_value, delta)
                .await
                .map_err(CheckInError::from),
        };

        match committed {
            Ok((preorder, ledger_entry)) => {
                let mut rows = self.rows.write().await;
                if let Some(row) = rows.iter_mut().find(|p| p.id == id) {
                    *row = preorder.clone();
                }
                info!(
                    preorder_id = id,
                    previous,
                    checked_in = new_value,
                    delta,
                    "Check-in updated"
                );
                Ok(CheckInOutcome {
                    preorder,
                    previous,
                    delta,
                    ledger_entry,
                })
            }
            Err(e) => {
                *self.rows.write().await = snapshot;
                warn!(preorder_id = id, error = %e, "Check-in update rolled back");
                Err(e)
            }
        }
    }

    async fn write_sequential(
        &self,
        id: i64,
        new_value: i64,
        delta: i64,
    ) -> Result<(Preorder, Option<Attendance>), CheckInError> {
        let preorder = self.store.set_preorder_checked(id, new_value).await?;
        if delta <= 0 {
            return Ok((preorder, None));
        }

        match self.store.insert_attendance(delta).await {
            Ok(entry) => Ok((preorder, Some(entry))),
            Err(source) => {
                LEDGER_DIVERGENCES.with_label_values(&["check_in"]).inc();
                warn!(
                    preorder_id = id,
                    delta,
                    error = %source,
                    "Check-in committed but ledger entry failed"
                );
                Err(CheckInError::LedgerDiverged {
                    preorder,
                    delta,
                    source,
                })
            }
        }
    }

    fn mark_busy(&self, id: i64) -> Result<BusyGuard<'_>, CheckInError> {
        let mut busy = self
            .busy
            .lock()
            .map_err(|_| CheckInError::Busy(id))?;
        if !busy.insert(id) {
            return Err(CheckInError::Busy(id));
        }
        Ok(BusyGuard {
            busy: &self.busy,
            id,
        })
    }
}

/// Case-insensitive substring filter on name; incomplete rows first, then
/// by name.
pub fn filter_and_sort(rows: &[Preorder], query: &str) -> Vec<Preorder> {
    let term = query.trim().to_lowercase();
    let mut matched: Vec<Preorder> = rows
        .iter()
        .filter(|p| term.is_empty() || p.full_name.to_lowercase().contains(&term))
        .cloned()
        .collect();

    matched.sort_by(|a, b| {
        a.is_complete()
            .cmp(&b.is_complete())
            .then_with(|| a.full_name.to_lowercase().cmp(&b.full_name.to_lowercase()))
            .then_with(|| a.id.cmp(&b.id))
    });
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockDoorStore, StoreOp};

    async fn board_with(
        preorders: Vec<Preorder>,
        mode: LedgerMode,
    ) -> (Arc<MockDoorStore>, PreorderBoard) {
        let store = Arc::new(MockDoorStore::with_preorders(preorders));
        let board = PreorderBoard::new(Arc::clone(&store) as Arc<dyn DoorStore>, mode);
        board.load().await.unwrap();
        (store, board)
    }

    fn down() -> StoreError {
        StoreError::Unavailable("connection refused".to_string())
    }

    #[tokio::test]
    async fn test_increase_writes_one_ledger_entry() {
        let (store, board) = board_with(
            vec![fixtures::preorder(1, "Ana", 3, Some(1))],
            LedgerMode::Sequential,
        )
        .await;

        let outcome = board.update_check_in(1, 3).await.unwrap();

        assert_eq!(outcome.previous, 1);
        assert_eq!(outcome.delta, 2);
        assert_eq!(outcome.preorder.checked_in_count, Some(3));
        assert_eq!(store.preorder(1).await.unwrap().checked_in_count, Some(3));

        let entries = store.attendances().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].count, 2);
    }

    #[tokio::test]
    async fn test_null_count_counts_as_zero() {
        let (store, board) =
            board_with(vec![fixtures::preorder(1, "Ana", 2, None)], LedgerMode::Sequential).await;

        let outcome = board.update_check_in(1, 1).await.unwrap();
        assert_eq!(outcome.previous, 0);
        assert_eq!(store.attendances().await[0].count, 1);
    }

    #[tokio::test]
    async fn test_decrease_writes_no_ledger_entry() {
        let (store, board) = board_with(
            vec![fixtures::preorder(1, "Ana", 3, Some(3))],
            LedgerMode::Sequential,
        )
        .await;

        let outcome = board.update_check_in(1, 1).await.unwrap();

        assert_eq!(outcome.delta, -2);
        assert!(outcome.ledger_entry.is_none());
        assert_eq!(store.preorder(1).await.unwrap().checked_in_count, Some(1));
        assert!(store.attendances().await.is_empty());
        assert_eq!(store.call_count(StoreOp::InsertAttendance).await, 0);
    }

    #[tokio::test]
    async fn test_same_value_writes_no_ledger_entry() {
        let (store, board) = board_with(
            vec![fixtures::preorder(1, "Ana", 3, Some(2))],
            LedgerMode::Sequential,
        )
        .await;

        let outcome = board.update_check_in(1, 2).await.unwrap();
        assert_eq!(outcome.delta, 0);
        assert!(store.attendances().await.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_makes_no_store_call() {
        let (store, board) = board_with(
            vec![fixtures::preorder(1, "Ana", 3, Some(1))],
            LedgerMode::Sequential,
        )
        .await;
        let before = board.rows().await;

        let too_high = board.update_check_in(1, 4).await;
        assert!(matches!(
            too_high,
            Err(CheckInError::OutOfRange {
                id: 1,
                value: 4,
                quantity: 3
            })
        ));

        let negative = board.update_check_in(1, -1).await;
        assert!(matches!(negative, Err(CheckInError::OutOfRange { .. })));

        assert_eq!(board.rows().await, before);
        assert_eq!(store.calls().await, vec![StoreOp::FetchPreorders]);
    }

    #[tokio::test]
    async fn test_missing_row_is_explicit_not_found() {
        let (store, board) = board_with(
            vec![fixtures::preorder(1, "Ana", 3, None)],
            LedgerMode::Sequential,
        )
        .await;

        let result = board.update_check_in(99, 1).await;
        assert!(matches!(result, Err(CheckInError::NotFound(99))));
        assert!(result.unwrap_err().is_rejection());
        assert_eq!(store.calls().await, vec![StoreOp::FetchPreorders]);
    }

    #[tokio::test]
    async fn test_state_write_failure_restores_snapshot() {
        let (store, board) = board_with(
            vec![
                fixtures::preorder(1, "Ana", 3, Some(1)),
                fixtures::preorder(2, "Luis", 2, None),
            ],
            LedgerMode::Sequential,
        )
        .await;
        let before = board.rows().await;
        store.fail_on(StoreOp::SetPreorderChecked, down()).await;

        let result = board.update_check_in(1, 2).await;

        assert!(matches!(result, Err(CheckInError::Store(_))));
        assert_eq!(board.rows().await, before);
        assert!(!board.is_busy(1));
        assert!(store.attendances().await.is_empty());
    }

    #[tokio::test]
    async fn test_ledger_failure_reports_divergence() {
        let (store, board) = board_with(
            vec![fixtures::preorder(1, "Ana", 3, Some(1))],
            LedgerMode::Sequential,
        )
        .await;
        let before = board.rows().await;
        store.fail_on(StoreOp::InsertAttendance, down()).await;

        let result = board.update_check_in(1, 3).await;

        match result {
            Err(CheckInError::LedgerDiverged {
                preorder, delta, ..
            }) => {
                assert_eq!(preorder.checked_in_count, Some(3));
                assert_eq!(delta, 2);
            }
            other => panic!("expected ledger divergence, got {:?}", other),
        }
        // The store kept the count; the local rows did not.
        assert_eq!(store.preorder(1).await.unwrap().checked_in_count, Some(3));
        assert_eq!(board.rows().await, before);
        assert!(store.attendances().await.is_empty());
    }

    #[tokio::test]
    async fn test_transactional_ledger_failure_commits_nothing() {
        let (store, board) = board_with(
            vec![fixtures::preorder(1, "Ana", 3, Some(1))],
            LedgerMode::Transactional,
        )
        .await;
        store.fail_on(StoreOp::InsertAttendance, down()).await;

        let result = board.update_check_in(1, 3).await;

        assert!(matches!(result, Err(CheckInError::Store(_))));
        assert_eq!(store.preorder(1).await.unwrap().checked_in_count, Some(1));
        assert!(store.attendances().await.is_empty());
        assert_eq!(board.rows().await[0].checked_in_count, Some(1));
    }

    #[tokio::test]
    async fn test_transactional_success_uses_single_call() {
        let (store, board) = board_with(
            vec![fixtures::preorder(1, "Ana", 3, Some(1))],
            LedgerMode::Transactional,
        )
        .await;

        let outcome = board.update_check_in(1, 2).await.unwrap();
        assert_eq!(outcome.ledger_entry.map(|e| e.count), Some(1));
        assert_eq!(
            store.calls().await,
            vec![StoreOp::FetchPreorders, StoreOp::CheckInWithLedger]
        );
    }

    #[tokio::test]
    async fn test_successive_updates_keep_bounds() {
        let (store, board) = board_with(
            vec![fixtures::preorder(1, "Ana", 2, None)],
            LedgerMode::Sequential,
        )
        .await;

        for value in [1, 2, 3, 0, 2, -1] {
            let _ = board.update_check_in(1, value).await;
            let stored = store.preorder(1).await.unwrap();
            assert!((0..=stored.quantity).contains(&stored.checked_in()));
        }

        let total: i64 = store.attendances().await.iter().map(|a| a.count).sum();
        assert_eq!(total, 4);
    }

    #[tokio::test]
    async fn test_reload_after_divergence_shows_committed_count() {
        let (store, board) = board_with(
            vec![fixtures::preorder(1, "Ana", 3, Some(1))],
            LedgerMode::Sequential,
        )
        .await;
        store
            .fail_on(
                StoreOp::InsertAttendance,
                StoreError::Unavailable("down".to_string()),
            )
            .await;

        let result = board.update_check_in(1, 3).await;
        assert!(matches!(result, Err(CheckInError::LedgerDiverged { .. })));
        assert_eq!(board.rows().await[0].checked_in_count, Some(1));

        board.load().await.unwrap();
        assert_eq!(board.rows().await[0].checked_in_count, Some(3));
    }

    #[tokio::test]
    async fn test_busy_row_rejects_second_update() {
        let (_store, board) = board_with(
            vec![fixtures::preorder(1, "Ana", 3, None)],
            LedgerMode::Sequential,
        )
        .await;

        let guard = board.mark_busy(1).unwrap();
        assert!(board.is_busy(1));
        assert!(matches!(
            board.update_check_in(1, 1).await,
            Err(CheckInError::Busy(1))
        ));

        drop(guard);
        assert!(!board.is_busy(1));
        assert!(board.update_check_in(1, 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_rows() {
        let (store, board) = board_with(
            vec![fixtures::preorder(1, "Ana", 3, None)],
            LedgerMode::Sequential,
        )
        .await;
        store.fail_on(StoreOp::FetchPreorders, down()).await;

        assert!(board.load().await.is_err());
        assert_eq!(board.rows().await.len(), 1);
    }

    #[tokio::test]
    async fn test_stats() {
        let (_store, board) = board_with(
            vec![
                fixtures::preorder(1, "Ana", 3, Some(3)),
                fixtures::preorder(2, "Luis", 2, None),
                fixtures::preorder(3, "Zoe", 1, Some(0)),
            ],
            LedgerMode::Sequential,
        )
        .await;

        assert_eq!(
            board.stats().await,
            BoardStats {
                total: 3,
                pending: 2,
                completed: 1
            }
        );
    }

    #[test]
    fn test_filter_and_sort_incomplete_first() {
        let rows = vec![
            fixtures::preorder(1, "Ana", 2, Some(2)),
            fixtures::preorder(2, "bruno", 2, None),
            fixtures::preorder(3, "Carla", 1, Some(0)),
        ];

        let names: Vec<String> = filter_and_sort(&rows, "")
            .into_iter()
            .map(|p| p.full_name)
            .collect();
        assert_eq!(names, vec!["bruno", "Carla", "Ana"]);
    }

    #[test]
    fn test_filter_case_insensitive_substring() {
        let rows = vec![
            fixtures::preorder(1, "Ana Pérez", 2, None),
            fixtures::preorder(2, "Juana", 2, None),
            fixtures::preorder(3, "Luis", 1, None),
        ];

        let ids: Vec<i64> = filter_and_sort(&rows, "  ANA ")
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(filter_and_sort(&rows, "xyz").is_empty());
    }
}
