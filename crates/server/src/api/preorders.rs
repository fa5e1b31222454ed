//! Preorder check-in API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use puerta_core::{
    Attendance, BoardStats, CheckInError, CheckInOutcome, NewPreorder, Preorder, StoreError,
};

use super::ErrorResponse;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing preorders
#[derive(Debug, Deserialize)]
pub struct ListPreordersParams {
    /// Case-insensitive substring of the buyer name
    pub q: Option<String>,
}

/// Request body for setting a checked-in count
#[derive(Debug, Deserialize)]
pub struct UpdateCheckInBody {
    pub checked_in_count: i64,
}

/// A preorder with the derived fields the check-in list displays
#[derive(Debug, Serialize)]
pub struct PreorderView {
    #[serde(flatten)]
    pub preorder: Preorder,
    pub checked_in: i64,
    pub remaining: i64,
    pub complete: bool,
    pub busy: bool,
}

impl PreorderView {
    pub fn new(preorder: Preorder, busy: bool) -> Self {
        Self {
            checked_in: preorder.checked_in(),
            remaining: preorder.remaining(),
            complete: preorder.is_complete(),
            busy,
            preorder,
        }
    }
}

/// Response for listing preorders
#[derive(Debug, Serialize)]
pub struct ListPreordersResponse {
    pub preorders: Vec<PreorderView>,
    pub stats: BoardStats,
}

/// Response for reloading preorders from the store
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub loaded: usize,
}

/// Response for a committed check-in update
#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub preorder: PreorderView,
    pub previous: i64,
    pub delta: i64,
    pub ledger_entry: Option<Attendance>,
}

impl From<CheckInOutcome> for CheckInResponse {
    fn from(outcome: CheckInOutcome) -> Self {
        Self {
            preorder: PreorderView::new(outcome.preorder, false),
            previous: outcome.previous,
            delta: outcome.delta,
            ledger_entry: outcome.ledger_entry,
        }
    }
}

/// Error response for check-in updates
#[derive(Debug, Serialize)]
pub struct CheckInErrorResponse {
    pub error: String,
    /// Row already committed when only the ledger entry failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preorder: Option<PreorderView>,
}

fn store_error_status(e: &StoreError) -> StatusCode {
    match e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn check_in_error_response(e: CheckInError) -> (StatusCode, Json<CheckInErrorResponse>) {
    let error = e.to_string();
    let (status, preorder) = match e {
        CheckInError::NotFound(_) => (StatusCode::NOT_FOUND, None),
        CheckInError::OutOfRange { .. } => (StatusCode::UNPROCESSABLE_ENTITY, None),
        CheckInError::Busy(_) => (StatusCode::CONFLICT, None),
        CheckInError::Store(ref source) => (store_error_status(source), None),
        CheckInError::LedgerDiverged { preorder, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Some(PreorderView::new(preorder, false)),
        ),
    };
    (status, Json(CheckInErrorResponse { error, preorder }))
}

// ============================================================================
// Handlers
// ============================================================================

/// List preorders, filtered by name and sorted for display
pub async fn list_preorders(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListPreordersParams>,
) -> Json<ListPreordersResponse> {
    let board = state.board();
    let query = params.q.unwrap_or_default();

    let preorders = board
        .view(&query)
        .await
        .into_iter()
        .map(|p| {
            let busy = board.is_busy(p.id);
            PreorderView::new(p, busy)
        })
        .collect();

    Json(ListPreordersResponse {
        preorders,
        stats: board.stats().await,
    })
}

/// Import a preorder
pub async fn create_preorder(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewPreorder>,
) -> Result<(StatusCode, Json<PreorderView>), impl IntoResponse> {
    if body.full_name.trim().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::new("full_name must not be empty")),
        ));
    }
    if body.quantity < 1 {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::new(format!(
                "Quantity must be at least 1, got {}",
                body.quantity
            ))),
        ));
    }

    let preorder = match state.store().create_preorder(&body).await {
        Ok(preorder) => preorder,
        Err(e) => {
            return Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new(e)),
            ));
        }
    };
    info!(
        preorder_id = preorder.id,
        quantity = preorder.quantity,
        "Preorder imported"
    );

    // The board only learns about new rows through a reload.
    if let Err(e) = state.board().load().await {
        warn!("Failed to reload preorders after import: {}", e);
    }

    Ok((StatusCode::CREATED, Json(PreorderView::new(preorder, false))))
}

/// Replace the board contents with the store's current preorders
pub async fn reload_preorders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, impl IntoResponse> {
    match state.board().load().await {
        Ok(loaded) => Ok(Json(ReloadResponse { loaded })),
        Err(e) => Err((StatusCode::BAD_GATEWAY, Json(ErrorResponse::new(e)))),
    }
}

/// Set the checked-in count of one preorder
pub async fn update_check_in(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateCheckInBody>,
) -> Result<Json<CheckInResponse>, impl IntoResponse> {
    state
        .board()
        .update_check_in(id, body.checked_in_count)
        .await
        .map(|outcome| Json(CheckInResponse::from(outcome)))
        .map_err(check_in_error_response)
}
