//! Attendance ledger API handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use puerta_core::{reconcile_ledger, repair_ledger, LedgerReport};

use super::ErrorResponse;
use crate::state::AppState;

/// Compare the ledger against the check-in counts and door sales
pub async fn get_reconciliation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LedgerReport>, impl IntoResponse> {
    match reconcile_ledger(state.store()).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => Err((StatusCode::BAD_GATEWAY, Json(ErrorResponse::new(e)))),
    }
}

/// Append a compensating entry for any missing admissions
pub async fn repair(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LedgerReport>, impl IntoResponse> {
    match repair_ledger(state.store()).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => Err((StatusCode::BAD_GATEWAY, Json(ErrorResponse::new(e)))),
    }
}
