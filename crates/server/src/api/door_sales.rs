//! Door sale API handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use puerta_core::{DoorSale, SaleError};

use super::ErrorResponse;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for recording a door sale
#[derive(Debug, Deserialize)]
pub struct CreateDoorSaleBody {
    /// Buyer name; blank or null falls back to the configured placeholder
    #[serde(default)]
    pub full_name: Option<String>,
    pub quantity: i64,
    pub payment_method: String,
}

/// Query parameters for a price quote
#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub quantity: i64,
    /// Cash handed over, for computing change
    pub tendered: Option<i64>,
}

/// Response for listing door sales
#[derive(Debug, Serialize)]
pub struct ListDoorSalesResponse {
    pub sales: Vec<DoorSale>,
    pub total: usize,
    pub unit_price: i64,
    pub payment_methods: Vec<String>,
}

/// Response for a price quote
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub unit_price: i64,
    pub quantity: i64,
    pub total: i64,
    /// `None` when no cash was tendered or it does not cover the total
    pub change: Option<i64>,
}

/// Response for reloading door sales from the store
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub loaded: usize,
}

/// Error response for door sales
#[derive(Debug, Serialize)]
pub struct SaleErrorResponse {
    pub error: String,
    /// Sale already committed when only the ledger entry failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale: Option<DoorSale>,
}

fn sale_error_response(e: SaleError) -> (StatusCode, Json<SaleErrorResponse>) {
    let error = e.to_string();
    let (status, sale) = match e {
        SaleError::InvalidQuantity(_)
        | SaleError::PriceOverflow(_)
        | SaleError::UnknownPaymentMethod(_) => (StatusCode::UNPROCESSABLE_ENTITY, None),
        SaleError::Store(_) => (StatusCode::BAD_GATEWAY, None),
        SaleError::LedgerDiverged { sale, .. } => (StatusCode::INTERNAL_SERVER_ERROR, Some(sale)),
    };
    (status, Json(SaleErrorResponse { error, sale }))
}

// ============================================================================
// Handlers
// ============================================================================

/// List door sales, newest first
pub async fn list_door_sales(State(state): State<Arc<AppState>>) -> Json<ListDoorSalesResponse> {
    let counter = state.counter();
    let sales = counter.rows().await;
    Json(ListDoorSalesResponse {
        total: sales.len(),
        sales,
        unit_price: counter.unit_price(),
        payment_methods: counter.payment_methods().to_vec(),
    })
}

/// Record a walk-up sale
pub async fn create_door_sale(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateDoorSaleBody>,
) -> Result<(StatusCode, Json<DoorSale>), impl IntoResponse> {
    state
        .counter()
        .record_sale(
            body.full_name.as_deref().unwrap_or(""),
            body.quantity,
            &body.payment_method,
        )
        .await
        .map(|sale| (StatusCode::CREATED, Json(sale)))
        .map_err(sale_error_response)
}

/// Replace the counter contents with the store's current door sales
pub async fn reload_door_sales(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, impl IntoResponse> {
    match state.counter().load().await {
        Ok(loaded) => Ok(Json(ReloadResponse { loaded })),
        Err(e) => Err((StatusCode::BAD_GATEWAY, Json(ErrorResponse::new(e)))),
    }
}

/// Price a prospective sale
pub async fn quote(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<QuoteResponse>, impl IntoResponse> {
    let counter = state.counter();
    let total = match counter.price(params.quantity) {
        Ok(total) => total,
        Err(e) => {
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse::new(e)),
            ));
        }
    };
    if params.tendered.is_some_and(|tendered| tendered < 0) {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::new("tendered must not be negative")),
        ));
    }

    Ok(Json(QuoteResponse {
        unit_price: counter.unit_price(),
        quantity: params.quantity,
        total,
        change: params
            .tendered
            .and_then(|tendered| counter.change_due(params.quantity, tendered)),
    }))
}
