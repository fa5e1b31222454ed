use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::metrics_middleware;
use super::{door_sales, handlers, ledger, preorders};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Preorder check-in
        .route("/preorders", get(preorders::list_preorders))
        .route("/preorders", post(preorders::create_preorder))
        .route("/preorders/reload", post(preorders::reload_preorders))
        .route("/preorders/{id}/check-in", put(preorders::update_check_in))
        // Door sales
        .route("/door-sales", get(door_sales::list_door_sales))
        .route("/door-sales", post(door_sales::create_door_sale))
        .route("/door-sales/reload", post(door_sales::reload_door_sales))
        .route("/door-sales/quote", get(door_sales::quote))
        // Attendance ledger
        .route("/ledger/reconciliation", get(ledger::get_reconciliation))
        .route("/ledger/repair", post(ledger::repair));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
