pub mod door_sales;
pub mod handlers;
pub mod ledger;
pub mod middleware;
pub mod preorders;
pub mod routes;

pub use routes::create_router;

use serde::Serialize;

/// Error body shared by all API handlers.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}
