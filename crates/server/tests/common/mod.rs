//! Common test utilities for in-process API testing.
//!
//! The fixture builds the full router around a `MockDoorStore`, so tests can
//! inject store failures and inspect what was written.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use puerta_core::testing::MockDoorStore;
use puerta_core::{Config, DoorStore, LedgerMode, Preorder};
use puerta_server::state::AppState;

/// Re-export fixtures for test convenience
pub use puerta_core::testing::fixtures;

/// Test fixture for API testing against a mock store.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_check_in() {
///     let fixture = TestFixture::with_preorders(vec![fixtures::preorder(1, "Ana", 3, None)]).await;
///
///     let response = fixture
///         .put("/api/v1/preorders/1/check-in", json!({ "checked_in_count": 2 }))
///         .await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock store - inject failures and inspect writes
    pub store: Arc<MockDoorStore>,
    /// Shared state behind the router
    pub state: Arc<AppState>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture with an empty store.
    pub async fn new() -> Self {
        Self::build(Vec::new(), LedgerMode::Sequential).await
    }

    /// Create a fixture whose store already holds `preorders`.
    pub async fn with_preorders(preorders: Vec<Preorder>) -> Self {
        Self::build(preorders, LedgerMode::Sequential).await
    }

    /// Create a fixture using transactional ledger writes.
    pub async fn transactional(preorders: Vec<Preorder>) -> Self {
        Self::build(preorders, LedgerMode::Transactional).await
    }

    async fn build(preorders: Vec<Preorder>, mode: LedgerMode) -> Self {
        let store = Arc::new(MockDoorStore::with_preorders(preorders));

        let mut config = Config::default();
        config.ledger.mode = mode;

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&store) as Arc<dyn DoorStore>,
        ));
        state.load().await.expect("Failed to load state");

        let router = puerta_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            store,
            state,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a GET request and return the raw text body.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).to_string())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
