//! Prometheus metrics for the door panel server.
//!
//! HTTP request metrics live here; workflow counters are defined in
//! `puerta_core::metrics` and registered into the same registry. Board
//! gauges are refreshed from application state right before each scrape.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use tracing::error;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "puerta_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("puerta_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "puerta_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Board Metrics (collected dynamically)
// =============================================================================

/// Preorders on the check-in board by status.
pub static PREORDERS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("puerta_preorders", "Preorders on the check-in board"),
        &["status"], // "pending", "completed"
    )
    .unwrap()
});

/// Door sales held by the sale counter.
pub static DOOR_SALES_LISTED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "puerta_door_sales_listed",
        "Door sales currently held by the sale counter",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Board
    registry
        .register(Box::new(PREORDERS_BY_STATUS.clone()))
        .unwrap();
    registry
        .register(Box::new(DOOR_SALES_LISTED.clone()))
        .unwrap();

    // Core workflow metrics (check-in, door sales, ledger)
    for metric in puerta_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Refresh board gauges from current application state.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let stats = state.board().stats().await;
    PREORDERS_BY_STATUS
        .with_label_values(&["pending"])
        .set(stats.pending as i64);
    PREORDERS_BY_STATUS
        .with_label_values(&["completed"])
        .set(stats.completed as i64);

    DOOR_SALES_LISTED.set(state.counter().rows().await.len() as i64);
}

/// Normalize a path for metric labels (replace numeric ids with placeholders).
pub fn normalize_path(path: &str) -> String {
    let numeric_regex = regex_lite::Regex::new(r"/\d+(/|$)").unwrap();
    numeric_regex.replace_all(path, "/{id}$1").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/api/v1/preorders/42/check-in";
        assert_eq!(normalize_path(path), "/api/v1/preorders/{id}/check-in");
    }

    #[test]
    fn test_normalize_path_trailing_id() {
        assert_eq!(normalize_path("/api/v1/preorders/7"), "/api/v1/preorders/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/door-sales/quote";
        assert_eq!(normalize_path(path), "/api/v1/door-sales/quote");
    }

    #[test]
    fn test_encode_includes_core_metrics() {
        puerta_core::metrics::LEDGER_REPAIRS.inc();
        HTTP_REQUESTS_IN_FLIGHT.set(0);

        let text = encode_metrics();
        assert!(text.contains("puerta_ledger_repairs_total"));
        assert!(text.contains("puerta_http_requests_in_flight"));
    }
}
