//! Prometheus metrics for the check-in and door-sale workflows.

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts};

// =============================================================================
// Check-in
// =============================================================================

/// Check-in updates by result.
pub static CHECK_IN_UPDATES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("puerta_check_in_updates_total", "Total check-in updates"),
        &["result"], // "ok", "rejected", "store_error", "ledger_diverged"
    )
    .unwrap()
});

// =============================================================================
// Door sales
// =============================================================================

/// Door sales by result.
pub static DOOR_SALES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("puerta_door_sales_total", "Total door sale attempts"),
        &["result"], // "ok", "rejected", "store_error", "ledger_diverged"
    )
    .unwrap()
});

// =============================================================================
// Ledger
// =============================================================================

/// Admissions written to the attendance ledger.
pub static ADMISSIONS_RECORDED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "puerta_admissions_recorded_total",
        "Admissions written to the attendance ledger",
    )
    .unwrap()
});

/// State writes whose ledger entry failed, by flow.
pub static LEDGER_DIVERGENCES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "puerta_ledger_divergences_total",
            "State writes committed without their ledger entry",
        ),
        &["flow"], // "check_in", "door_sale"
    )
    .unwrap()
});

/// Compensating entries written by ledger repair.
pub static LEDGER_REPAIRS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "puerta_ledger_repairs_total",
        "Compensating ledger entries written by repair",
    )
    .unwrap()
});

/// All core metrics, for registration in the server registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CHECK_IN_UPDATES.clone()),
        Box::new(DOOR_SALES.clone()),
        Box::new(ADMISSIONS_RECORDED.clone()),
        Box::new(LEDGER_DIVERGENCES.clone()),
        Box::new(LEDGER_REPAIRS.clone()),
    ]
}
