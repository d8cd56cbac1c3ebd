//! Prometheus metrics for approval-engine.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

/// Counter for applied approval decisions by decision and resulting status.
pub static APPROVAL_DECISIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "approval_decisions_total",
        "Total number of applied approval decisions",
        &["decision", "outcome"]
    )
    .expect("Failed to register APPROVAL_DECISIONS")
});

/// Counter for rejected engine calls by error kind.
pub static APPROVAL_ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "approval_errors_total",
        "Total number of failed approval operations",
        &["error_type"]
    )
    .expect("Failed to register APPROVAL_ERRORS")
});

/// Histogram for ledger transaction duration by operation.
pub static LEDGER_TXN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "approval_ledger_txn_duration_seconds",
        "Ledger transaction duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to register LEDGER_TXN_DURATION")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&APPROVAL_DECISIONS);
    Lazy::force(&APPROVAL_ERRORS);
    Lazy::force(&LEDGER_TXN_DURATION);
}

/// Record an applied decision.
pub fn record_decision(decision: &str, outcome: &str) {
    APPROVAL_DECISIONS
        .with_label_values(&[decision, outcome])
        .inc();
}

/// Record a failed operation.
pub fn record_error(error_type: &str) {
    APPROVAL_ERRORS.with_label_values(&[error_type]).inc();
}
