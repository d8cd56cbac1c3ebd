//! Prometheus metrics for reconciliation-engine.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

/// Counter for classification runs by outcome.
pub static RECONCILIATION_OPERATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "reconciliation_operations_total",
        "Total number of reconciliation operations",
        &["operation", "status"]
    )
    .expect("Failed to register RECONCILIATION_OPERATIONS")
});

/// Counter for matched transactions by record kind.
pub static TRANSACTION_MATCHES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "reconciliation_transaction_matches_total",
        "Total number of transactions matched to a financial record",
        &["match_kind"]
    )
    .expect("Failed to register TRANSACTION_MATCHES")
});

/// Counter for failed engine calls by error kind.
pub static RECONCILIATION_ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "reconciliation_errors_total",
        "Total number of failed reconciliation operations",
        &["error_type"]
    )
    .expect("Failed to register RECONCILIATION_ERRORS")
});

/// Histogram for ledger transaction duration by operation.
pub static LEDGER_TXN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "reconciliation_ledger_txn_duration_seconds",
        "Ledger transaction duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to register LEDGER_TXN_DURATION")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&RECONCILIATION_OPERATIONS);
    Lazy::force(&TRANSACTION_MATCHES);
    Lazy::force(&RECONCILIATION_ERRORS);
    Lazy::force(&LEDGER_TXN_DURATION);
}

/// Record a completed operation.
pub fn record_operation(operation: &str, status: &str) {
    RECONCILIATION_OPERATIONS
        .with_label_values(&[operation, status])
        .inc();
}

/// Record a transaction matched to a record.
pub fn record_match(match_kind: &str) {
    TRANSACTION_MATCHES.with_label_values(&[match_kind]).inc();
}

/// Record a failed operation.
pub fn record_error(error_type: &str) {
    RECONCILIATION_ERRORS.with_label_values(&[error_type]).inc();
}
