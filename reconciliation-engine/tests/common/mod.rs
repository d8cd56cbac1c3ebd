//! Common test utilities for reconciliation-engine integration tests.

use engine_core::audit::MemoryAuditSink;
use engine_core::config::MatchingConfig;
use engine_core::ledger::memory::MemoryLedger;
use engine_core::retry::RetryConfig;
use reconciliation_engine::services::ReconciliationEngine;
use std::sync::{Arc, Once};
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,reconciliation_engine=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Test application wrapper.
#[allow(dead_code)]
pub struct TestApp {
    pub engine: ReconciliationEngine,
    pub ledger: Arc<MemoryLedger>,
    pub audit: Arc<MemoryAuditSink>,
    pub tenant_id: Uuid,
}

/// Build an engine over a fresh in-memory ledger with a unique tenant ID.
pub fn spawn_app() -> TestApp {
    init_tracing();

    let ledger = Arc::new(MemoryLedger::default());
    let audit = Arc::new(MemoryAuditSink::default());
    let engine = ReconciliationEngine::new(
        ledger.clone(),
        audit.clone(),
        MatchingConfig::default(),
        RetryConfig::quick(),
    );

    TestApp {
        engine,
        ledger,
        audit,
        tenant_id: Uuid::new_v4(),
    }
}
