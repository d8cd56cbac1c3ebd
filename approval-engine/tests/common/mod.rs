//! Common test utilities for approval-engine integration tests.

use approval_engine::services::ApprovalEngine;
use engine_core::audit::MemoryAuditSink;
use engine_core::config::ApprovalConfig;
use engine_core::ledger::memory::MemoryLedger;
use engine_core::retry::RetryConfig;
use std::sync::{Arc, Once};
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,approval_engine=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Test application wrapper.
#[allow(dead_code)]
pub struct TestApp {
    pub engine: ApprovalEngine,
    pub ledger: Arc<MemoryLedger>,
    pub audit: Arc<MemoryAuditSink>,
    pub tenant_id: Uuid,
}

/// Build an engine over a fresh in-memory ledger with a unique tenant ID.
pub fn spawn_app() -> TestApp {
    init_tracing();

    let ledger = Arc::new(MemoryLedger::default());
    let audit = Arc::new(MemoryAuditSink::default());
    let engine = ApprovalEngine::new(
        ledger.clone(),
        audit.clone(),
        ApprovalConfig::default(),
        RetryConfig::quick(),
    );

    TestApp {
        engine,
        ledger,
        audit,
        tenant_id: Uuid::new_v4(),
    }
}
