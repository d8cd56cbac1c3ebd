//! Shared harness for cross-engine workflow tests.
//!
//! Both engines run over one in-memory ledger and one audit sink, the way a
//! deployment shares its document store, so the tests observe the combined
//! audit stream and tenant partitioning across subsystems.

use approval_engine::services::ApprovalEngine;
use engine_core::audit::MemoryAuditSink;
use engine_core::config::{ApprovalConfig, MatchingConfig};
use engine_core::ledger::memory::MemoryLedger;
use engine_core::retry::RetryConfig;
use reconciliation_engine::services::ReconciliationEngine;
use std::sync::{Arc, Once};
use uuid::Uuid;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,approval_engine=debug,reconciliation_engine=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Both engines over one shared ledger and audit sink.
pub struct TestHarness {
    pub approvals: ApprovalEngine,
    pub reconciliation: ReconciliationEngine,
    pub ledger: Arc<MemoryLedger>,
    pub audit: Arc<MemoryAuditSink>,
    pub tenant_id: Uuid,
}

impl TestHarness {
    pub fn new() -> Self {
        init_tracing();

        let ledger = Arc::new(MemoryLedger::default());
        let audit = Arc::new(MemoryAuditSink::default());
        let approvals = ApprovalEngine::new(
            ledger.clone(),
            audit.clone(),
            ApprovalConfig::default(),
            RetryConfig::quick(),
        );
        let reconciliation = ReconciliationEngine::new(
            ledger.clone(),
            audit.clone(),
            MatchingConfig::default(),
            RetryConfig::quick(),
        );

        Self {
            approvals,
            reconciliation,
            ledger,
            audit,
            tenant_id: Uuid::new_v4(),
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
