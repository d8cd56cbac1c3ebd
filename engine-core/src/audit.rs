//! Structured audit events emitted after committed transitions.
//!
//! Delivery is fire-and-forget, at-least-once downstream: emission failure is
//! logged by the caller and never rolls back the committed ledger write.

use crate::error::AppError;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    ApprovalDecided {
        tenant_id: Uuid,
        request_id: Uuid,
        actor: String,
        decision: String,
        new_status: String,
    },
    MatchConfirmed {
        tenant_id: Uuid,
        transaction_id: Uuid,
        match_id: Uuid,
        match_kind: String,
    },
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn emit(&self, event: AuditEvent) -> Result<(), AppError>;
}

/// Sink that writes events to the structured log stream.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn emit(&self, event: AuditEvent) -> Result<(), AppError> {
        let payload = serde_json::to_string(&event)?;
        info!(audit = %payload, "audit event");
        Ok(())
    }
}

/// Captures events for assertions in tests.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn emit(&self, event: AuditEvent) -> Result<(), AppError> {
        self.events
            .lock()
            .map_err(|_| AppError::StorageError(anyhow::anyhow!("audit lock poisoned")))?
            .push(event);
        Ok(())
    }
}

impl MemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}
