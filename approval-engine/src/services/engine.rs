//! Approval workflow engine: pure transitions applied through one ledger
//! transaction per decision.

use crate::models::{
    ApprovalStatus, ApproverRole, Decision, MAINTENANCE_REQUESTS, MaintenanceRequest,
};
use crate::services::metrics;
use chrono::{NaiveDate, Utc};
use engine_core::audit::{AuditEvent, AuditSink};
use engine_core::config::ApprovalConfig;
use engine_core::error::AppError;
use engine_core::ledger::{LedgerKey, LedgerStore, LedgerWrite};
use engine_core::retry::{retry_transaction, RetryConfig};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Result of an applied decision, as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionOutcome {
    pub status: ApprovalStatus,
    pub next_approver: Option<ApproverRole>,
}

/// Stateless engine over the ledger store; safe for concurrent invocation.
#[derive(Clone)]
pub struct ApprovalEngine {
    ledger: Arc<dyn LedgerStore>,
    audit: Arc<dyn AuditSink>,
    config: ApprovalConfig,
    retry: RetryConfig,
}

impl ApprovalEngine {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        audit: Arc<dyn AuditSink>,
        config: ApprovalConfig,
        retry: RetryConfig,
    ) -> Self {
        Self {
            ledger,
            audit,
            config,
            retry,
        }
    }

    /// Creation entry point used by the maintenance-entry collaborator.
    /// New requests start pending with the Manager as first approver.
    #[instrument(skip(self, description), fields(tenant_id = %tenant_id, asset_id = %asset_id))]
    pub async fn submit_request(
        &self,
        tenant_id: Uuid,
        asset_id: Uuid,
        cost: Decimal,
        description: String,
        requested_date: NaiveDate,
    ) -> Result<MaintenanceRequest, AppError> {
        let timer = metrics::LEDGER_TXN_DURATION
            .with_label_values(&["submit_request"])
            .start_timer();

        let request =
            MaintenanceRequest::new(tenant_id, asset_id, cost, description, requested_date)?;
        let key = LedgerKey::new(MAINTENANCE_REQUESTS, request.request_id);
        self.ledger
            .commit(tenant_id, vec![LedgerWrite::insert(key, &request)?])
            .await?;

        timer.observe_duration();
        info!(request_id = %request.request_id, cost = %request.cost, "maintenance request submitted");

        Ok(request)
    }

    /// Apply one approval decision. The read-validate-append-write sequence
    /// runs inside a single optimistic ledger transaction; contention is
    /// retried within the configured budget, and a race loser re-reads the
    /// post-transition state and fails the permission check instead of
    /// overwriting it.
    #[instrument(
        skip(self, comment),
        fields(
            tenant_id = %tenant_id,
            request_id = %request_id,
            actor = actor.as_str(),
            decision = decision.as_str()
        )
    )]
    pub async fn decide(
        &self,
        tenant_id: Uuid,
        asset_id: Uuid,
        request_id: Uuid,
        actor: ApproverRole,
        decision: Decision,
        comment: Option<String>,
    ) -> Result<DecisionOutcome, AppError> {
        let result = retry_transaction(&self.retry, "decide_maintenance_approval", || {
            let comment = comment.clone();
            async move {
                self.try_decide(tenant_id, asset_id, request_id, actor, decision, comment)
                    .await
            }
        })
        .await;

        match &result {
            Ok(outcome) => {
                metrics::record_decision(decision.as_str(), outcome.status.as_str());
                info!(
                    new_status = outcome.status.as_str(),
                    next_approver = outcome.next_approver.map(|r| r.as_str()).unwrap_or("none"),
                    "approval decision applied"
                );
                let event = AuditEvent::ApprovalDecided {
                    tenant_id,
                    request_id,
                    actor: actor.as_str().to_string(),
                    decision: decision.as_str().to_string(),
                    new_status: outcome.status.as_str().to_string(),
                };
                if let Err(err) = self.audit.emit(event).await {
                    // The decision is committed; delivery is retried downstream.
                    warn!(error = %err, "failed to emit ApprovalDecided audit event");
                }
            }
            Err(err) => metrics::record_error(err.kind()),
        }

        result
    }

    async fn try_decide(
        &self,
        tenant_id: Uuid,
        asset_id: Uuid,
        request_id: Uuid,
        actor: ApproverRole,
        decision: Decision,
        comment: Option<String>,
    ) -> Result<DecisionOutcome, AppError> {
        let timer = metrics::LEDGER_TXN_DURATION
            .with_label_values(&["decide"])
            .start_timer();

        let key = LedgerKey::new(MAINTENANCE_REQUESTS, request_id);
        let doc = self.ledger.get(tenant_id, &key).await?.ok_or_else(|| {
            AppError::NotFound(format!("maintenance request {} not found", request_id))
        })?;
        let current: MaintenanceRequest = doc.decode()?;
        if current.asset_id != asset_id {
            return Err(AppError::NotFound(format!(
                "maintenance request {} does not belong to asset {}",
                request_id, asset_id
            )));
        }

        let updated = current.apply_decision(
            actor,
            decision,
            comment,
            self.config.escalation_threshold,
            Utc::now(),
        )?;
        let outcome = DecisionOutcome {
            status: updated.status,
            next_approver: updated.next_approver,
        };

        self.ledger
            .commit(
                tenant_id,
                vec![LedgerWrite::update(key, doc.version, &updated)?],
            )
            .await?;

        timer.observe_duration();
        Ok(outcome)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, request_id = %request_id))]
    pub async fn get_request(
        &self,
        tenant_id: Uuid,
        request_id: Uuid,
    ) -> Result<MaintenanceRequest, AppError> {
        let key = LedgerKey::new(MAINTENANCE_REQUESTS, request_id);
        self.ledger
            .get(tenant_id, &key)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("maintenance request {} not found", request_id))
            })?
            .decode()
    }
}
