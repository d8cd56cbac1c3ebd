//! Domain models for approval-engine.

use chrono::{DateTime, NaiveDate, Utc};
use engine_core::error::AppError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger collection holding maintenance requests.
pub const MAINTENANCE_REQUESTS: &str = "maintenance_requests";

/// Approval status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "approved" => ApprovalStatus::Approved,
            "rejected" => ApprovalStatus::Rejected,
            _ => ApprovalStatus::Pending,
        }
    }
}

/// Organizational role that may act on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApproverRole {
    Manager,
    Director,
}

impl ApproverRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApproverRole::Manager => "manager",
            ApproverRole::Director => "director",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "director" => ApproverRole::Director,
            _ => ApproverRole::Manager,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }
}

/// One row of the append-only approval history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalEntry {
    pub actor: ApproverRole,
    pub decision: Decision,
    pub comment: Option<String>,
    pub decided_utc: DateTime<Utc>,
}

/// A maintenance cost request moving through the approval workflow.
///
/// Financial/audit record: never deleted. Identity fields are immutable after
/// creation; `status`, `next_approver` and `approval_history` are mutated only
/// through [`MaintenanceRequest::apply_decision`], applied by the engine under
/// one ledger transaction per decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    pub request_id: Uuid,
    pub asset_id: Uuid,
    pub tenant_id: Uuid,
    pub cost: Decimal,
    pub description: String,
    pub requested_date: NaiveDate,
    pub status: ApprovalStatus,
    /// Who must act next; `None` exactly when the status is terminal.
    pub next_approver: Option<ApproverRole>,
    pub approval_history: Vec<ApprovalEntry>,
    pub created_utc: DateTime<Utc>,
}

impl MaintenanceRequest {
    pub fn new(
        tenant_id: Uuid,
        asset_id: Uuid,
        cost: Decimal,
        description: String,
        requested_date: NaiveDate,
    ) -> Result<Self, AppError> {
        if cost < Decimal::ZERO {
            return Err(AppError::ValidationError(format!(
                "cost must be non-negative, got {}",
                cost
            )));
        }
        Ok(Self {
            request_id: Uuid::new_v4(),
            asset_id,
            tenant_id,
            cost,
            description,
            requested_date,
            status: ApprovalStatus::Pending,
            next_approver: Some(ApproverRole::Manager),
            approval_history: Vec::new(),
            created_utc: Utc::now(),
        })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            ApprovalStatus::Approved | ApprovalStatus::Rejected
        )
    }

    /// Pure transition function: returns the post-decision record without
    /// touching `self`, so the state machine is unit-testable without a store.
    ///
    /// A decision is accepted only from the role named by `next_approver`;
    /// terminal records always refuse. Accepted decisions append one history
    /// entry. A Manager approval of a cost strictly above
    /// `escalation_threshold` escalates to the Director instead of
    /// terminating.
    pub fn apply_decision(
        &self,
        actor: ApproverRole,
        decision: Decision,
        comment: Option<String>,
        escalation_threshold: Decimal,
        now: DateTime<Utc>,
    ) -> Result<MaintenanceRequest, AppError> {
        if self.next_approver != Some(actor) {
            let detail = match self.next_approver {
                Some(expected) => format!(
                    "request {} awaits {}, not {}",
                    self.request_id,
                    expected.as_str(),
                    actor.as_str()
                ),
                None => format!(
                    "request {} is already {}",
                    self.request_id,
                    self.status.as_str()
                ),
            };
            return Err(AppError::PermissionDenied(detail));
        }

        let mut next = self.clone();
        next.approval_history.push(ApprovalEntry {
            actor,
            decision,
            comment,
            decided_utc: now,
        });

        match decision {
            Decision::Reject => {
                next.status = ApprovalStatus::Rejected;
                next.next_approver = None;
            }
            Decision::Approve => {
                if actor == ApproverRole::Manager && self.cost > escalation_threshold {
                    // Above the threshold a Manager approval is not final.
                    next.next_approver = Some(ApproverRole::Director);
                } else {
                    next.status = ApprovalStatus::Approved;
                    next.next_approver = None;
                }
            }
        }

        Ok(next)
    }
}
