//! Integration tests for cost-based escalation across approver levels.

mod common;

use approval_engine::models::{ApprovalStatus, ApproverRole, Decision};
use chrono::NaiveDate;
use common::{spawn_app, TestApp};
use engine_core::error::AppError;
use rust_decimal::Decimal;
use uuid::Uuid;

async fn submit(app: &TestApp, cost: Decimal) -> (Uuid, Uuid) {
    let request = app
        .engine
        .submit_request(
            app.tenant_id,
            Uuid::new_v4(),
            cost,
            "compressor rebuild".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
        .await
        .unwrap();
    (request.asset_id, request.request_id)
}

#[tokio::test]
async fn cost_at_threshold_approved_by_manager_alone() {
    let app = spawn_app();
    // Boundary is exclusive: exactly 5000.00 does not escalate.
    let (asset_id, request_id) = submit(&app, Decimal::new(500000, 2)).await;

    let outcome = app
        .engine
        .decide(
            app.tenant_id,
            asset_id,
            request_id,
            ApproverRole::Manager,
            Decision::Approve,
            None,
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, ApprovalStatus::Approved);
    assert_eq!(outcome.next_approver, None);
}

#[tokio::test]
async fn cost_one_cent_above_threshold_escalates() {
    let app = spawn_app();
    let (asset_id, request_id) = submit(&app, Decimal::new(500001, 2)).await;

    let outcome = app
        .engine
        .decide(
            app.tenant_id,
            asset_id,
            request_id,
            ApproverRole::Manager,
            Decision::Approve,
            None,
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, ApprovalStatus::Pending);
    assert_eq!(outcome.next_approver, Some(ApproverRole::Director));
}

#[tokio::test]
async fn escalated_request_completes_with_director_approval() {
    let app = spawn_app();
    let (asset_id, request_id) = submit(&app, Decimal::new(6000, 0)).await;

    let first = app
        .engine
        .decide(
            app.tenant_id,
            asset_id,
            request_id,
            ApproverRole::Manager,
            Decision::Approve,
            None,
        )
        .await
        .unwrap();
    assert_eq!(first.status, ApprovalStatus::Pending);
    assert_eq!(first.next_approver, Some(ApproverRole::Director));

    let second = app
        .engine
        .decide(
            app.tenant_id,
            asset_id,
            request_id,
            ApproverRole::Director,
            Decision::Approve,
            Some("capex approved".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(second.status, ApprovalStatus::Approved);
    assert_eq!(second.next_approver, None);

    let stored = app
        .engine
        .get_request(app.tenant_id, request_id)
        .await
        .unwrap();
    assert_eq!(stored.approval_history.len(), 2);
    assert_eq!(stored.approval_history[0].actor, ApproverRole::Manager);
    assert_eq!(stored.approval_history[1].actor, ApproverRole::Director);
}

#[tokio::test]
async fn manager_cannot_act_again_after_escalating() {
    let app = spawn_app();
    let (asset_id, request_id) = submit(&app, Decimal::new(6000, 0)).await;

    app.engine
        .decide(
            app.tenant_id,
            asset_id,
            request_id,
            ApproverRole::Manager,
            Decision::Approve,
            None,
        )
        .await
        .unwrap();

    let retry = app
        .engine
        .decide(
            app.tenant_id,
            asset_id,
            request_id,
            ApproverRole::Manager,
            Decision::Approve,
            None,
        )
        .await;
    assert!(matches!(retry, Err(AppError::PermissionDenied(_))));
}

#[tokio::test]
async fn director_can_reject_escalated_request() {
    let app = spawn_app();
    let (asset_id, request_id) = submit(&app, Decimal::new(12500, 0)).await;

    app.engine
        .decide(
            app.tenant_id,
            asset_id,
            request_id,
            ApproverRole::Manager,
            Decision::Approve,
            None,
        )
        .await
        .unwrap();

    let outcome = app
        .engine
        .decide(
            app.tenant_id,
            asset_id,
            request_id,
            ApproverRole::Director,
            Decision::Reject,
            Some("defer to next quarter".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, ApprovalStatus::Rejected);
    assert_eq!(outcome.next_approver, None);

    let stored = app
        .engine
        .get_request(app.tenant_id, request_id)
        .await
        .unwrap();
    // The manager's approval stays on record even though the request was
    // ultimately rejected.
    assert_eq!(stored.approval_history.len(), 2);
}
