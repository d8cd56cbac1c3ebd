//! End-to-end reconciliation cycle: record, stage, classify, confirm.

use chrono::NaiveDate;
use engine_core::audit::AuditEvent;
use reconciliation_engine::models::{
    ExpenseStatus, InvoiceStatus, TransactionDraft, TransactionStatus,
};
use rust_decimal::Decimal;
use workflow_tests::TestHarness;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

#[tokio::test]
async fn full_statement_cycle_settles_both_sides() {
    let harness = TestHarness::new();
    let tenant = harness.tenant_id;

    let invoice = harness
        .reconciliation
        .record_invoice(
            tenant,
            "Acme Ltda".to_string(),
            Decimal::new(150000, 2),
            date(1),
            date(10),
        )
        .await
        .unwrap();
    let expense = harness
        .reconciliation
        .record_expense(
            tenant,
            Some("Parafusos SA".to_string()),
            "Pecas de reposicao".to_string(),
            Decimal::new(125000, 2),
            date(1),
        )
        .await
        .unwrap();

    harness
        .reconciliation
        .stage_transactions(
            tenant,
            vec![
                TransactionDraft {
                    transaction_date: date(10),
                    description: "TED RECEBIDA".to_string(),
                    amount: Decimal::new(150000, 2),
                },
                TransactionDraft {
                    transaction_date: date(1),
                    description: "PGTO FORNECEDOR DIV".to_string(),
                    amount: Decimal::new(-125000, 2),
                },
                TransactionDraft {
                    transaction_date: date(3),
                    description: "TARIFA BANCARIA".to_string(),
                    amount: Decimal::new(-999, 2),
                },
            ],
        )
        .await
        .unwrap();

    let classified = harness.reconciliation.classify(tenant).await.unwrap();
    assert_eq!(classified[0].status, TransactionStatus::Matched);
    assert_eq!(classified[1].status, TransactionStatus::Matched);
    assert_eq!(classified[2].status, TransactionStatus::Review);

    harness
        .reconciliation
        .confirm(tenant, classified[0].transaction_id)
        .await
        .unwrap();
    harness
        .reconciliation
        .confirm(tenant, classified[1].transaction_id)
        .await
        .unwrap();

    let paid_invoice = harness
        .reconciliation
        .get_invoice(tenant, invoice.invoice_id)
        .await
        .unwrap();
    assert_eq!(paid_invoice.status, InvoiceStatus::Paid);

    let settled_expense = harness
        .reconciliation
        .get_expense(tenant, expense.expense_id)
        .await
        .unwrap();
    assert_eq!(settled_expense.status, ExpenseStatus::Paid);
    assert!(settled_expense.is_reconciled);

    // Only the review line is left in the working set.
    let remaining = harness
        .reconciliation
        .pending_transactions(tenant)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].status, TransactionStatus::Review);

    let confirmations = harness
        .audit
        .events()
        .iter()
        .filter(|event| matches!(event, AuditEvent::MatchConfirmed { .. }))
        .count();
    assert_eq!(confirmations, 2);
}

#[tokio::test]
async fn settled_records_are_not_candidates_in_the_next_cycle() {
    let harness = TestHarness::new();
    let tenant = harness.tenant_id;

    harness
        .reconciliation
        .record_invoice(
            tenant,
            "Acme Ltda".to_string(),
            Decimal::new(150000, 2),
            date(1),
            date(10),
        )
        .await
        .unwrap();
    harness
        .reconciliation
        .stage_transactions(
            tenant,
            vec![TransactionDraft {
                transaction_date: date(10),
                description: "TED RECEBIDA".to_string(),
                amount: Decimal::new(150000, 2),
            }],
        )
        .await
        .unwrap();
    let classified = harness.reconciliation.classify(tenant).await.unwrap();
    harness
        .reconciliation
        .confirm(tenant, classified[0].transaction_id)
        .await
        .unwrap();

    // Next statement carries an identical inflow; the paid invoice must not
    // match again.
    harness
        .reconciliation
        .stage_transactions(
            tenant,
            vec![TransactionDraft {
                transaction_date: date(10),
                description: "TED RECEBIDA".to_string(),
                amount: Decimal::new(150000, 2),
            }],
        )
        .await
        .unwrap();
    let next_cycle = harness.reconciliation.classify(tenant).await.unwrap();

    assert_eq!(next_cycle.len(), 1);
    assert_eq!(next_cycle[0].status, TransactionStatus::Review);
}
