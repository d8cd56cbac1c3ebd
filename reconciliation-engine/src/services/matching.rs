//! Pure classification of bank transactions against candidate records.
//!
//! Side-effect free and deterministic over the snapshot passed in: the first
//! satisfying candidate in stored order wins, and ties are not re-ranked by
//! recency or amount closeness. The text rules are deliberately coarse
//! (statement descriptions are free-form); anything ambiguous lands in
//! Review for human resolution rather than being auto-matched.

use crate::models::{BankTransaction, Expense, Invoice, MatchKind, TransactionStatus};
use engine_core::config::MatchingConfig;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Classification result for one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    pub status: TransactionStatus,
    pub match_id: Option<Uuid>,
    pub match_kind: Option<MatchKind>,
}

impl MatchOutcome {
    fn review() -> Self {
        Self {
            status: TransactionStatus::Review,
            match_id: None,
            match_kind: None,
        }
    }

    fn matched(id: Uuid, kind: MatchKind) -> Self {
        Self {
            status: TransactionStatus::Matched,
            match_id: Some(id),
            match_kind: Some(kind),
        }
    }
}

/// Classify a single transaction. A transaction already in `Matched` state is
/// passed through untouched; classification never overwrites a prior match.
pub fn classify(
    tx: &BankTransaction,
    invoices: &[Invoice],
    expenses: &[Expense],
    config: &MatchingConfig,
) -> MatchOutcome {
    if tx.is_matched() {
        return MatchOutcome {
            status: tx.status,
            match_id: tx.match_id,
            match_kind: tx.match_kind,
        };
    }

    if tx.amount > Decimal::ZERO {
        if let Some(invoice) = invoices.iter().find(|i| invoice_matches(tx, i, config)) {
            return MatchOutcome::matched(invoice.invoice_id, MatchKind::Invoice);
        }
    } else if tx.amount < Decimal::ZERO {
        if let Some(expense) = expenses.iter().find(|e| expense_matches(tx, e, config)) {
            return MatchOutcome::matched(expense.expense_id, MatchKind::Expense);
        }
    }

    MatchOutcome::review()
}

/// Classify a whole working set, returning updated copies.
pub fn classify_all(
    transactions: &[BankTransaction],
    invoices: &[Invoice],
    expenses: &[Expense],
    config: &MatchingConfig,
) -> Vec<BankTransaction> {
    transactions
        .iter()
        .map(|tx| {
            let outcome = classify(tx, invoices, expenses, config);
            let mut next = tx.clone();
            next.status = outcome.status;
            next.match_id = outcome.match_id;
            next.match_kind = outcome.match_kind;
            next
        })
        .collect()
}

fn invoice_matches(tx: &BankTransaction, invoice: &Invoice, config: &MatchingConfig) -> bool {
    if !within_tolerance(invoice.total, tx.amount, config.amount_tolerance) {
        return false;
    }
    invoice.due_date == tx.transaction_date
        || invoice.issue_date == tx.transaction_date
        || contains_normalized(&tx.description, &config.client_marker)
}

fn expense_matches(tx: &BankTransaction, expense: &Expense, config: &MatchingConfig) -> bool {
    let abs_amount = tx.amount.abs();
    let amount_ok = within_tolerance(expense.total_value, abs_amount, config.amount_tolerance)
        || within_tolerance(expense.remaining_value, abs_amount, config.amount_tolerance);
    if !amount_ok {
        return false;
    }
    expense.due_date == tx.transaction_date
        || contains_normalized(&tx.description, &expense.description)
        || (expense.supplier_name.is_some()
            && contains_normalized(&tx.description, &config.supplier_marker))
}

fn within_tolerance(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() < tolerance
}

fn contains_normalized(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    if needle.is_empty() {
        return false;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
