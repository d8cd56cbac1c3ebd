//! Domain models for reconciliation-engine.

use chrono::NaiveDate;
use engine_core::error::AppError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger collection holding the pending working set of a statement cycle.
pub const BANK_TRANSACTIONS: &str = "bank_transactions";
/// Ledger collection of receivable records.
pub const INVOICES: &str = "invoices";
/// Ledger collection of payable records.
pub const EXPENSES: &str = "expenses";

// ============================================================================
// Bank Transaction Models
// ============================================================================

/// Reconciliation state of an imported bank transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Review,
    Matched,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Review => "review",
            TransactionStatus::Matched => "matched",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "review" => TransactionStatus::Review,
            "matched" => TransactionStatus::Matched,
            _ => TransactionStatus::Pending,
        }
    }
}

/// Which kind of financial record a transaction matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Invoice,
    Expense,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Invoice => "invoice",
            MatchKind::Expense => "expense",
        }
    }
}

/// One statement line awaiting reconciliation. Positive amounts are inflows,
/// negative amounts are outflows. Lives only for the duration of a statement
/// cycle; confirmation removes it and leaves the financial record as the
/// durable trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransaction {
    pub transaction_id: Uuid,
    pub tenant_id: Uuid,
    pub transaction_date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub status: TransactionStatus,
    /// Set iff `status == Matched`.
    pub match_id: Option<Uuid>,
    pub match_kind: Option<MatchKind>,
}

impl BankTransaction {
    pub fn new(
        tenant_id: Uuid,
        transaction_date: NaiveDate,
        description: String,
        amount: Decimal,
    ) -> Self {
        Self {
            transaction_id: Uuid::new_v4(),
            tenant_id,
            transaction_date,
            description,
            amount,
            status: TransactionStatus::Pending,
            match_id: None,
            match_kind: None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.status == TransactionStatus::Matched
    }
}

/// Draft line produced by the statement-import collaborator.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub transaction_date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
}

// ============================================================================
// Receivable Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }
}

/// Receivable record owned by the finance collaborator; the engine reads it
/// for matching and writes exactly one status transition on confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub tenant_id: Uuid,
    pub client_name: String,
    pub total: Decimal,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
}

impl Invoice {
    pub fn new(
        tenant_id: Uuid,
        client_name: String,
        total: Decimal,
        issue_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Result<Self, AppError> {
        if total < Decimal::ZERO {
            return Err(AppError::ValidationError(format!(
                "invoice total must be non-negative, got {}",
                total
            )));
        }
        Ok(Self {
            invoice_id: Uuid::new_v4(),
            tenant_id,
            client_name,
            total,
            issue_date,
            due_date,
            status: InvoiceStatus::Pending,
        })
    }

    /// The post-confirmation record.
    pub fn paid(&self) -> Invoice {
        let mut next = self.clone();
        next.status = InvoiceStatus::Paid;
        next
    }
}

// ============================================================================
// Payable Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    Open,
    Partial,
    Paid,
}

impl ExpenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseStatus::Open => "open",
            ExpenseStatus::Partial => "partial",
            ExpenseStatus::Paid => "paid",
        }
    }
}

/// Payable record owned by the finance collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub expense_id: Uuid,
    pub tenant_id: Uuid,
    pub supplier_name: Option<String>,
    pub description: String,
    pub total_value: Decimal,
    pub amount_paid: Decimal,
    pub remaining_value: Decimal,
    pub due_date: NaiveDate,
    pub status: ExpenseStatus,
    pub is_reconciled: bool,
}

impl Expense {
    pub fn new(
        tenant_id: Uuid,
        supplier_name: Option<String>,
        description: String,
        total_value: Decimal,
        due_date: NaiveDate,
    ) -> Result<Self, AppError> {
        if total_value < Decimal::ZERO {
            return Err(AppError::ValidationError(format!(
                "expense total must be non-negative, got {}",
                total_value
            )));
        }
        Ok(Self {
            expense_id: Uuid::new_v4(),
            tenant_id,
            supplier_name,
            description,
            total_value,
            amount_paid: Decimal::ZERO,
            remaining_value: total_value,
            due_date,
            status: ExpenseStatus::Open,
            is_reconciled: false,
        })
    }

    /// The fully settled post-confirmation record.
    pub fn settled(&self) -> Expense {
        let mut next = self.clone();
        next.status = ExpenseStatus::Paid;
        next.amount_paid = next.total_value;
        next.remaining_value = Decimal::ZERO;
        next.is_reconciled = true;
        next
    }
}
