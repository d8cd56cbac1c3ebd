//! Reconciliation engine: staging, classification, and atomic confirmation
//! of bank transactions against invoices and expenses.

use crate::models::{
    BANK_TRANSACTIONS, BankTransaction, EXPENSES, Expense, ExpenseStatus, INVOICES, Invoice,
    InvoiceStatus, MatchKind, TransactionDraft, TransactionStatus,
};
use crate::services::matching;
use crate::services::metrics;
use chrono::NaiveDate;
use engine_core::audit::{AuditEvent, AuditSink};
use engine_core::config::MatchingConfig;
use engine_core::error::AppError;
use engine_core::ledger::{LedgerKey, LedgerStore, LedgerWrite, VersionedDocument};
use engine_core::retry::{retry_transaction, RetryConfig};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Stateless engine over the ledger store; safe for concurrent invocation.
#[derive(Clone)]
pub struct ReconciliationEngine {
    ledger: Arc<dyn LedgerStore>,
    audit: Arc<dyn AuditSink>,
    config: MatchingConfig,
    retry: RetryConfig,
}

impl ReconciliationEngine {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        audit: Arc<dyn AuditSink>,
        config: MatchingConfig,
        retry: RetryConfig,
    ) -> Self {
        Self {
            ledger,
            audit,
            config,
            retry,
        }
    }

    /// Stage a batch of imported statement lines for classification.
    /// Lines enter the working set as `Pending` in import order.
    #[instrument(skip(self, drafts), fields(tenant_id = %tenant_id, count = drafts.len()))]
    pub async fn stage_transactions(
        &self,
        tenant_id: Uuid,
        drafts: Vec<TransactionDraft>,
    ) -> Result<Vec<BankTransaction>, AppError> {
        let timer = metrics::LEDGER_TXN_DURATION
            .with_label_values(&["stage_transactions"])
            .start_timer();

        let mut staged = Vec::with_capacity(drafts.len());
        let mut writes = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let tx = BankTransaction::new(
                tenant_id,
                draft.transaction_date,
                draft.description,
                draft.amount,
            );
            let key = LedgerKey::new(BANK_TRANSACTIONS, tx.transaction_id);
            writes.push(LedgerWrite::insert(key, &tx)?);
            staged.push(tx);
        }
        self.ledger.commit(tenant_id, writes).await?;

        timer.observe_duration();
        info!(count = staged.len(), "bank transactions staged");
        Ok(staged)
    }

    /// Record a receivable for the tenant.
    #[instrument(skip(self, client_name), fields(tenant_id = %tenant_id))]
    pub async fn record_invoice(
        &self,
        tenant_id: Uuid,
        client_name: String,
        total: Decimal,
        issue_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Result<Invoice, AppError> {
        let invoice = Invoice::new(tenant_id, client_name, total, issue_date, due_date)?;
        let key = LedgerKey::new(INVOICES, invoice.invoice_id);
        self.ledger
            .commit(tenant_id, vec![LedgerWrite::insert(key, &invoice)?])
            .await?;
        info!(invoice_id = %invoice.invoice_id, total = %invoice.total, "invoice recorded");
        Ok(invoice)
    }

    /// Record a payable for the tenant.
    #[instrument(skip(self, supplier_name, description), fields(tenant_id = %tenant_id))]
    pub async fn record_expense(
        &self,
        tenant_id: Uuid,
        supplier_name: Option<String>,
        description: String,
        total_value: Decimal,
        due_date: NaiveDate,
    ) -> Result<Expense, AppError> {
        let expense = Expense::new(tenant_id, supplier_name, description, total_value, due_date)?;
        let key = LedgerKey::new(EXPENSES, expense.expense_id);
        self.ledger
            .commit(tenant_id, vec![LedgerWrite::insert(key, &expense)?])
            .await?;
        info!(expense_id = %expense.expense_id, total = %expense.total_value, "expense recorded");
        Ok(expense)
    }

    /// Run the matcher over every non-matched transaction in the working set
    /// and persist the results. Transactions already `Matched` keep their
    /// match; everything else is re-evaluated against the current candidates.
    /// Runs as one optimistic ledger transaction per attempt, so a concurrent
    /// confirmation forces a clean re-read instead of a stale overwrite.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn classify(&self, tenant_id: Uuid) -> Result<Vec<BankTransaction>, AppError> {
        let result = retry_transaction(&self.retry, "classify_transactions", || async move {
            self.try_classify(tenant_id).await
        })
        .await;

        match &result {
            Ok(transactions) => {
                let matched = transactions.iter().filter(|t| t.is_matched()).count();
                metrics::record_operation("classify", "ok");
                info!(
                    total = transactions.len(),
                    matched, "classification completed"
                );
            }
            Err(err) => metrics::record_error(err.kind()),
        }

        result
    }

    async fn try_classify(&self, tenant_id: Uuid) -> Result<Vec<BankTransaction>, AppError> {
        let timer = metrics::LEDGER_TXN_DURATION
            .with_label_values(&["classify"])
            .start_timer();

        let tx_docs = self.ledger.list(tenant_id, BANK_TRANSACTIONS).await?;
        let transactions = decode_all::<BankTransaction>(&tx_docs)?;
        let invoices = self.open_invoices(tenant_id).await?;
        let expenses = self.open_expenses(tenant_id).await?;

        let classified = matching::classify_all(&transactions, &invoices, &expenses, &self.config);

        let mut writes = Vec::new();
        for (doc, (before, after)) in tx_docs.iter().zip(transactions.iter().zip(&classified)) {
            if before != after {
                writes.push(LedgerWrite::update(doc.key, doc.version, after)?);
                if after.is_matched() {
                    if let Some(kind) = after.match_kind {
                        metrics::record_match(kind.as_str());
                    }
                }
            }
        }
        if !writes.is_empty() {
            self.ledger.commit(tenant_id, writes).await?;
        }

        timer.observe_duration();
        Ok(classified)
    }

    /// Confirm a matched transaction: transition the matched financial record
    /// to paid and remove the transaction from the working set, atomically.
    /// The ledger transaction re-validates both sides, so a record settled
    /// out of band or a concurrent confirmation fails with `InvalidState`
    /// rather than paying twice.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, transaction_id = %transaction_id))]
    pub async fn confirm(
        &self,
        tenant_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<(), AppError> {
        let result = retry_transaction(&self.retry, "confirm_match", || async move {
            self.try_confirm(tenant_id, transaction_id).await
        })
        .await;

        match &result {
            Ok((match_id, match_kind)) => {
                metrics::record_operation("confirm", "ok");
                info!(
                    match_id = %match_id,
                    match_kind = match_kind.as_str(),
                    "match confirmed"
                );
                let event = AuditEvent::MatchConfirmed {
                    tenant_id,
                    transaction_id,
                    match_id: *match_id,
                    match_kind: match_kind.as_str().to_string(),
                };
                if let Err(err) = self.audit.emit(event).await {
                    // The confirmation is committed; delivery is retried downstream.
                    warn!(error = %err, "failed to emit MatchConfirmed audit event");
                }
            }
            Err(err) => metrics::record_error(err.kind()),
        }

        result.map(|_| ())
    }

    async fn try_confirm(
        &self,
        tenant_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<(Uuid, MatchKind), AppError> {
        let timer = metrics::LEDGER_TXN_DURATION
            .with_label_values(&["confirm"])
            .start_timer();

        let tx_key = LedgerKey::new(BANK_TRANSACTIONS, transaction_id);
        let tx_doc = self.ledger.get(tenant_id, &tx_key).await?.ok_or_else(|| {
            AppError::NotFound(format!("bank transaction {} not found", transaction_id))
        })?;
        let tx: BankTransaction = tx_doc.decode()?;

        if tx.status != TransactionStatus::Matched {
            return Err(AppError::InvalidState(format!(
                "transaction {} is {}, only matched transactions can be confirmed",
                transaction_id,
                tx.status.as_str()
            )));
        }
        let (match_id, match_kind) = match (tx.match_id, tx.match_kind) {
            (Some(id), Some(kind)) => (id, kind),
            _ => {
                return Err(AppError::InvalidState(format!(
                    "transaction {} is matched but carries no match reference",
                    transaction_id
                )))
            }
        };

        let record_write = match match_kind {
            MatchKind::Invoice => {
                let key = LedgerKey::new(INVOICES, match_id);
                let doc = self.ledger.get(tenant_id, &key).await?.ok_or_else(|| {
                    AppError::NotFound(format!("invoice {} not found", match_id))
                })?;
                let invoice: Invoice = doc.decode()?;
                if invoice.status == InvoiceStatus::Paid {
                    return Err(AppError::InvalidState(format!(
                        "invoice {} is already paid",
                        match_id
                    )));
                }
                LedgerWrite::update(key, doc.version, &invoice.paid())?
            }
            MatchKind::Expense => {
                let key = LedgerKey::new(EXPENSES, match_id);
                let doc = self.ledger.get(tenant_id, &key).await?.ok_or_else(|| {
                    AppError::NotFound(format!("expense {} not found", match_id))
                })?;
                let expense: Expense = doc.decode()?;
                if expense.status == ExpenseStatus::Paid {
                    return Err(AppError::InvalidState(format!(
                        "expense {} is already paid",
                        match_id
                    )));
                }
                LedgerWrite::update(key, doc.version, &expense.settled())?
            }
        };

        self.ledger
            .commit(
                tenant_id,
                vec![
                    LedgerWrite::delete(tx_key, tx_doc.version),
                    record_write,
                ],
            )
            .await?;

        timer.observe_duration();
        Ok((match_id, match_kind))
    }

    /// Current working set in staging order.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn pending_transactions(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<BankTransaction>, AppError> {
        let docs = self.ledger.list(tenant_id, BANK_TRANSACTIONS).await?;
        decode_all(&docs)
    }

    /// Invoices still awaiting payment, in stored order.
    pub async fn open_invoices(&self, tenant_id: Uuid) -> Result<Vec<Invoice>, AppError> {
        let docs = self.ledger.list(tenant_id, INVOICES).await?;
        let invoices: Vec<Invoice> = decode_all(&docs)?;
        Ok(invoices
            .into_iter()
            .filter(|i| i.status != InvoiceStatus::Paid)
            .collect())
    }

    /// Expenses still carrying an outstanding balance, in stored order.
    pub async fn open_expenses(&self, tenant_id: Uuid) -> Result<Vec<Expense>, AppError> {
        let docs = self.ledger.list(tenant_id, EXPENSES).await?;
        let expenses: Vec<Expense> = decode_all(&docs)?;
        Ok(expenses
            .into_iter()
            .filter(|e| e.status != ExpenseStatus::Paid)
            .collect())
    }

    pub async fn get_invoice(&self, tenant_id: Uuid, invoice_id: Uuid) -> Result<Invoice, AppError> {
        let key = LedgerKey::new(INVOICES, invoice_id);
        self.ledger
            .get(tenant_id, &key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("invoice {} not found", invoice_id)))?
            .decode()
    }

    pub async fn get_expense(&self, tenant_id: Uuid, expense_id: Uuid) -> Result<Expense, AppError> {
        let key = LedgerKey::new(EXPENSES, expense_id);
        self.ledger
            .get(tenant_id, &key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("expense {} not found", expense_id)))?
            .decode()
    }
}

fn decode_all<T: serde::de::DeserializeOwned>(
    docs: &[VersionedDocument],
) -> Result<Vec<T>, AppError> {
    docs.iter().map(|doc| doc.decode()).collect()
}
