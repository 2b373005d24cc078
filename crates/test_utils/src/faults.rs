//! Fault Injection
//!
//! A store wrapper that makes chosen writes fail with a storage error, used
//! to prove that a failure in the middle of an operation leaves no trace.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_kernel::{
    AccountId, DomainPort, HealthCheckResult, HealthCheckable, LoanId, PayeeId, PortError,
    TransactionId,
};
use domain_ledger::{
    Account, BillPayee, LedgerScope, LedgerStore, Loan, Repayment, Transaction, TransactionType,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Which write to break inside every scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The n-th (1-based) transaction insert of a scope fails
    TransactionInsert(usize),
    /// Saving the loan fails
    LoanSave,
    /// Commit fails
    Commit,
}

/// Store wrapper that injects a [`Fault`] into every scope it opens
pub struct FaultyLedgerStore {
    inner: Arc<dyn LedgerStore>,
    fault: Fault,
}

impl FaultyLedgerStore {
    pub fn new(inner: Arc<dyn LedgerStore>, fault: Fault) -> Self {
        Self { inner, fault }
    }
}

impl DomainPort for FaultyLedgerStore {}

#[async_trait]
impl HealthCheckable for FaultyLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        self.inner.health_check().await
    }
}

#[async_trait]
impl LedgerStore for FaultyLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerScope>, PortError> {
        Ok(Box::new(FaultyScope {
            inner: self.inner.begin().await?,
            fault: self.fault,
            inserts: 0,
        }))
    }
}

struct FaultyScope {
    inner: Box<dyn LedgerScope>,
    fault: Fault,
    inserts: usize,
}

fn injected(what: &str) -> PortError {
    PortError::connection(format!("injected failure: {}", what))
}

#[async_trait]
impl LedgerScope for FaultyScope {
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>, PortError> {
        self.inner.lock_account(id).await
    }

    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, PortError> {
        self.inner.find_account(id).await
    }

    async fn find_account_by_number(
        &mut self,
        account_number: &str,
    ) -> Result<Option<Account>, PortError> {
        self.inner.find_account_by_number(account_number).await
    }

    async fn insert_account(&mut self, account: &Account) -> Result<(), PortError> {
        self.inner.insert_account(account).await
    }

    async fn save_account(&mut self, account: &Account) -> Result<(), PortError> {
        self.inner.save_account(account).await
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), PortError> {
        self.inserts += 1;
        if self.fault == Fault::TransactionInsert(self.inserts) {
            return Err(injected("insert_transaction"));
        }
        self.inner.insert_transaction(transaction).await
    }

    async fn find_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, PortError> {
        self.inner.find_transaction(id).await
    }

    async fn find_by_reference(
        &mut self,
        account_id: AccountId,
        reference: &str,
    ) -> Result<Option<Transaction>, PortError> {
        self.inner.find_by_reference(account_id, reference).await
    }

    async fn find_reference_group(
        &mut self,
        reference: &str,
    ) -> Result<Vec<Transaction>, PortError> {
        self.inner.find_reference_group(reference).await
    }

    async fn sum_debits_since(
        &mut self,
        account_id: AccountId,
        kinds: &[TransactionType],
        since: DateTime<Utc>,
    ) -> Result<Decimal, PortError> {
        self.inner.sum_debits_since(account_id, kinds, since).await
    }

    async fn recent_transactions(
        &mut self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, PortError> {
        self.inner.recent_transactions(account_id, limit).await
    }

    async fn update_transaction_category(
        &mut self,
        id: TransactionId,
        category: Option<&str>,
    ) -> Result<(), PortError> {
        self.inner.update_transaction_category(id, category).await
    }

    async fn lock_loan(&mut self, id: LoanId) -> Result<Option<Loan>, PortError> {
        self.inner.lock_loan(id).await
    }

    async fn insert_loan(&mut self, loan: &Loan) -> Result<(), PortError> {
        self.inner.insert_loan(loan).await
    }

    async fn save_loan(&mut self, loan: &Loan) -> Result<(), PortError> {
        if self.fault == Fault::LoanSave {
            return Err(injected("save_loan"));
        }
        self.inner.save_loan(loan).await
    }

    async fn insert_repayment(&mut self, repayment: &Repayment) -> Result<(), PortError> {
        self.inner.insert_repayment(repayment).await
    }

    async fn find_payee(&mut self, id: PayeeId) -> Result<Option<BillPayee>, PortError> {
        self.inner.find_payee(id).await
    }

    async fn insert_payee(&mut self, payee: &BillPayee) -> Result<(), PortError> {
        self.inner.insert_payee(payee).await
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        if self.fault == Fault::Commit {
            self.inner.rollback().await?;
            return Err(injected("commit"));
        }
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        self.inner.rollback().await
    }
}
