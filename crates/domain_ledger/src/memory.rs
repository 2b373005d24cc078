//! In-memory ledger store
//!
//! A scope holds the store-wide mutex for its whole lifetime and works on a
//! private copy of the state. Commit swaps the copy in; rollback or drop
//! discards it. Scopes are therefore fully serialized, which is a stricter
//! form of the row locking the PostgreSQL adapter provides.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use core_kernel::{
    AccountId, DomainPort, HealthCheckResult, HealthCheckable, LoanId, PayeeId, PortError,
    TransactionId,
};

use crate::account::Account;
use crate::loan::{Loan, Repayment};
use crate::payee::BillPayee;
use crate::ports::{LedgerScope, LedgerStore};
use crate::transaction::{Transaction, TransactionStatus, TransactionType};

#[derive(Debug, Clone, Default)]
struct State {
    accounts: HashMap<AccountId, Account>,
    transactions: Vec<Transaction>,
    loans: HashMap<LoanId, Loan>,
    repayments: Vec<Repayment>,
    payees: HashMap<PayeeId, BillPayee>,
}

/// Ledger store kept entirely in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed accounts
    pub async fn accounts(&self) -> Vec<Account> {
        self.state.lock().await.accounts.values().cloned().collect()
    }

    /// Committed transactions in insertion order
    pub async fn transactions(&self) -> Vec<Transaction> {
        self.state.lock().await.transactions.clone()
    }

    /// Committed loan repayments in insertion order
    pub async fn repayments(&self) -> Vec<Repayment> {
        self.state.lock().await.repayments.clone()
    }
}

impl DomainPort for InMemoryLedgerStore {}

#[async_trait]
impl HealthCheckable for InMemoryLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::healthy("memory", 0)
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerScope>, PortError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryScope { guard, staged }))
    }
}

/// Atomic scope over [`InMemoryLedgerStore`]
pub struct InMemoryScope {
    guard: OwnedMutexGuard<State>,
    staged: State,
}

#[async_trait]
impl LedgerScope for InMemoryScope {
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>, PortError> {
        Ok(self.staged.accounts.get(&id).cloned())
    }

    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, PortError> {
        Ok(self.staged.accounts.get(&id).cloned())
    }

    async fn find_account_by_number(
        &mut self,
        account_number: &str,
    ) -> Result<Option<Account>, PortError> {
        Ok(self
            .staged
            .accounts
            .values()
            .find(|a| a.account_number == account_number)
            .cloned())
    }

    async fn insert_account(&mut self, account: &Account) -> Result<(), PortError> {
        let number_taken = self
            .staged
            .accounts
            .values()
            .any(|a| a.account_number == account.account_number);
        if number_taken || self.staged.accounts.contains_key(&account.id) {
            return Err(PortError::conflict(format!(
                "account {} already exists",
                account.account_number
            )));
        }
        self.staged.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn save_account(&mut self, account: &Account) -> Result<(), PortError> {
        match self.staged.accounts.get_mut(&account.id) {
            Some(stored) => {
                *stored = account.clone();
                Ok(())
            }
            None => Err(PortError::not_found("Account", account.id)),
        }
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), PortError> {
        let duplicate = !transaction.is_counterpart_credit()
            && self.staged.transactions.iter().any(|t| {
                !t.is_counterpart_credit()
                    && t.account_id == transaction.account_id
                    && t.reference == transaction.reference
            });
        if duplicate {
            return Err(PortError::conflict(transaction.reference.clone()));
        }
        self.staged.transactions.push(transaction.clone());
        Ok(())
    }

    async fn find_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, PortError> {
        Ok(self.staged.transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_reference(
        &mut self,
        account_id: AccountId,
        reference: &str,
    ) -> Result<Option<Transaction>, PortError> {
        Ok(self
            .staged
            .transactions
            .iter()
            .find(|t| {
                t.account_id == account_id
                    && t.reference == reference
                    && !t.is_counterpart_credit()
            })
            .cloned())
    }

    async fn find_reference_group(
        &mut self,
        reference: &str,
    ) -> Result<Vec<Transaction>, PortError> {
        Ok(self
            .staged
            .transactions
            .iter()
            .filter(|t| t.reference == reference)
            .cloned()
            .collect())
    }

    async fn sum_debits_since(
        &mut self,
        account_id: AccountId,
        kinds: &[TransactionType],
        since: DateTime<Utc>,
    ) -> Result<Decimal, PortError> {
        Ok(self
            .staged
            .transactions
            .iter()
            .filter(|t| {
                t.account_id == account_id
                    && t.status == TransactionStatus::Completed
                    && t.amount.is_negative()
                    && kinds.contains(&t.transaction_type)
                    && t.created_at >= since
            })
            .map(|t| t.amount.amount().abs())
            .sum())
    }

    async fn recent_transactions(
        &mut self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, PortError> {
        let mut rows: Vec<Transaction> = self
            .staged
            .transactions
            .iter()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn update_transaction_category(
        &mut self,
        id: TransactionId,
        category: Option<&str>,
    ) -> Result<(), PortError> {
        match self.staged.transactions.iter_mut().find(|t| t.id == id) {
            Some(transaction) => {
                transaction.category = category.map(str::to_string);
                Ok(())
            }
            None => Err(PortError::not_found("Transaction", id)),
        }
    }

    async fn lock_loan(&mut self, id: LoanId) -> Result<Option<Loan>, PortError> {
        Ok(self.staged.loans.get(&id).cloned())
    }

    async fn insert_loan(&mut self, loan: &Loan) -> Result<(), PortError> {
        if self.staged.loans.contains_key(&loan.id) {
            return Err(PortError::conflict(format!("loan {} already exists", loan.id)));
        }
        self.staged.loans.insert(loan.id, loan.clone());
        Ok(())
    }

    async fn save_loan(&mut self, loan: &Loan) -> Result<(), PortError> {
        match self.staged.loans.get_mut(&loan.id) {
            Some(stored) => {
                *stored = loan.clone();
                Ok(())
            }
            None => Err(PortError::not_found("Loan", loan.id)),
        }
    }

    async fn insert_repayment(&mut self, repayment: &Repayment) -> Result<(), PortError> {
        self.staged.repayments.push(repayment.clone());
        Ok(())
    }

    async fn find_payee(&mut self, id: PayeeId) -> Result<Option<BillPayee>, PortError> {
        Ok(self.staged.payees.get(&id).cloned())
    }

    async fn insert_payee(&mut self, payee: &BillPayee) -> Result<(), PortError> {
        self.staged.payees.insert(payee.id, payee.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        let InMemoryScope { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        Ok(())
    }
}
