//! Storage ports for the ledger
//!
//! A [`LedgerStore`] hands out [`LedgerScope`]s. A scope is one atomic unit
//! of persistence work: every read and write made through it becomes
//! visible together on [`LedgerScope::commit`], and none of them do if the
//! scope is rolled back or dropped.
//!
//! `lock_*` methods take an exclusive lock on the row for the rest of the
//! scope. Anything a decision depends on (balance, limit usage, reference
//! replays) must be read after the lock is held.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use core_kernel::{
    AccountId, DomainPort, HealthCheckable, LoanId, PayeeId, PortError, TransactionId,
};

use crate::account::Account;
use crate::loan::{Loan, Repayment};
use crate::payee::BillPayee;
use crate::transaction::{Transaction, TransactionType};

/// Factory for atomic scopes
#[async_trait]
pub trait LedgerStore: DomainPort + HealthCheckable {
    /// Opens a new atomic scope
    async fn begin(&self) -> Result<Box<dyn LedgerScope>, PortError>;
}

/// One atomic unit of ledger persistence work
#[async_trait]
pub trait LedgerScope: Send {
    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Reads an account and holds its row lock until the scope ends
    ///
    /// Locking an account already locked by this scope is a plain re-read.
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>, PortError>;

    /// Reads an account without locking it
    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, PortError>;

    /// Looks up an account by its account number without locking it
    async fn find_account_by_number(
        &mut self,
        account_number: &str,
    ) -> Result<Option<Account>, PortError>;

    /// Inserts a newly opened account
    async fn insert_account(&mut self, account: &Account) -> Result<(), PortError>;

    /// Writes back balance, status and `updated_at` of a locked account
    async fn save_account(&mut self, account: &Account) -> Result<(), PortError>;

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Appends a transaction
    ///
    /// Fails with `PortError::Conflict` if the account already owns a
    /// transaction with the same reference. Counterpart credits (see
    /// [`Transaction::is_counterpart_credit`]) own no reference.
    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), PortError>;

    /// Reads one transaction
    async fn find_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, PortError>;

    /// Finds the transaction on `account_id` that owns `reference`
    ///
    /// Counterpart credits are never returned.
    async fn find_by_reference(
        &mut self,
        account_id: AccountId,
        reference: &str,
    ) -> Result<Option<Transaction>, PortError>;

    /// All transactions carrying `reference`, across accounts
    async fn find_reference_group(&mut self, reference: &str)
        -> Result<Vec<Transaction>, PortError>;

    /// Sum of the absolute amounts of completed debits of the given kinds
    /// recorded on `account_id` at or after `since`
    async fn sum_debits_since(
        &mut self,
        account_id: AccountId,
        kinds: &[TransactionType],
        since: DateTime<Utc>,
    ) -> Result<Decimal, PortError>;

    /// Most recent transactions on an account, newest first
    async fn recent_transactions(
        &mut self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, PortError>;

    /// Replaces the category of a transaction
    async fn update_transaction_category(
        &mut self,
        id: TransactionId,
        category: Option<&str>,
    ) -> Result<(), PortError>;

    // ------------------------------------------------------------------
    // Loans
    // ------------------------------------------------------------------

    /// Reads a loan and holds its row lock until the scope ends
    async fn lock_loan(&mut self, id: LoanId) -> Result<Option<Loan>, PortError>;

    async fn insert_loan(&mut self, loan: &Loan) -> Result<(), PortError>;

    /// Writes back status, remaining amount and `updated_at` of a locked loan
    async fn save_loan(&mut self, loan: &Loan) -> Result<(), PortError>;

    async fn insert_repayment(&mut self, repayment: &Repayment) -> Result<(), PortError>;

    // ------------------------------------------------------------------
    // Payees
    // ------------------------------------------------------------------

    async fn find_payee(&mut self, id: PayeeId) -> Result<Option<BillPayee>, PortError>;

    async fn insert_payee(&mut self, payee: &BillPayee) -> Result<(), PortError>;

    // ------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------

    /// Makes every write of this scope visible at once
    async fn commit(self: Box<Self>) -> Result<(), PortError>;

    /// Discards every write of this scope
    async fn rollback(self: Box<Self>) -> Result<(), PortError>;
}
