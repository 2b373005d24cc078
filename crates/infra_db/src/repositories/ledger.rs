//! PostgreSQL ledger store
//!
//! Each [`LedgerScope`] is one database transaction. Account and loan rows
//! are read with `SELECT ... FOR UPDATE`, so a second scope touching the
//! same row waits until the first commits or rolls back and then reads the
//! committed values. Dropping a scope without committing rolls it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres};
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    AccountId, Currency, DomainPort, HealthCheckResult, HealthCheckable, LoanId, Money, PayeeId,
    PortError, Rate, TransactionId, UserId,
};
use domain_ledger::{
    Account, AccountStatus, BillPayee, LedgerScope, LedgerStore, Loan, LoanStatus, Repayment,
    Transaction, TransactionStatus, TransactionType,
};

use crate::error::{port_error, DatabaseError};

const ACCOUNT_COLUMNS: &str = "account_id, owner_id, account_number, currency, balance, status, \
     daily_limit, monthly_limit, overdraft_floor, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = "transaction_id, account_id, transaction_type, amount, currency, \
     status, reference, description, category, counterparty_account_id, document_ref, created_at";

const LOAN_COLUMNS: &str = "loan_id, owner_id, currency, principal, interest_rate, term_months, \
     total_repayable, remaining_amount, status, created_at, updated_at";

/// PostgreSQL-backed implementation of [`LedgerStore`]
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
    lock_timeout_ms: u64,
}

impl PgLedgerStore {
    /// Creates a store over `pool` with a 5 second row lock budget
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout_ms: 5_000,
        }
    }

    /// Sets how long a scope waits for a row lock before failing
    pub fn with_lock_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.lock_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Returns the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DomainPort for PgLedgerStore {}

#[async_trait]
impl HealthCheckable for PgLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult::healthy("postgres-ledger-store", latency_ms),
            Err(e) => HealthCheckResult::unhealthy(
                "postgres-ledger-store",
                format!("Database error: {}", e),
            ),
        }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    #[instrument(skip(self))]
    async fn begin(&self) -> Result<Box<dyn LedgerScope>, PortError> {
        let mut tx = self.pool.begin().await.map_err(port_error)?;
        // SET does not take bind parameters
        sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout_ms))
            .execute(&mut *tx)
            .await
            .map_err(port_error)?;
        Ok(Box::new(PgLedgerScope { tx }))
    }
}

/// One database transaction over the ledger tables
pub struct PgLedgerScope {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerScope for PgLedgerScope {
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>, PortError> {
        let sql = format!(
            "SELECT {} FROM ledger_accounts WHERE account_id = $1 FOR UPDATE",
            ACCOUNT_COLUMNS
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(port_error)?;
        debug!(account_id = %id, "account row locked");
        row.map(Account::try_from).transpose()
    }

    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, PortError> {
        let sql = format!("SELECT {} FROM ledger_accounts WHERE account_id = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(port_error)?;
        row.map(Account::try_from).transpose()
    }

    async fn find_account_by_number(
        &mut self,
        account_number: &str,
    ) -> Result<Option<Account>, PortError> {
        let sql = format!(
            "SELECT {} FROM ledger_accounts WHERE account_number = $1",
            ACCOUNT_COLUMNS
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(account_number)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(port_error)?;
        row.map(Account::try_from).transpose()
    }

    async fn insert_account(&mut self, account: &Account) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO ledger_accounts (
                account_id, owner_id, account_number, currency, balance, status,
                daily_limit, monthly_limit, overdraft_floor, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(*account.id.as_uuid())
        .bind(*account.owner_id.as_uuid())
        .bind(&account.account_number)
        .bind(account.currency.code())
        .bind(account.balance.amount())
        .bind(DbAccountStatus::from(account.status))
        .bind(account.daily_limit.amount())
        .bind(account.monthly_limit.amount())
        .bind(account.overdraft_floor.amount())
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(port_error)?;
        Ok(())
    }

    async fn save_account(&mut self, account: &Account) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE ledger_accounts
            SET balance = $2, status = $3, updated_at = $4
            WHERE account_id = $1
            "#,
        )
        .bind(*account.id.as_uuid())
        .bind(account.balance.amount())
        .bind(DbAccountStatus::from(account.status))
        .bind(account.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(port_error)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Account", account.id));
        }
        Ok(())
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            INSERT INTO ledger_transactions (
                transaction_id, account_id, transaction_type, amount, currency, status,
                reference, description, category, counterparty_account_id, document_ref,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(*transaction.id.as_uuid())
        .bind(*transaction.account_id.as_uuid())
        .bind(DbTransactionType::from(transaction.transaction_type))
        .bind(transaction.amount.amount())
        .bind(transaction.amount.currency().code())
        .bind(DbTransactionStatus::from(transaction.status))
        .bind(&transaction.reference)
        .bind(&transaction.description)
        .bind(transaction.category.as_deref())
        .bind(transaction.counterparty_account_id.map(Uuid::from))
        .bind(transaction.document_ref.as_deref())
        .bind(transaction.created_at)
        .execute(&mut *self.tx)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) => match DatabaseError::from(&error) {
                DatabaseError::DuplicateEntry(_) => {
                    Err(PortError::conflict(transaction.reference.clone()))
                }
                other => Err(other.into()),
            },
        }
    }

    async fn find_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, PortError> {
        let sql = format!(
            "SELECT {} FROM ledger_transactions WHERE transaction_id = $1",
            TRANSACTION_COLUMNS
        );
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(port_error)?;
        row.map(Transaction::try_from).transpose()
    }

    async fn find_by_reference(
        &mut self,
        account_id: AccountId,
        reference: &str,
    ) -> Result<Option<Transaction>, PortError> {
        let sql = format!(
            "SELECT {} FROM ledger_transactions \
             WHERE account_id = $1 AND reference = $2 \
               AND (counterparty_account_id IS NULL OR amount < 0)",
            TRANSACTION_COLUMNS
        );
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(*account_id.as_uuid())
            .bind(reference)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(port_error)?;
        row.map(Transaction::try_from).transpose()
    }

    async fn find_reference_group(
        &mut self,
        reference: &str,
    ) -> Result<Vec<Transaction>, PortError> {
        let sql = format!(
            "SELECT {} FROM ledger_transactions WHERE reference = $1 ORDER BY created_at, transaction_id",
            TRANSACTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(reference)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(port_error)?;
        rows.into_iter().map(Transaction::try_from).collect()
    }

    async fn sum_debits_since(
        &mut self,
        account_id: AccountId,
        kinds: &[TransactionType],
        since: DateTime<Utc>,
    ) -> Result<Decimal, PortError> {
        let kinds: Vec<&'static str> = kinds
            .iter()
            .map(|kind| DbTransactionType::from(*kind).as_str())
            .collect();

        sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(-amount), 0)
            FROM ledger_transactions
            WHERE account_id = $1
              AND status = 'completed'
              AND amount < 0
              AND transaction_type::text = ANY($2)
              AND created_at >= $3
            "#,
        )
        .bind(*account_id.as_uuid())
        .bind(&kinds)
        .bind(since)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(port_error)
    }

    async fn recent_transactions(
        &mut self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, PortError> {
        let sql = format!(
            "SELECT {} FROM ledger_transactions WHERE account_id = $1 \
             ORDER BY created_at DESC, transaction_id DESC LIMIT $2",
            TRANSACTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(*account_id.as_uuid())
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&mut *self.tx)
            .await
            .map_err(port_error)?;
        rows.into_iter().map(Transaction::try_from).collect()
    }

    async fn update_transaction_category(
        &mut self,
        id: TransactionId,
        category: Option<&str>,
    ) -> Result<(), PortError> {
        let result = sqlx::query("UPDATE ledger_transactions SET category = $2 WHERE transaction_id = $1")
            .bind(*id.as_uuid())
            .bind(category)
            .execute(&mut *self.tx)
            .await
            .map_err(port_error)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Transaction", id));
        }
        Ok(())
    }

    async fn lock_loan(&mut self, id: LoanId) -> Result<Option<Loan>, PortError> {
        let sql = format!("SELECT {} FROM loans WHERE loan_id = $1 FOR UPDATE", LOAN_COLUMNS);
        let row = sqlx::query_as::<_, LoanRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(port_error)?;
        row.map(Loan::try_from).transpose()
    }

    async fn insert_loan(&mut self, loan: &Loan) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO loans (
                loan_id, owner_id, currency, principal, interest_rate, term_months,
                total_repayable, remaining_amount, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(*loan.id.as_uuid())
        .bind(*loan.owner_id.as_uuid())
        .bind(loan.currency().code())
        .bind(loan.principal.amount())
        .bind(loan.interest_rate.as_decimal())
        .bind(i32::try_from(loan.term_months).map_err(|_| {
            PortError::transformation(format!("term of {} months is out of range", loan.term_months))
        })?)
        .bind(loan.total_repayable.amount())
        .bind(loan.remaining_amount.amount())
        .bind(DbLoanStatus::from(loan.status))
        .bind(loan.created_at)
        .bind(loan.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(port_error)?;
        Ok(())
    }

    async fn save_loan(&mut self, loan: &Loan) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET remaining_amount = $2, status = $3, updated_at = $4
            WHERE loan_id = $1
            "#,
        )
        .bind(*loan.id.as_uuid())
        .bind(loan.remaining_amount.amount())
        .bind(DbLoanStatus::from(loan.status))
        .bind(loan.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(port_error)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Loan", loan.id));
        }
        Ok(())
    }

    async fn insert_repayment(&mut self, repayment: &Repayment) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO loan_repayments (
                repayment_id, loan_id, account_id, transaction_id, amount,
                remaining_after, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(*repayment.id.as_uuid())
        .bind(*repayment.loan_id.as_uuid())
        .bind(*repayment.account_id.as_uuid())
        .bind(*repayment.transaction_id.as_uuid())
        .bind(repayment.amount.amount())
        .bind(repayment.remaining_after.amount())
        .bind(repayment.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(port_error)?;
        Ok(())
    }

    async fn find_payee(&mut self, id: PayeeId) -> Result<Option<BillPayee>, PortError> {
        let row = sqlx::query_as::<_, PayeeRow>(
            "SELECT payee_id, name, account_number, category FROM bill_payees WHERE payee_id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(port_error)?;
        Ok(row.map(BillPayee::from))
    }

    async fn insert_payee(&mut self, payee: &BillPayee) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO bill_payees (payee_id, name, account_number, category) VALUES ($1, $2, $3, $4)",
        )
        .bind(*payee.id.as_uuid())
        .bind(&payee.name)
        .bind(&payee.account_number)
        .bind(&payee.category)
        .execute(&mut *self.tx)
        .await
        .map_err(port_error)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        let PgLedgerScope { tx } = *self;
        tx.commit().await.map_err(port_error)
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        let PgLedgerScope { tx } = *self;
        tx.rollback().await.map_err(port_error)
    }
}

// ----------------------------------------------------------------------
// Database enums
// ----------------------------------------------------------------------

/// Account status as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "account_status", rename_all = "snake_case")]
pub enum DbAccountStatus {
    Active,
    Suspended,
    Closed,
}

impl From<AccountStatus> for DbAccountStatus {
    fn from(status: AccountStatus) -> Self {
        match status {
            AccountStatus::Active => DbAccountStatus::Active,
            AccountStatus::Suspended => DbAccountStatus::Suspended,
            AccountStatus::Closed => DbAccountStatus::Closed,
        }
    }
}

impl From<DbAccountStatus> for AccountStatus {
    fn from(status: DbAccountStatus) -> Self {
        match status {
            DbAccountStatus::Active => AccountStatus::Active,
            DbAccountStatus::Suspended => AccountStatus::Suspended,
            DbAccountStatus::Closed => AccountStatus::Closed,
        }
    }
}

/// Transaction type as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
pub enum DbTransactionType {
    Deposit,
    Withdrawal,
    Transfer,
    BillPayment,
    LoanRepayment,
}

impl DbTransactionType {
    /// Enum label in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            DbTransactionType::Deposit => "deposit",
            DbTransactionType::Withdrawal => "withdrawal",
            DbTransactionType::Transfer => "transfer",
            DbTransactionType::BillPayment => "bill_payment",
            DbTransactionType::LoanRepayment => "loan_repayment",
        }
    }
}

impl From<TransactionType> for DbTransactionType {
    fn from(kind: TransactionType) -> Self {
        match kind {
            TransactionType::Deposit => DbTransactionType::Deposit,
            TransactionType::Withdrawal => DbTransactionType::Withdrawal,
            TransactionType::Transfer => DbTransactionType::Transfer,
            TransactionType::BillPayment => DbTransactionType::BillPayment,
            TransactionType::LoanRepayment => DbTransactionType::LoanRepayment,
        }
    }
}

impl From<DbTransactionType> for TransactionType {
    fn from(kind: DbTransactionType) -> Self {
        match kind {
            DbTransactionType::Deposit => TransactionType::Deposit,
            DbTransactionType::Withdrawal => TransactionType::Withdrawal,
            DbTransactionType::Transfer => TransactionType::Transfer,
            DbTransactionType::BillPayment => TransactionType::BillPayment,
            DbTransactionType::LoanRepayment => TransactionType::LoanRepayment,
        }
    }
}

/// Transaction status as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
pub enum DbTransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl From<TransactionStatus> for DbTransactionStatus {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Pending => DbTransactionStatus::Pending,
            TransactionStatus::Completed => DbTransactionStatus::Completed,
            TransactionStatus::Failed => DbTransactionStatus::Failed,
        }
    }
}

impl From<DbTransactionStatus> for TransactionStatus {
    fn from(status: DbTransactionStatus) -> Self {
        match status {
            DbTransactionStatus::Pending => TransactionStatus::Pending,
            DbTransactionStatus::Completed => TransactionStatus::Completed,
            DbTransactionStatus::Failed => TransactionStatus::Failed,
        }
    }
}

/// Loan status as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "loan_status", rename_all = "snake_case")]
pub enum DbLoanStatus {
    Active,
    Paid,
    Rejected,
    Withdrawn,
}

impl From<LoanStatus> for DbLoanStatus {
    fn from(status: LoanStatus) -> Self {
        match status {
            LoanStatus::Active => DbLoanStatus::Active,
            LoanStatus::Paid => DbLoanStatus::Paid,
            LoanStatus::Rejected => DbLoanStatus::Rejected,
            LoanStatus::Withdrawn => DbLoanStatus::Withdrawn,
        }
    }
}

impl From<DbLoanStatus> for LoanStatus {
    fn from(status: DbLoanStatus) -> Self {
        match status {
            DbLoanStatus::Active => LoanStatus::Active,
            DbLoanStatus::Paid => LoanStatus::Paid,
            DbLoanStatus::Rejected => LoanStatus::Rejected,
            DbLoanStatus::Withdrawn => LoanStatus::Withdrawn,
        }
    }
}

// ----------------------------------------------------------------------
// Rows
// ----------------------------------------------------------------------

/// Database row for an account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub account_id: Uuid,
    pub owner_id: Uuid,
    pub account_number: String,
    pub currency: String,
    pub balance: Decimal,
    pub status: DbAccountStatus,
    pub daily_limit: Decimal,
    pub monthly_limit: Decimal,
    pub overdraft_floor: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for a ledger transaction
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub transaction_type: DbTransactionType,
    pub amount: Decimal,
    pub currency: String,
    pub status: DbTransactionStatus,
    pub reference: String,
    pub description: String,
    pub category: Option<String>,
    pub counterparty_account_id: Option<Uuid>,
    pub document_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Database row for a loan
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoanRow {
    pub loan_id: Uuid,
    pub owner_id: Uuid,
    pub currency: String,
    pub principal: Decimal,
    pub interest_rate: Decimal,
    pub term_months: i32,
    pub total_repayable: Decimal,
    pub remaining_amount: Decimal,
    pub status: DbLoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for a bill payee
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PayeeRow {
    pub payee_id: Uuid,
    pub name: String,
    pub account_number: String,
    pub category: String,
}

fn currency(code: &str) -> Result<Currency, PortError> {
    Currency::from_str(code.trim()).map_err(|e| PortError::transformation(e.to_string()))
}

/// Restores the currency scale of a stored NUMERIC(19, 4) amount
///
/// Stored amounts never carry more digits than the currency allows, so a
/// value that does indicates corrupted data.
fn money(amount: Decimal, currency: Currency) -> Result<Money, PortError> {
    Money::try_new(amount, currency).map_err(|e| PortError::transformation(e.to_string()))
}

impl TryFrom<AccountRow> for Account {
    type Error = PortError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let currency = currency(&row.currency)?;
        Ok(Account {
            id: AccountId::from(row.account_id),
            owner_id: UserId::from(row.owner_id),
            account_number: row.account_number,
            currency,
            balance: money(row.balance, currency)?,
            status: row.status.into(),
            daily_limit: money(row.daily_limit, currency)?,
            monthly_limit: money(row.monthly_limit, currency)?,
            overdraft_floor: money(row.overdraft_floor, currency)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = PortError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let currency = currency(&row.currency)?;
        Ok(Transaction {
            id: TransactionId::from(row.transaction_id),
            account_id: AccountId::from(row.account_id),
            transaction_type: row.transaction_type.into(),
            amount: money(row.amount, currency)?,
            status: row.status.into(),
            reference: row.reference,
            description: row.description,
            category: row.category,
            counterparty_account_id: row.counterparty_account_id.map(AccountId::from),
            document_ref: row.document_ref,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<LoanRow> for Loan {
    type Error = PortError;

    fn try_from(row: LoanRow) -> Result<Self, Self::Error> {
        let currency = currency(&row.currency)?;
        let term_months = u32::try_from(row.term_months)
            .map_err(|_| PortError::transformation(format!("invalid loan term {}", row.term_months)))?;
        Ok(Loan {
            id: LoanId::from(row.loan_id),
            owner_id: UserId::from(row.owner_id),
            principal: money(row.principal, currency)?,
            interest_rate: Rate::new(row.interest_rate),
            term_months,
            total_repayable: money(row.total_repayable, currency)?,
            remaining_amount: money(row.remaining_amount, currency)?,
            status: row.status.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<PayeeRow> for BillPayee {
    fn from(row: PayeeRow) -> Self {
        BillPayee {
            id: PayeeId::from(row.payee_id),
            name: row.name,
            account_number: row.account_number,
            category: row.category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn account_row() -> AccountRow {
        AccountRow {
            account_id: Uuid::now_v7(),
            owner_id: Uuid::new_v4(),
            account_number: "000123456789".to_string(),
            currency: "USD".to_string(),
            balance: dec!(120.5000),
            status: DbAccountStatus::Suspended,
            daily_limit: dec!(500.0000),
            monthly_limit: dec!(5000.0000),
            overdraft_floor: dec!(-100.0000),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_account_row_conversion() {
        let account = Account::try_from(account_row()).unwrap();

        assert_eq!(account.currency, Currency::USD);
        assert_eq!(account.balance.amount(), dec!(120.50));
        assert_eq!(account.balance.amount().scale(), 2);
        assert_eq!(account.status, AccountStatus::Suspended);
        assert_eq!(account.overdraft_floor.amount(), dec!(-100));
    }

    #[test]
    fn test_unknown_currency_is_transformation_error() {
        let row = AccountRow {
            currency: "XXX".to_string(),
            ..account_row()
        };
        let err = Account::try_from(row).unwrap_err();
        assert!(matches!(err, PortError::Transformation { .. }));
    }

    #[test]
    fn test_over_precise_amount_rejected() {
        let row = AccountRow {
            balance: dec!(1.2345),
            ..account_row()
        };
        assert!(Account::try_from(row).is_err());
    }

    #[test]
    fn test_enum_labels_match_schema() {
        for kind in [
            TransactionType::Deposit,
            TransactionType::Withdrawal,
            TransactionType::Transfer,
            TransactionType::BillPayment,
            TransactionType::LoanRepayment,
        ] {
            let label = DbTransactionType::from(kind).as_str();
            assert_eq!(label, kind.as_str().to_ascii_lowercase());
            assert_eq!(TransactionType::from(DbTransactionType::from(kind)), kind);
        }
    }

    proptest! {
        #[test]
        fn test_stored_scale_restored_to_currency(cents in -1_000_000_000i64..1_000_000_000i64) {
            // NUMERIC(19, 4) pads cent amounts with two trailing zeros
            let stored = Decimal::new(cents * 100, 4);
            let restored = money(stored, Currency::USD).unwrap();
            prop_assert_eq!(restored.minor_units(), cents as i128);
            prop_assert_eq!(restored.amount().scale(), 2);
        }
    }
}
