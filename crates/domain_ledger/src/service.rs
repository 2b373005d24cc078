//! Ledger service
//!
//! Entry point for every ledger operation. Each call opens one atomic scope
//! on the injected store, runs the operation inside it, and commits on
//! success or rolls back on any error.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use core_kernel::{
    AccountId, HealthCheckResult, LoanId, Money, Rate, TransactionId,
};

use crate::account::{generate_account_number, Account, AccountStatus};
use crate::bill;
use crate::clock::{Clock, SystemClock};
use crate::commands::{
    non_negative_amount, positive_amount, Actor, BillPaymentRequest, DepositRequest,
    LoanRepaymentRequest, OpenAccountRequest, RegisterLoanRequest, TransferRequest,
    WithdrawalRequest,
};
use crate::config::{LedgerConfig, DEFAULT_STATEMENT_LIMIT, MAX_STATEMENT_LIMIT};
use crate::error::LedgerError;
use crate::limits::{self, SpendingAllowance};
use crate::loan::{Loan, RepaymentReceipt};
use crate::mutator::{self, Mutation, ACCEPTS_DEPOSITS};
use crate::payee::BillPayee;
use crate::ports::{LedgerScope, LedgerStore};
use crate::reference::{self, ReferencePrefix};
use crate::repayment;
use crate::transaction::{Transaction, TransactionReceipt, TransactionType, TransferReceipt};
use crate::transfer::{self, TransferPlan};

/// Account returned by [`LedgerService::open_account`]
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedAccount {
    pub account: Account,
    /// Initial deposit, when one was requested
    pub opening_deposit: Option<Transaction>,
}

/// Ledger operations over an injected store
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    config: LedgerConfig,
    clock: Arc<dyn Clock>,
}

impl LedgerService {
    /// Creates a service using the system clock
    pub fn new(store: Arc<dyn LedgerStore>, config: LedgerConfig) -> Self {
        Self {
            store,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Health of the underlying store
    pub async fn health_check(&self) -> HealthCheckResult {
        self.store.health_check().await
    }

    // ------------------------------------------------------------------
    // Money movement
    // ------------------------------------------------------------------

    /// Credits an account
    ///
    /// Suspended accounts still accept deposits. Repeating a request with the
    /// same caller reference returns the original transaction.
    pub async fn deposit(
        &self,
        actor: Actor,
        request: DepositRequest,
    ) -> Result<TransactionReceipt, LedgerError> {
        let now = self.clock.now();
        let mut scope = self.store.begin().await?;
        let result = Self::deposit_in(scope.as_mut(), actor, &request, now).await;
        let result = finish(scope, result).await;

        log_movement("deposit", request.account_id, &result);
        result
    }

    /// Debits an account, subject to spending limits
    pub async fn withdraw(
        &self,
        actor: Actor,
        request: WithdrawalRequest,
    ) -> Result<TransactionReceipt, LedgerError> {
        let now = self.clock.now();
        let mut scope = self.store.begin().await?;
        let result = self.withdraw_in(scope.as_mut(), actor, &request, now).await;
        let result = finish(scope, result).await;

        log_movement("withdrawal", request.account_id, &result);
        result
    }

    /// Moves money between two accounts
    pub async fn transfer(
        &self,
        actor: Actor,
        request: TransferRequest,
    ) -> Result<TransferReceipt, LedgerError> {
        let now = self.clock.now();
        let mut scope = self.store.begin().await?;
        let plan = TransferPlan {
            actor,
            from: request.from_account_id,
            to: &request.to,
            amount: request.amount,
            description: &request.description,
            reference: request.reference.as_deref(),
            prefix: ReferencePrefix::Transfer,
            kind: TransactionType::Transfer,
            category: None,
            document_ref: None,
            verification_threshold: None,
        };
        let result = transfer::execute(scope.as_mut(), plan, self.config.timezone, now).await;
        let result = finish(scope, result).await;

        log_transfer("transfer", &result);
        result
    }

    /// Pays a registered payee
    pub async fn pay_bill(
        &self,
        actor: Actor,
        request: BillPaymentRequest,
    ) -> Result<TransferReceipt, LedgerError> {
        let now = self.clock.now();
        let mut scope = self.store.begin().await?;
        let result = bill::pay(scope.as_mut(), actor, &request, &self.config, now).await;
        let result = finish(scope, result).await;

        log_transfer("bill_payment", &result);
        result
    }

    /// Pays a payee with a supporting document attached
    pub async fn pay_verified(
        &self,
        actor: Actor,
        mut request: BillPaymentRequest,
        document_ref: impl Into<String>,
    ) -> Result<TransferReceipt, LedgerError> {
        request.document_ref = Some(document_ref.into());
        self.pay_bill(actor, request).await
    }

    /// Repays a loan from one of the borrower's accounts
    pub async fn repay_loan(
        &self,
        actor: Actor,
        request: LoanRepaymentRequest,
    ) -> Result<RepaymentReceipt, LedgerError> {
        let now = self.clock.now();
        let mut scope = self.store.begin().await?;
        let result = repayment::repay(scope.as_mut(), actor, &request, now).await;
        let result = finish(scope, result).await;

        match &result {
            Ok(receipt) => tracing::info!(
                loan_id = %receipt.loan.id,
                account_id = %receipt.repayment.account_id,
                reference = %receipt.transaction.reference,
                status = %receipt.loan.status,
                "loan repayment committed"
            ),
            Err(error) => warn_rejected("loan_repayment", error),
        }
        result
    }

    // ------------------------------------------------------------------
    // Account lifecycle
    // ------------------------------------------------------------------

    /// Opens an account, optionally posting an initial deposit
    pub async fn open_account(
        &self,
        actor: Actor,
        request: OpenAccountRequest,
    ) -> Result<OpenedAccount, LedgerError> {
        let now = self.clock.now();
        let mut scope = self.store.begin().await?;
        let result = Self::open_account_in(scope.as_mut(), actor, &request, now).await;
        let result = finish(scope, result).await;

        match &result {
            Ok(opened) => tracing::info!(
                account_id = %opened.account.id,
                owner_id = %opened.account.owner_id,
                currency = %opened.account.currency,
                "account opened"
            ),
            Err(error) => warn_rejected("open_account", error),
        }
        result
    }

    /// Closes an account with a zero balance
    pub async fn close_account(
        &self,
        actor: Actor,
        account_id: AccountId,
    ) -> Result<Account, LedgerError> {
        self.change_status(actor, account_id, AccountStatus::Closed).await
    }

    /// Freezes an account for debits
    pub async fn suspend_account(
        &self,
        actor: Actor,
        account_id: AccountId,
    ) -> Result<Account, LedgerError> {
        self.change_status(actor, account_id, AccountStatus::Suspended).await
    }

    /// Lifts a suspension
    pub async fn reactivate_account(
        &self,
        actor: Actor,
        account_id: AccountId,
    ) -> Result<Account, LedgerError> {
        self.change_status(actor, account_id, AccountStatus::Active).await
    }

    /// Reads an account
    pub async fn get_account(
        &self,
        actor: Actor,
        account_id: AccountId,
    ) -> Result<Account, LedgerError> {
        let mut scope = self.store.begin().await?;
        let result = find_accessible(scope.as_mut(), actor, account_id).await;
        finish(scope, result).await
    }

    // ------------------------------------------------------------------
    // Loans and payees
    // ------------------------------------------------------------------

    /// Registers an active loan
    pub async fn register_loan(
        &self,
        actor: Actor,
        request: RegisterLoanRequest,
    ) -> Result<Loan, LedgerError> {
        let now = self.clock.now();
        let mut scope = self.store.begin().await?;
        let result: Result<Loan, LedgerError> = async {
            if !actor.can_access(request.owner_id) {
                return Err(LedgerError::AccountNotFound(request.owner_id.to_string()));
            }
            let principal = positive_amount(request.principal, request.currency)?;
            let rate = Rate::from_percentage(request.annual_rate_percent);
            let loan = Loan::new(request.owner_id, principal, rate, request.term_months, now)?;
            scope.insert_loan(&loan).await?;
            Ok(loan)
        }
        .await;
        let result = finish(scope, result).await;

        if let Ok(loan) = &result {
            tracing::info!(loan_id = %loan.id, owner_id = %loan.owner_id, "loan registered");
        }
        result
    }

    /// Rejects a loan that has not been repaid against
    pub async fn reject_loan(&self, actor: Actor, loan_id: LoanId) -> Result<Loan, LedgerError> {
        self.close_loan(actor, loan_id, Loan::reject).await
    }

    /// Withdraws a loan that has not been repaid against
    pub async fn withdraw_loan(&self, actor: Actor, loan_id: LoanId) -> Result<Loan, LedgerError> {
        self.close_loan(actor, loan_id, Loan::withdraw).await
    }

    /// Reads a loan
    pub async fn get_loan(&self, actor: Actor, loan_id: LoanId) -> Result<Loan, LedgerError> {
        let mut scope = self.store.begin().await?;
        let result = scope
            .lock_loan(loan_id)
            .await
            .map_err(LedgerError::from)
            .and_then(|loan| {
                loan.filter(|l| actor.can_access(l.owner_id))
                    .ok_or_else(|| LedgerError::LoanNotFound(loan_id.to_string()))
            });
        finish(scope, result).await
    }

    /// Registers a bill payee
    pub async fn register_payee(&self, payee: BillPayee) -> Result<BillPayee, LedgerError> {
        let mut scope = self.store.begin().await?;
        let result = scope
            .insert_payee(&payee)
            .await
            .map(|_| payee)
            .map_err(LedgerError::from);
        finish(scope, result).await
    }

    // ------------------------------------------------------------------
    // Reads and metadata
    // ------------------------------------------------------------------

    /// Remaining daily and monthly allowance of an account
    pub async fn spending_allowance(
        &self,
        actor: Actor,
        account_id: AccountId,
    ) -> Result<SpendingAllowance, LedgerError> {
        let now = self.clock.now();
        let mut scope = self.store.begin().await?;
        let result: Result<SpendingAllowance, LedgerError> = async {
            let account = find_accessible(scope.as_mut(), actor, account_id).await?;
            limits::evaluate(scope.as_mut(), &account, now, self.config.timezone).await
        }
        .await;
        finish(scope, result).await
    }

    /// Most recent transactions of an account, newest first
    pub async fn account_statement(
        &self,
        actor: Actor,
        account_id: AccountId,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let limit = limit
            .unwrap_or(DEFAULT_STATEMENT_LIMIT)
            .clamp(1, MAX_STATEMENT_LIMIT);
        let mut scope = self.store.begin().await?;
        let result: Result<Vec<Transaction>, LedgerError> = async {
            find_accessible(scope.as_mut(), actor, account_id).await?;
            Ok(scope.recent_transactions(account_id, limit).await?)
        }
        .await;
        finish(scope, result).await
    }

    /// Changes the category of a transaction; nothing else about it may change
    pub async fn recategorize(
        &self,
        actor: Actor,
        transaction_id: TransactionId,
        category: Option<String>,
    ) -> Result<Transaction, LedgerError> {
        let category = category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let mut scope = self.store.begin().await?;
        let result: Result<Transaction, LedgerError> = async {
            let not_found = || LedgerError::TransactionNotFound(transaction_id.to_string());
            let mut transaction = scope
                .find_transaction(transaction_id)
                .await?
                .ok_or_else(not_found)?;
            let owner_visible = scope
                .find_account(transaction.account_id)
                .await?
                .is_some_and(|a| actor.can_access(a.owner_id));
            if !owner_visible {
                return Err(not_found());
            }
            scope
                .update_transaction_category(transaction_id, category.as_deref())
                .await?;
            transaction.category = category.clone();
            Ok(transaction)
        }
        .await;
        finish(scope, result).await
    }

    // ------------------------------------------------------------------
    // Scoped bodies
    // ------------------------------------------------------------------

    async fn deposit_in(
        scope: &mut dyn LedgerScope,
        actor: Actor,
        request: &DepositRequest,
        now: DateTime<Utc>,
    ) -> Result<TransactionReceipt, LedgerError> {
        let account = lock_accessible(scope, actor, request.account_id).await?;
        let amount = positive_amount(request.amount, account.currency)?;

        let (reference, from_caller) =
            reference::resolve(request.reference.as_deref(), ReferencePrefix::Deposit, now);
        if from_caller {
            if let Some(original) =
                find_replay(scope, &account, &reference, TransactionType::Deposit, &amount).await?
            {
                return Ok(original);
            }
        }

        let transaction = mutator::apply(
            scope,
            Mutation::new(account.id, amount, TransactionType::Deposit, &reference, &request.description)
                .permitting(ACCEPTS_DEPOSITS),
            now,
        )
        .await?;
        Ok(TransactionReceipt {
            transaction,
            replayed: false,
        })
    }

    async fn withdraw_in(
        &self,
        scope: &mut dyn LedgerScope,
        actor: Actor,
        request: &WithdrawalRequest,
        now: DateTime<Utc>,
    ) -> Result<TransactionReceipt, LedgerError> {
        let account = lock_accessible(scope, actor, request.account_id).await?;
        let amount = positive_amount(request.amount, account.currency)?;

        let (reference, from_caller) =
            reference::resolve(request.reference.as_deref(), ReferencePrefix::Withdrawal, now);
        let debit = -amount;
        if from_caller {
            if let Some(original) =
                find_replay(scope, &account, &reference, TransactionType::Withdrawal, &debit).await?
            {
                return Ok(original);
            }
        }

        if !account.is_active() {
            return Err(LedgerError::AccountNotActive {
                account: account.id.to_string(),
                status: account.status.to_string(),
            });
        }
        limits::evaluate(scope, &account, now, self.config.timezone)
            .await?
            .ensure_allows(&amount)?;

        let transaction = mutator::apply(
            scope,
            Mutation::new(account.id, debit, TransactionType::Withdrawal, &reference, &request.description),
            now,
        )
        .await?;
        Ok(TransactionReceipt {
            transaction,
            replayed: false,
        })
    }

    async fn open_account_in(
        scope: &mut dyn LedgerScope,
        actor: Actor,
        request: &OpenAccountRequest,
        now: DateTime<Utc>,
    ) -> Result<OpenedAccount, LedgerError> {
        if !actor.can_access(request.owner_id) {
            return Err(LedgerError::AccountNotFound(request.owner_id.to_string()));
        }
        let currency = request.currency;
        let daily_limit = non_negative_amount(request.daily_limit, currency)?;
        let monthly_limit = non_negative_amount(request.monthly_limit, currency)?;
        let overdraft = non_negative_amount(request.overdraft_limit, currency)?;

        let mut account = Account::open(request.owner_id, currency, daily_limit, monthly_limit, now)
            .with_overdraft_floor(overdraft);
        while scope
            .find_account_by_number(&account.account_number)
            .await?
            .is_some()
        {
            account.account_number = generate_account_number();
        }
        scope.insert_account(&account).await?;

        let opening_deposit = match request.initial_deposit {
            Some(amount) if !amount.is_zero() => {
                let amount = positive_amount(amount, currency)?;
                let reference = reference::generate(ReferencePrefix::Opening, now);
                let transaction = mutator::apply(
                    scope,
                    Mutation::new(account.id, amount, TransactionType::Deposit, &reference, "Initial deposit"),
                    now,
                )
                .await?;
                account.balance = amount;
                Some(transaction)
            }
            _ => None,
        };

        Ok(OpenedAccount {
            account,
            opening_deposit,
        })
    }

    async fn change_status(
        &self,
        actor: Actor,
        account_id: AccountId,
        target: AccountStatus,
    ) -> Result<Account, LedgerError> {
        let now = self.clock.now();
        let mut scope = self.store.begin().await?;
        let result: Result<Account, LedgerError> = async {
            let mut account = lock_accessible(scope.as_mut(), actor, account_id).await?;
            account.transition_to(target, now)?;
            scope.save_account(&account).await?;
            Ok(account)
        }
        .await;
        let result = finish(scope, result).await;

        match &result {
            Ok(account) => tracing::info!(
                account_id = %account.id,
                status = %account.status,
                "account status changed"
            ),
            Err(error) => warn_rejected("account_status", error),
        }
        result
    }

    async fn close_loan(
        &self,
        actor: Actor,
        loan_id: LoanId,
        transition: fn(&mut Loan, DateTime<Utc>) -> Result<(), LedgerError>,
    ) -> Result<Loan, LedgerError> {
        let now = self.clock.now();
        let mut scope = self.store.begin().await?;
        let result: Result<Loan, LedgerError> = async {
            let mut loan = scope
                .lock_loan(loan_id)
                .await?
                .filter(|l| actor.can_access(l.owner_id))
                .ok_or_else(|| LedgerError::LoanNotFound(loan_id.to_string()))?;
            transition(&mut loan, now)?;
            scope.save_loan(&loan).await?;
            Ok(loan)
        }
        .await;
        let result = finish(scope, result).await;

        if let Ok(loan) = &result {
            tracing::info!(loan_id = %loan.id, status = %loan.status, "loan closed");
        }
        result
    }
}

/// Commits on success, rolls back on failure
async fn finish<T>(
    scope: Box<dyn LedgerScope>,
    result: Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    match result {
        Ok(value) => {
            scope.commit().await?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = scope.rollback().await {
                tracing::error!(error = %rollback_error, "rollback failed");
            }
            Err(error)
        }
    }
}

/// Locks an account the actor may act on
async fn lock_accessible(
    scope: &mut dyn LedgerScope,
    actor: Actor,
    account_id: AccountId,
) -> Result<Account, LedgerError> {
    scope
        .lock_account(account_id)
        .await?
        .filter(|a| actor.can_access(a.owner_id))
        .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
}

/// Reads an account the actor may see
async fn find_accessible(
    scope: &mut dyn LedgerScope,
    actor: Actor,
    account_id: AccountId,
) -> Result<Account, LedgerError> {
    scope
        .find_account(account_id)
        .await?
        .filter(|a| actor.can_access(a.owner_id))
        .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
}

/// Returns the earlier single-account movement recorded under `reference`
async fn find_replay(
    scope: &mut dyn LedgerScope,
    account: &Account,
    reference: &str,
    kind: TransactionType,
    amount: &Money,
) -> Result<Option<TransactionReceipt>, LedgerError> {
    match scope.find_by_reference(account.id, reference).await? {
        None => Ok(None),
        Some(original) if original.transaction_type == kind && original.amount == *amount => {
            tracing::debug!(account_id = %account.id, reference = %reference, "request replayed");
            Ok(Some(TransactionReceipt {
                transaction: original,
                replayed: true,
            }))
        }
        Some(_) => Err(LedgerError::DuplicateReference(reference.to_string())),
    }
}

fn log_movement(
    operation: &'static str,
    account_id: AccountId,
    result: &Result<TransactionReceipt, LedgerError>,
) {
    match result {
        Ok(receipt) if !receipt.replayed => tracing::info!(
            operation,
            account_id = %account_id,
            reference = %receipt.transaction.reference,
            amount = %receipt.transaction.amount,
            "movement committed"
        ),
        Ok(_) => {}
        Err(error) => warn_rejected(operation, error),
    }
}

fn log_transfer(operation: &'static str, result: &Result<TransferReceipt, LedgerError>) {
    match result {
        Ok(receipt) if !receipt.replayed => tracing::info!(
            operation,
            from_account = %receipt.debit.account_id,
            to_account = %receipt.credit.account_id,
            reference = %receipt.reference(),
            amount = %receipt.credit.amount,
            "transfer committed"
        ),
        Ok(_) => {}
        Err(error) => warn_rejected(operation, error),
    }
}

fn warn_rejected(operation: &'static str, error: &LedgerError) {
    if error.is_retryable() {
        tracing::error!(operation, error = %error, "ledger storage failure");
    } else {
        tracing::warn!(operation, kind = error.kind().code(), error = %error, "ledger operation rejected");
    }
}
