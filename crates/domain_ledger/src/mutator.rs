//! Balance mutator
//!
//! The only code path that changes a stored balance. One call locks one
//! account, checks it may move by `delta`, writes the new balance and
//! appends the matching completed transaction, all inside the caller's
//! atomic scope. Policy (limits, verification, ownership) is decided by the
//! callers before they get here.

use chrono::{DateTime, Utc};

use core_kernel::{AccountId, Money};

use crate::account::AccountStatus;
use crate::error::LedgerError;
use crate::ports::LedgerScope;
use crate::transaction::{Transaction, TransactionType};

/// Statuses that accept debits and transfer credits
pub const ACTIVE_ONLY: &[AccountStatus] = &[AccountStatus::Active];

/// Statuses that accept plain deposits
pub const ACCEPTS_DEPOSITS: &[AccountStatus] = &[AccountStatus::Active, AccountStatus::Suspended];

/// One balance movement
#[derive(Debug, Clone)]
pub struct Mutation<'a> {
    pub account_id: AccountId,
    /// Signed change (positive credits, negative debits)
    pub delta: Money,
    pub kind: TransactionType,
    pub reference: &'a str,
    pub description: &'a str,
    pub counterparty: Option<AccountId>,
    pub category: Option<&'a str>,
    pub document_ref: Option<&'a str>,
    /// Account statuses allowed for this movement
    pub permitted: &'a [AccountStatus],
}

impl<'a> Mutation<'a> {
    /// A movement permitted only on active accounts
    pub fn new(
        account_id: AccountId,
        delta: Money,
        kind: TransactionType,
        reference: &'a str,
        description: &'a str,
    ) -> Self {
        Self {
            account_id,
            delta,
            kind,
            reference,
            description,
            counterparty: None,
            category: None,
            document_ref: None,
            permitted: ACTIVE_ONLY,
        }
    }

    pub fn with_counterparty(mut self, account_id: AccountId) -> Self {
        self.counterparty = Some(account_id);
        self
    }

    pub fn with_category(mut self, category: Option<&'a str>) -> Self {
        self.category = category;
        self
    }

    pub fn with_document(mut self, document_ref: Option<&'a str>) -> Self {
        self.document_ref = document_ref;
        self
    }

    pub fn permitting(mut self, statuses: &'a [AccountStatus]) -> Self {
        self.permitted = statuses;
        self
    }

    /// The receiving leg of a transfer, which echoes the payer's reference
    fn is_counterpart_credit(&self) -> bool {
        self.delta.is_positive() && self.counterparty.is_some()
    }
}

/// Applies one balance movement inside `scope`
///
/// # Errors
///
/// * `AccountNotFound` - the account does not exist
/// * `AccountNotActive` - the account status is not in `permitted`
/// * `CurrencyMismatch` - `delta` is not in the account currency
/// * `InsufficientFunds` - a debit would cross the overdraft floor
/// * `DuplicateReference` - the account already owns a transaction with this reference
pub async fn apply(
    scope: &mut dyn LedgerScope,
    mutation: Mutation<'_>,
    now: DateTime<Utc>,
) -> Result<Transaction, LedgerError> {
    if mutation.delta.is_zero() {
        return Err(LedgerError::InvalidAmount("movement amount cannot be zero".into()));
    }

    let mut account = scope
        .lock_account(mutation.account_id)
        .await?
        .ok_or_else(|| LedgerError::AccountNotFound(mutation.account_id.to_string()))?;

    if !mutation.permitted.contains(&account.status) {
        return Err(LedgerError::AccountNotActive {
            account: account.id.to_string(),
            status: account.status.to_string(),
        });
    }

    if mutation.delta.currency() != account.currency {
        return Err(LedgerError::CurrencyMismatch {
            expected: account.currency.to_string(),
            actual: mutation.delta.currency().to_string(),
        });
    }

    let new_balance = account.balance.checked_add(&mutation.delta)?;
    if mutation.delta.is_negative() && new_balance < account.overdraft_floor {
        return Err(LedgerError::InsufficientFunds {
            account: account.id.to_string(),
            requested: mutation.delta.abs(),
            available: account.available_funds()?,
        });
    }

    if !mutation.is_counterpart_credit()
        && scope
            .find_by_reference(account.id, mutation.reference)
            .await?
            .is_some()
    {
        return Err(LedgerError::DuplicateReference(mutation.reference.to_string()));
    }

    let mut transaction = Transaction::completed(
        account.id,
        mutation.kind,
        mutation.delta,
        mutation.reference,
        mutation.description,
        now,
    );
    transaction.counterparty_account_id = mutation.counterparty;
    transaction.category = mutation.category.map(str::to_string);
    transaction.document_ref = mutation.document_ref.map(str::to_string);

    account.balance = new_balance;
    account.updated_at = now;
    scope.save_account(&account).await?;
    scope.insert_transaction(&transaction).await?;

    tracing::debug!(
        account_id = %account.id,
        transaction_id = %transaction.id,
        reference = %transaction.reference,
        kind = %transaction.transaction_type,
        "balance mutated"
    );

    Ok(transaction)
}
