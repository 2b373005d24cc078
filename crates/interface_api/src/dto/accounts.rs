//! Account DTOs

use chrono::{DateTime, Utc};
use core_kernel::Currency;
use domain_ledger::{Account, SpendingAllowance, Transaction, TransactionReceipt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{non_negative, positive};

#[derive(Debug, Deserialize, Validate)]
pub struct OpenAccountBody {
    /// Defaults to the caller
    pub owner_id: Option<Uuid>,
    pub currency: Currency,
    #[validate(custom(function = "non_negative"))]
    pub daily_limit: Decimal,
    #[validate(custom(function = "non_negative"))]
    pub monthly_limit: Decimal,
    #[serde(default)]
    #[validate(custom(function = "non_negative"))]
    pub overdraft_limit: Decimal,
    #[validate(custom(function = "positive"))]
    pub initial_deposit: Option<Decimal>,
}

/// Body of a deposit or withdrawal
#[derive(Debug, Deserialize, Validate)]
pub struct MovementBody {
    #[validate(custom(function = "positive"))]
    pub amount: Decimal,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub description: String,
    #[validate(length(min = 1, max = 64))]
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatementQuery {
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub account_number: String,
    pub currency: Currency,
    pub balance: Decimal,
    pub status: String,
    pub daily_limit: Decimal,
    pub monthly_limit: Decimal,
    pub overdraft_floor: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.into(),
            owner_id: account.owner_id.into(),
            account_number: account.account_number,
            currency: account.currency,
            balance: account.balance.amount(),
            status: account.status.to_string(),
            daily_limit: account.daily_limit.amount(),
            monthly_limit: account.monthly_limit.amount(),
            overdraft_floor: account.overdraft_floor.amount(),
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub account_id: Uuid,
    pub transaction_type: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: String,
    pub reference: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_account_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(txn: Transaction) -> Self {
        Self {
            id: txn.id.into(),
            account_id: txn.account_id.into(),
            transaction_type: txn.transaction_type.as_str().to_string(),
            amount: txn.amount.amount(),
            currency: txn.amount.currency(),
            status: txn.status.as_str().to_string(),
            reference: txn.reference,
            description: txn.description,
            category: txn.category,
            counterparty_account_id: txn.counterparty_account_id.map(Uuid::from),
            document_ref: txn.document_ref,
            created_at: txn.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MovementResponse {
    pub transaction: TransactionResponse,
    pub replayed: bool,
}

impl From<TransactionReceipt> for MovementResponse {
    fn from(receipt: TransactionReceipt) -> Self {
        Self {
            transaction: receipt.transaction.into(),
            replayed: receipt.replayed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OpenAccountResponse {
    pub account: AccountResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_deposit: Option<TransactionResponse>,
}

#[derive(Debug, Serialize)]
pub struct AllowanceResponse {
    pub currency: Currency,
    pub daily_used: Decimal,
    pub remaining_daily: Decimal,
    pub monthly_used: Decimal,
    pub remaining_monthly: Decimal,
}

impl From<SpendingAllowance> for AllowanceResponse {
    fn from(allowance: SpendingAllowance) -> Self {
        Self {
            currency: allowance.daily_remaining.currency(),
            daily_used: allowance.daily_used.amount(),
            remaining_daily: allowance.daily_remaining.amount(),
            monthly_used: allowance.monthly_used.amount(),
            remaining_monthly: allowance.monthly_remaining.amount(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryBody {
    #[validate(length(max = 64))]
    pub category: Option<String>,
}
