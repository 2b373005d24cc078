//! Typed inputs to ledger operations
//!
//! Amounts arrive as plain decimals and are turned into [`Money`] in the
//! currency of the account they apply to, once that account is known.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, Currency, LoanId, Money, PayeeId, UserId};

use crate::error::LedgerError;

/// Who is calling the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Actor {
    /// A customer, restricted to their own accounts and loans
    Customer(UserId),
    /// Back-office staff acting on any customer's behalf
    Operator(UserId),
}

impl Actor {
    pub fn user_id(&self) -> UserId {
        match self {
            Actor::Customer(id) | Actor::Operator(id) => *id,
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, Actor::Operator(_))
    }

    /// Returns true if the actor may act on records owned by `owner`
    pub fn can_access(&self, owner: UserId) -> bool {
        match self {
            Actor::Customer(id) => *id == owner,
            Actor::Operator(_) => true,
        }
    }
}

/// Where a transfer is credited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Account(AccountId),
    AccountNumber(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositRequest {
    pub account_id: AccountId,
    pub amount: Decimal,
    pub description: String,
    /// Idempotency reference; generated when absent
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub account_id: AccountId,
    pub amount: Decimal,
    pub description: String,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from_account_id: AccountId,
    pub to: Destination,
    pub amount: Decimal,
    pub description: String,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillPaymentRequest {
    pub payee_id: PayeeId,
    pub account_id: AccountId,
    pub amount: Decimal,
    /// Invoice number or other caller key; generated when absent
    pub reference: Option<String>,
    /// Supporting document, required at or above the verification threshold
    pub document_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRepaymentRequest {
    pub loan_id: LoanId,
    pub account_id: AccountId,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAccountRequest {
    pub owner_id: UserId,
    pub currency: Currency,
    pub daily_limit: Decimal,
    pub monthly_limit: Decimal,
    /// How far below zero the balance may go; zero for ordinary accounts
    #[serde(default)]
    pub overdraft_limit: Decimal,
    #[serde(default)]
    pub initial_deposit: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterLoanRequest {
    pub owner_id: UserId,
    pub currency: Currency,
    pub principal: Decimal,
    /// Annual simple interest in percent
    pub annual_rate_percent: Decimal,
    pub term_months: u32,
}

/// Converts a caller amount into a strictly positive [`Money`]
pub fn positive_amount(amount: Decimal, currency: Currency) -> Result<Money, LedgerError> {
    Ok(Money::try_positive(amount, currency)?)
}

/// Converts a caller amount into a non-negative [`Money`]
pub fn non_negative_amount(amount: Decimal, currency: Currency) -> Result<Money, LedgerError> {
    let money = Money::try_new(amount, currency)?;
    if money.is_negative() {
        return Err(LedgerError::InvalidAmount(format!("{} cannot be negative", amount)));
    }
    Ok(money)
}
