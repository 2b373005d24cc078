//! Customer accounts
//!
//! An account holds a stored balance that is only ever changed by the
//! balance mutator, together with the spending limits and overdraft floor
//! that govern how far it may be debited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use core_kernel::{AccountId, Currency, Money, UserId};

use crate::error::LedgerError;

/// Lifecycle status of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// Open for all movements
    Active,
    /// Frozen for debits
    Suspended,
    /// Terminal; balance is immutable
    Closed,
}

impl AccountStatus {
    /// Returns the stored code of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Suspended => "SUSPENDED",
            AccountStatus::Closed => "CLOSED",
        }
    }

    /// Returns true if the account may move to `target`
    pub fn can_transition_to(&self, target: AccountStatus) -> bool {
        matches!(
            (self, target),
            (AccountStatus::Active, AccountStatus::Suspended)
                | (AccountStatus::Suspended, AccountStatus::Active)
                | (AccountStatus::Active, AccountStatus::Closed)
                | (AccountStatus::Suspended, AccountStatus::Closed)
        )
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,
    /// Owning customer
    pub owner_id: UserId,
    /// Human-facing account number, used to address transfers
    pub account_number: String,
    /// Currency of the balance and limits
    pub currency: Currency,
    /// Current stored balance
    pub balance: Money,
    /// Lifecycle status
    pub status: AccountStatus,
    /// Maximum total of limited debits per local calendar day
    pub daily_limit: Money,
    /// Maximum total of limited debits per local calendar month
    pub monthly_limit: Money,
    /// Lowest balance the account may reach (zero or negative)
    pub overdraft_floor: Money,
    /// When the account was opened
    pub created_at: DateTime<Utc>,
    /// Last balance or status change
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new active account with a zero balance and no overdraft
    ///
    /// # Arguments
    ///
    /// * `owner_id` - Owning customer
    /// * `currency` - Currency of the account
    /// * `daily_limit` - Daily spending limit
    /// * `monthly_limit` - Monthly spending limit
    pub fn open(
        owner_id: UserId,
        currency: Currency,
        daily_limit: Money,
        monthly_limit: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AccountId::new_v7(),
            owner_id,
            account_number: generate_account_number(),
            currency,
            balance: Money::zero(currency),
            status: AccountStatus::Active,
            daily_limit,
            monthly_limit,
            overdraft_floor: Money::zero(currency),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the overdraft floor (a positive input is negated)
    pub fn with_overdraft_floor(mut self, floor: Money) -> Self {
        self.overdraft_floor = -floor.abs();
        self
    }

    /// Sets the account number
    pub fn with_account_number(mut self, account_number: impl Into<String>) -> Self {
        self.account_number = account_number.into();
        self
    }

    /// Returns true if the account accepts all movements
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Funds that can be debited before the overdraft floor is reached
    pub fn available_funds(&self) -> Result<Money, LedgerError> {
        Ok(self.balance.checked_sub(&self.overdraft_floor)?.floor_at_zero())
    }

    /// Moves the account to a new lifecycle status
    ///
    /// # Errors
    ///
    /// * `InvalidStatusTransition` if the move is not allowed
    /// * `AccountNotEmpty` when closing an account with a non-zero balance
    pub fn transition_to(
        &mut self,
        target: AccountStatus,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        if !self.status.can_transition_to(target) {
            return Err(LedgerError::status_transition(self.status, target));
        }
        if target == AccountStatus::Closed && !self.balance.is_zero() {
            return Err(LedgerError::AccountNotEmpty {
                account: self.id.to_string(),
                balance: self.balance,
            });
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }
}

/// Generates a 12-digit account number
pub fn generate_account_number() -> String {
    let value = Uuid::new_v4().as_u128() % 1_000_000_000_000;
    format!("{:012}", value)
}
