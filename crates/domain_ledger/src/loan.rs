//! Loans and their repayment state machine
//!
//! ```text
//!   ACTIVE ──(remaining reaches zero)──▶ PAID
//!     │
//!     ├──(before any repayment)──▶ REJECTED
//!     └──(before any repayment)──▶ WITHDRAWN
//! ```
//!
//! `remaining_amount` starts at the total repayable and never increases.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{AccountId, Currency, LoanId, Money, Rate, RepaymentId, TransactionId, UserId};

use crate::error::LedgerError;

/// Status of a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Active,
    Paid,
    Rejected,
    Withdrawn,
}

impl LoanStatus {
    /// Returns the stored code of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "ACTIVE",
            LoanStatus::Paid => "PAID",
            LoanStatus::Rejected => "REJECTED",
            LoanStatus::Withdrawn => "WITHDRAWN",
        }
    }

    /// Returns true for states a loan never leaves
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoanStatus::Active)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loan owed by a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub owner_id: UserId,
    /// Amount lent
    pub principal: Money,
    /// Annual simple interest rate
    pub interest_rate: Rate,
    /// Term in months
    pub term_months: u32,
    /// Principal plus interest over the term
    pub total_repayable: Money,
    /// Amount still owed; never increases
    pub remaining_amount: Money,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// Registers a new active loan
    ///
    /// The total repayable is `principal * (1 + rate * term / 12)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if the principal is not positive, the term is
    /// zero, or the rate is negative.
    pub fn new(
        owner_id: UserId,
        principal: Money,
        interest_rate: Rate,
        term_months: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        if !principal.is_positive() {
            return Err(LedgerError::InvalidAmount("principal must be greater than zero".into()));
        }
        if term_months == 0 {
            return Err(LedgerError::InvalidAmount("term must be at least one month".into()));
        }
        if interest_rate.as_decimal().is_sign_negative() {
            return Err(LedgerError::InvalidAmount("interest rate cannot be negative".into()));
        }

        let years = Decimal::from(term_months) / Decimal::from(12);
        let interest = interest_rate.apply(&principal)?.multiply(years)?;
        let total_repayable = principal.checked_add(&interest)?;

        Ok(Self {
            id: LoanId::new_v7(),
            owner_id,
            principal,
            interest_rate,
            term_months,
            total_repayable,
            remaining_amount: total_repayable,
            status: LoanStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Currency the loan is denominated in
    pub fn currency(&self) -> Currency {
        self.principal.currency()
    }

    /// Returns true once any repayment has reduced the balance owed
    pub fn has_repayments(&self) -> bool {
        self.remaining_amount < self.total_repayable
    }

    /// Checks the loan still accepts repayments
    pub fn ensure_repayable(&self) -> Result<(), LedgerError> {
        match self.status {
            LoanStatus::Active => Ok(()),
            LoanStatus::Paid => Err(LedgerError::LoanAlreadyPaid(self.id.to_string())),
            other => Err(LedgerError::LoanNotActive {
                loan: self.id.to_string(),
                status: other.to_string(),
            }),
        }
    }

    /// Applies a completed repayment and returns the remaining amount
    ///
    /// The remaining amount is floored at zero; the loan becomes `PAID` when
    /// nothing is left to repay.
    pub fn apply_repayment(
        &mut self,
        amount: &Money,
        now: DateTime<Utc>,
    ) -> Result<Money, LedgerError> {
        self.ensure_repayable()?;
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!("{} must be greater than zero", amount)));
        }

        let remaining = self.remaining_amount.checked_sub(amount)?;
        if !remaining.is_positive() {
            self.status = LoanStatus::Paid;
        }
        self.remaining_amount = remaining.floor_at_zero();
        self.updated_at = now;
        Ok(self.remaining_amount)
    }

    /// Marks the loan rejected
    pub fn reject(&mut self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        self.close_before_disbursement(LoanStatus::Rejected, now)
    }

    /// Marks the loan withdrawn by the customer
    pub fn withdraw(&mut self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        self.close_before_disbursement(LoanStatus::Withdrawn, now)
    }

    fn close_before_disbursement(
        &mut self,
        target: LoanStatus,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        if self.status != LoanStatus::Active || self.has_repayments() {
            return Err(LedgerError::status_transition(self.status, target));
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }
}

/// Record linking a loan to the transaction that repaid part of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repayment {
    pub id: RepaymentId,
    pub loan_id: LoanId,
    pub account_id: AccountId,
    pub transaction_id: TransactionId,
    pub amount: Money,
    /// Loan balance after this repayment
    pub remaining_after: Money,
    pub created_at: DateTime<Utc>,
}

/// Result of a loan repayment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentReceipt {
    pub repayment: Repayment,
    pub transaction: crate::transaction::Transaction,
    pub loan: Loan,
}
