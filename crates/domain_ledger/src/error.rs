//! Ledger domain errors
//!
//! Every failure is detected before or inside the atomic scope; when one of
//! these is returned the scope has been rolled back and no balance, transaction
//! or loan change is visible.

use core_kernel::{Money, MoneyError, PortError};
use serde::Serialize;
use thiserror::Error;

use crate::limits::LimitWindow;

/// Errors that can occur in the ledger domain
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Amount is zero, negative, over-precise or not a number
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Account does not exist, or is not visible to the caller
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Account exists but its status forbids the operation
    #[error("Account {account} is {status}")]
    AccountNotActive { account: String, status: String },

    /// Debit would take the balance below the overdraft floor
    #[error("Insufficient funds in account {account}: requested {requested}, available {available}")]
    InsufficientFunds {
        account: String,
        requested: Money,
        available: Money,
    },

    /// Debit exceeds what is left of the daily or monthly allowance
    #[error("{window} limit exceeded: requested {requested}, remaining {remaining}")]
    LimitExceeded {
        window: LimitWindow,
        requested: Money,
        remaining: Money,
    },

    /// Loan does not exist, or is not visible to the caller
    #[error("Loan not found: {0}")]
    LoanNotFound(String),

    /// Loan has already been repaid in full
    #[error("Loan {0} is already paid")]
    LoanAlreadyPaid(String),

    /// Loan was rejected or withdrawn and accepts no repayments
    #[error("Loan {loan} is {status}")]
    LoanNotActive { loan: String, status: String },

    /// Payment at or above the threshold needs a supporting document
    #[error("Payments of {threshold} or more require a supporting document")]
    VerificationRequired { threshold: Money },

    /// Reference already used on this account for a different request
    #[error("Reference {0} has already been used for a different request")]
    DuplicateReference(String),

    /// Source and destination resolve to the same account
    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,

    /// Amount or counterparty is in another currency
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    /// Payee does not exist
    #[error("Payee not found: {0}")]
    PayeeNotFound(String),

    /// Transaction does not exist, or is not visible to the caller
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Account still holds money and cannot be closed
    #[error("Account {account} still has a balance of {balance}")]
    AccountNotEmpty { account: String, balance: Money },

    /// Lifecycle transition not allowed from the current state
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// Store failed or is unreachable; the caller should retry
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] PortError),
}

/// Stable, machine-readable classification of a [`LedgerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidAmount,
    AccountNotFound,
    AccountNotActive,
    InsufficientFunds,
    LimitExceeded,
    LoanNotFound,
    LoanAlreadyPaid,
    LoanNotActive,
    VerificationRequired,
    DuplicateReference,
    SameAccountTransfer,
    CurrencyMismatch,
    PayeeNotFound,
    TransactionNotFound,
    AccountNotEmpty,
    InvalidStatusTransition,
    StorageUnavailable,
}

impl ErrorKind {
    /// Snake-case code used in API responses
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidAmount => "invalid_amount",
            ErrorKind::AccountNotFound => "account_not_found",
            ErrorKind::AccountNotActive => "account_not_active",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::LimitExceeded => "limit_exceeded",
            ErrorKind::LoanNotFound => "loan_not_found",
            ErrorKind::LoanAlreadyPaid => "loan_already_paid",
            ErrorKind::LoanNotActive => "loan_not_active",
            ErrorKind::VerificationRequired => "verification_required",
            ErrorKind::DuplicateReference => "duplicate_reference",
            ErrorKind::SameAccountTransfer => "same_account_transfer",
            ErrorKind::CurrencyMismatch => "currency_mismatch",
            ErrorKind::PayeeNotFound => "payee_not_found",
            ErrorKind::TransactionNotFound => "transaction_not_found",
            ErrorKind::AccountNotEmpty => "account_not_empty",
            ErrorKind::InvalidStatusTransition => "invalid_status_transition",
            ErrorKind::StorageUnavailable => "storage_unavailable",
        }
    }
}

impl LedgerError {
    /// Returns the classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            LedgerError::AccountNotFound(_) => ErrorKind::AccountNotFound,
            LedgerError::AccountNotActive { .. } => ErrorKind::AccountNotActive,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::LimitExceeded { .. } => ErrorKind::LimitExceeded,
            LedgerError::LoanNotFound(_) => ErrorKind::LoanNotFound,
            LedgerError::LoanAlreadyPaid(_) => ErrorKind::LoanAlreadyPaid,
            LedgerError::LoanNotActive { .. } => ErrorKind::LoanNotActive,
            LedgerError::VerificationRequired { .. } => ErrorKind::VerificationRequired,
            LedgerError::DuplicateReference(_) => ErrorKind::DuplicateReference,
            LedgerError::SameAccountTransfer => ErrorKind::SameAccountTransfer,
            LedgerError::CurrencyMismatch { .. } => ErrorKind::CurrencyMismatch,
            LedgerError::PayeeNotFound(_) => ErrorKind::PayeeNotFound,
            LedgerError::TransactionNotFound(_) => ErrorKind::TransactionNotFound,
            LedgerError::AccountNotEmpty { .. } => ErrorKind::AccountNotEmpty,
            LedgerError::InvalidStatusTransition { .. } => ErrorKind::InvalidStatusTransition,
            LedgerError::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
        }
    }

    /// True when the request may succeed unchanged on retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::StorageUnavailable(_))
    }

    pub(crate) fn status_transition(from: impl ToString, to: impl ToString) -> Self {
        LedgerError::InvalidStatusTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

impl From<PortError> for LedgerError {
    fn from(error: PortError) -> Self {
        match error {
            // Unique (account, reference) index tripped by a concurrent retry
            PortError::Conflict { message } => LedgerError::DuplicateReference(message),
            other => LedgerError::StorageUnavailable(other),
        }
    }
}

impl From<MoneyError> for LedgerError {
    fn from(error: MoneyError) -> Self {
        match error {
            MoneyError::CurrencyMismatch(expected, actual) => {
                LedgerError::CurrencyMismatch { expected, actual }
            }
            other => LedgerError::InvalidAmount(other.to_string()),
        }
    }
}
