//! Ledger transactions
//!
//! A transaction is the immutable record of one balance movement on one
//! account. The sign of the amount carries the direction: positive amounts
//! credit the account, negative amounts debit it. A transfer is recorded as
//! a pair of transactions sharing one reference whose amounts sum to zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{AccountId, Money, TransactionId};

/// Kind of ledger movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    /// Either leg of an account-to-account transfer
    Transfer,
    /// Debit leg (and payee credit leg) of a bill payment
    BillPayment,
    LoanRepayment,
}

impl TransactionType {
    /// Debit kinds that count against daily and monthly limits
    pub const LIMITED: [TransactionType; 3] = [
        TransactionType::Withdrawal,
        TransactionType::Transfer,
        TransactionType::BillPayment,
    ];

    /// Returns the stored code of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdrawal => "WITHDRAWAL",
            TransactionType::Transfer => "TRANSFER",
            TransactionType::BillPayment => "BILL_PAYMENT",
            TransactionType::LoanRepayment => "LOAN_REPAYMENT",
        }
    }

    /// Returns true if debits of this kind consume spending allowance
    pub fn is_limited(&self) -> bool {
        Self::LIMITED.contains(self)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement status of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    /// Returns the stored code of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ledger movement against one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,
    /// Account whose balance this movement changed
    pub account_id: AccountId,
    /// Kind of movement
    pub transaction_type: TransactionType,
    /// Signed amount (positive = credit, negative = debit)
    pub amount: Money,
    /// Settlement status
    pub status: TransactionStatus,
    /// Reference, unique per account and shared by both legs of a transfer
    pub reference: String,
    /// Free-text description
    pub description: String,
    /// Spending category; the only field editable after completion
    pub category: Option<String>,
    /// Other side of a transfer or bill payment
    pub counterparty_account_id: Option<AccountId>,
    /// Supporting document identifier for verified payments
    pub document_ref: Option<String>,
    /// When the movement was recorded
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Creates a completed transaction
    pub fn completed(
        account_id: AccountId,
        transaction_type: TransactionType,
        amount: Money,
        reference: impl Into<String>,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransactionId::new_v7(),
            account_id,
            transaction_type,
            amount,
            status: TransactionStatus::Completed,
            reference: reference.into(),
            description: description.into(),
            category: None,
            counterparty_account_id: None,
            document_ref: None,
            created_at,
        }
    }

    /// Sets the counterparty account
    pub fn with_counterparty(mut self, account_id: AccountId) -> Self {
        self.counterparty_account_id = Some(account_id);
        self
    }

    /// Sets the supporting document
    pub fn with_document(mut self, document_ref: impl Into<String>) -> Self {
        self.document_ref = Some(document_ref.into());
        self
    }

    /// Returns true if this movement reduced the balance
    pub fn is_debit(&self) -> bool {
        self.amount.is_negative()
    }

    /// Returns true if this is the receiving leg of a transfer
    ///
    /// Receiving legs echo the payer's reference and never own it, so many
    /// payers may use the same reference towards one account.
    pub fn is_counterpart_credit(&self) -> bool {
        self.amount.is_positive() && self.counterparty_account_id.is_some()
    }

    /// Returns true if this movement consumes spending allowance
    pub fn counts_toward_limits(&self) -> bool {
        self.status == TransactionStatus::Completed
            && self.is_debit()
            && self.transaction_type.is_limited()
    }
}

/// The two legs of a transfer or bill payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Debit against the source account
    pub debit: Transaction,
    /// Credit against the destination account
    pub credit: Transaction,
    /// True when an earlier request with the same reference was returned
    pub replayed: bool,
}

impl TransferReceipt {
    /// Shared reference of both legs
    pub fn reference(&self) -> &str {
        &self.debit.reference
    }
}

/// Result of a single-account movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// The recorded transaction
    pub transaction: Transaction,
    /// True when an earlier request with the same reference was returned
    pub replayed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_limited_debits() {
        let account = AccountId::new();
        let now = Utc::now();
        let debit = |kind| {
            Transaction::completed(account, kind, Money::new(dec!(-10), Currency::USD), "R", "", now)
        };

        assert!(debit(TransactionType::Withdrawal).counts_toward_limits());
        assert!(debit(TransactionType::Transfer).counts_toward_limits());
        assert!(debit(TransactionType::BillPayment).counts_toward_limits());
        assert!(!debit(TransactionType::LoanRepayment).counts_toward_limits());
    }

    #[test]
    fn test_credits_never_count() {
        let credit = Transaction::completed(
            AccountId::new(),
            TransactionType::Transfer,
            Money::new(dec!(10), Currency::USD),
            "TRF-1",
            "incoming",
            Utc::now(),
        );
        assert!(!credit.is_debit());
        assert!(!credit.counts_toward_limits());
    }

    #[test]
    fn test_type_codes_serialize_as_stored() {
        let json = serde_json::to_string(&TransactionType::LoanRepayment).unwrap();
        assert_eq!(json, "\"LOAN_REPAYMENT\"");
        assert_eq!(TransactionType::BillPayment.to_string(), "BILL_PAYMENT");
    }
}
