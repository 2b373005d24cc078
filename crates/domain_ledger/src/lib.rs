//! Ledger Domain - Balance Mutation Engine
//!
//! This crate moves money between customer accounts while keeping every
//! stored balance consistent with an append-only transaction history.
//!
//! # Guarantees
//!
//! - **Conservation**: a transfer debits and credits the same amount under
//!   one reference, so the total across accounts never changes
//! - **Atomicity**: every operation runs in one storage scope that commits
//!   all of its writes or none
//! - **Race safety**: balance, limit and replay checks read locked rows, and
//!   transfers lock both accounts in ascending id order
//!
//! # Components
//!
//! - [`reference`]: transaction reference generation
//! - [`limits`]: daily and monthly spending allowance
//! - [`mutator`]: the single balance-changing primitive
//! - [`transfer`]: debit/credit pairs
//! - [`repayment`]: loan repayment against the loan state machine
//! - [`bill`]: verification threshold gate for bill payments
//! - [`service`]: the [`LedgerService`] facade used by callers
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_ledger::{LedgerService, LedgerConfig, InMemoryLedgerStore, Actor, TransferRequest};
//!
//! let ledger = LedgerService::new(Arc::new(InMemoryLedgerStore::new()), LedgerConfig::default());
//! let receipt = ledger.transfer(Actor::Customer(owner), TransferRequest {
//!     from_account_id: a,
//!     to: Destination::Account(b),
//!     amount: dec!(500),
//!     description: "rent".into(),
//!     reference: None,
//! }).await?;
//! assert_eq!(receipt.debit.reference, receipt.credit.reference);
//! ```

pub mod account;
pub mod bill;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod limits;
pub mod loan;
pub mod memory;
pub mod mutator;
pub mod payee;
pub mod ports;
pub mod reference;
pub mod repayment;
pub mod service;
pub mod transaction;
pub mod transfer;

pub use account::{Account, AccountStatus};
pub use clock::{Clock, SystemClock};
pub use commands::{
    Actor, BillPaymentRequest, DepositRequest, Destination, LoanRepaymentRequest,
    OpenAccountRequest, RegisterLoanRequest, TransferRequest, WithdrawalRequest,
};
pub use config::LedgerConfig;
pub use error::{ErrorKind, LedgerError};
pub use limits::{LimitWindow, SpendingAllowance};
pub use loan::{Loan, LoanStatus, Repayment, RepaymentReceipt};
pub use memory::InMemoryLedgerStore;
pub use payee::BillPayee;
pub use ports::{LedgerScope, LedgerStore};
pub use service::{LedgerService, OpenedAccount};
pub use transaction::{
    Transaction, TransactionReceipt, TransactionStatus, TransactionType, TransferReceipt,
};
