//! Core Kernel - Foundational types shared by every ledger crate
//!
//! This crate provides the fundamental building blocks used across all modules:
//! - Money types with precise decimal arithmetic
//! - Calendar windows for local-time spending limits
//! - Strongly-typed identifiers
//! - Port error and health-check contracts implemented by storage adapters

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use money::{Money, Currency, MoneyError, Rate};
pub use temporal::{Timezone, CalendarWindows};
pub use identifiers::{
    AccountId, TransactionId, PayeeId, LoanId, RepaymentId, UserId,
};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
pub use error::CoreError;
