//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! ledger test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data and a controllable clock
//! - `builders`: Builder patterns for accounts, loans and payees
//! - `harness`: An in-memory ledger wired up for tests
//! - `faults`: Store wrapper that injects storage failures
//! - `database`: PostgreSQL container management
//! - `assertions`: Custom assertion helpers for ledger invariants
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod harness;
pub mod faults;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use harness::*;
pub use faults::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
