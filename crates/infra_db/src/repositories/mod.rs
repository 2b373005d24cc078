//! Repository implementations for domain ports
//!
//! Repositories encapsulate SQL queries and map between database rows and
//! domain types. Queries are built at runtime and rows decoded through
//! `sqlx::FromRow`, so the crate builds without a live database.

pub mod ledger;

pub use ledger::{PgLedgerScope, PgLedgerStore};
