//! Infrastructure Database Layer
//!
//! PostgreSQL storage for the ledger, implemented with SQLx.
//!
//! # Architecture
//!
//! The crate implements the [`domain_ledger::LedgerStore`] port. Every
//! ledger operation runs inside one database transaction, and the rows it
//! mutates are locked with `SELECT ... FOR UPDATE` so concurrent operations
//! on the same account serialize instead of racing.
//!
//! # Schema
//!
//! Migrations under `migrations/` are embedded and applied with
//! [`run_migrations`]. Amounts are `NUMERIC(19, 4)`; ledger transactions are
//! protected by a trigger that rejects deletes and any update other than a
//! category change.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PgLedgerStore};
//!
//! let config = DatabaseConfig::new("postgres://localhost/ledger");
//! let pool = create_pool(&config).await?;
//! run_migrations(&pool).await?;
//! let store = PgLedgerStore::new(pool).with_lock_timeout(config.lock_timeout);
//! ```

pub mod error;
pub mod pool;
pub mod repositories;

pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use repositories::PgLedgerStore;
