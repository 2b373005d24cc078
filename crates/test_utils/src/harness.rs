//! In-memory Ledger Harness
//!
//! Wires a [`LedgerService`] to an [`InMemoryLedgerStore`] and a
//! [`TestClock`], and exposes the committed state for assertions.

use core_kernel::{AccountId, Currency, Money, UserId};
use domain_ledger::{
    Account, Actor, InMemoryLedgerStore, LedgerConfig, LedgerService, LedgerStore, Transaction,
};
use std::sync::Arc;

use crate::builders::AccountBuilder;
use crate::fixtures::TestClock;

/// A ledger backed by process memory
pub struct TestLedger {
    /// Committed state
    pub store: InMemoryLedgerStore,
    /// Clock driving limit windows and timestamps
    pub clock: Arc<TestClock>,
    /// Service under test
    pub ledger: Arc<LedgerService>,
    /// Back-office actor allowed to touch every account
    pub operator: Actor,
}

impl Default for TestLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLedger {
    /// Creates a ledger with the default configuration
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    /// Creates a ledger with `config`
    pub fn with_config(config: LedgerConfig) -> Self {
        Self::wrapped(config, |store| Arc::new(store) as Arc<dyn LedgerStore>)
    }

    /// Creates a ledger whose service talks to the store through `wrap`
    pub fn wrapped<F>(config: LedgerConfig, wrap: F) -> Self
    where
        F: FnOnce(InMemoryLedgerStore) -> Arc<dyn LedgerStore>,
    {
        let store = InMemoryLedgerStore::new();
        let clock = Arc::new(TestClock::default());
        let ledger = LedgerService::new(wrap(store.clone()), config).with_clock(clock.clone());
        Self {
            store,
            clock,
            ledger: Arc::new(ledger),
            operator: Actor::Operator(UserId::new()),
        }
    }

    /// Opens an account, panicking on failure
    pub async fn open(&self, builder: AccountBuilder) -> Account {
        self.ledger
            .open_account(self.operator, builder.build())
            .await
            .expect("account should open")
            .account
    }

    /// Committed balance of one account
    pub async fn balance(&self, account_id: AccountId) -> Money {
        self.store
            .accounts()
            .await
            .into_iter()
            .find(|a| a.id == account_id)
            .map(|a| a.balance)
            .expect("account should exist")
    }

    /// Sum of all committed balances in `currency`
    pub async fn total_balance(&self, currency: Currency) -> Money {
        let balances: Vec<Money> = self
            .store
            .accounts()
            .await
            .into_iter()
            .filter(|a| a.currency == currency)
            .map(|a| a.balance)
            .collect();
        Money::sum(&balances, currency).expect("balances should add up")
    }

    /// Committed transactions of one account, in insertion order
    pub async fn transactions_of(&self, account_id: AccountId) -> Vec<Transaction> {
        self.store
            .transactions()
            .await
            .into_iter()
            .filter(|t| t.account_id == account_id)
            .collect()
    }
}
