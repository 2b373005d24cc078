//! Atomicity Tests
//!
//! A storage failure part way through an operation must leave no partial
//! write behind: no lone transfer leg, no balance without its transaction,
//! no loan moved without its repayment.

use core_kernel::Currency;
use domain_ledger::{
    Actor, Destination, LedgerConfig, LedgerError, LedgerStore,
    LoanRepaymentRequest, LoanStatus, TransferRequest,
};
use rust_decimal_macros::dec;
use std::sync::Arc;
use test_utils::{
    assert_ledger_err, assert_money_eq, AccountBuilder, Fault, FaultyLedgerStore, LoanBuilder,
    TestLedger,
};

fn faulty(fault: Fault) -> TestLedger {
    TestLedger::wrapped(LedgerConfig::default(), move |store| {
        Arc::new(FaultyLedgerStore::new(
            Arc::new(store) as Arc<dyn LedgerStore>,
            fault,
        )) as Arc<dyn LedgerStore>
    })
}

/// Tests that a failed credit leg undoes the debit leg
#[tokio::test]
async fn test_failed_credit_leg_rolls_back_debit() {
    let ledger = faulty(Fault::TransactionInsert(2));
    let a = ledger.open(AccountBuilder::new().with_balance(dec!(1000))).await;
    let b = ledger.open(AccountBuilder::new()).await;
    let owner = Actor::Customer(a.owner_id);

    let result = ledger
        .ledger
        .transfer(
            owner,
            TransferRequest {
                from_account_id: a.id,
                to: Destination::Account(b.id),
                amount: dec!(400),
                description: "rent".to_string(),
                reference: None,
            },
        )
        .await;

    let error = result.unwrap_err();
    assert!(matches!(error, LedgerError::StorageUnavailable(_)));
    assert!(error.is_retryable());
    assert_money_eq(&ledger.balance(a.id).await, dec!(1000), Currency::USD);
    assert_money_eq(&ledger.balance(b.id).await, dec!(0), Currency::USD);
    assert_eq!(ledger.transactions_of(a.id).await.len(), 1);
    assert!(ledger.transactions_of(b.id).await.is_empty());
}

/// Tests that a failed loan save undoes the repayment debit
#[tokio::test]
async fn test_failed_loan_save_rolls_back_debit() {
    let ledger = faulty(Fault::LoanSave);
    let builder = AccountBuilder::new().with_balance(dec!(1000));
    let owner_id = builder.owner_id();
    let a = ledger.open(builder).await;
    let owner = Actor::Customer(owner_id);
    let loan = ledger
        .ledger
        .register_loan(owner, LoanBuilder::new(owner_id).build())
        .await
        .unwrap();

    let result = ledger
        .ledger
        .repay_loan(
            owner,
            LoanRepaymentRequest {
                loan_id: loan.id,
                account_id: a.id,
                amount: dec!(250),
            },
        )
        .await;

    assert_ledger_err!(result, LedgerError::StorageUnavailable(_));
    assert_money_eq(&ledger.balance(a.id).await, dec!(1000), Currency::USD);
    assert!(ledger.store.repayments().await.is_empty());

    let loan = ledger.ledger.get_loan(owner, loan.id).await.unwrap();
    assert_eq!(loan.status, LoanStatus::Active);
    assert_money_eq(&loan.remaining_amount, dec!(1000), Currency::USD);
}

/// Tests that a failed commit leaves the store as it was
#[tokio::test]
async fn test_failed_commit_discards_everything() {
    let ledger = faulty(Fault::Commit);

    let result = ledger
        .ledger
        .open_account(ledger.operator, AccountBuilder::new().with_balance(dec!(10)).build())
        .await;

    assert_ledger_err!(result, LedgerError::StorageUnavailable(_));
    assert!(ledger.store.accounts().await.is_empty());
    assert!(ledger.store.transactions().await.is_empty());
}
