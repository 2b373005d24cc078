//! Transfer Tests
//!
//! Debit/credit pairs between accounts: conservation, destination
//! resolution, replay of caller references and access rules.

use core_kernel::{AccountId, Currency, UserId};
use domain_ledger::{
    Actor, DepositRequest, Destination, LedgerError, TransactionType, TransferRequest,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use test_utils::{
    assert_conserved, assert_ledger_err, assert_money_eq, assert_transfer_pair, AccountBuilder,
    TestLedger,
};

fn transfer(from: AccountId, to: AccountId, amount: Decimal) -> TransferRequest {
    TransferRequest {
        from_account_id: from,
        to: Destination::Account(to),
        amount,
        description: "rent".to_string(),
        reference: None,
    }
}

mod conservation {
    use super::*;

    /// Tests that a transfer moves the amount and nothing else
    #[tokio::test]
    async fn test_transfer_moves_amount() {
        let ledger = TestLedger::new();
        let a = ledger.open(AccountBuilder::new().with_balance(dec!(1000))).await;
        let b = ledger.open(AccountBuilder::new()).await;
        let before = ledger.total_balance(Currency::USD).await;

        let receipt = ledger
            .ledger
            .transfer(Actor::Customer(a.owner_id), transfer(a.id, b.id, dec!(250.75)))
            .await
            .unwrap();

        assert_transfer_pair(&receipt);
        assert!(!receipt.replayed);
        assert!(receipt.reference().starts_with("TRF-"));
        assert_eq!(receipt.debit.transaction_type, TransactionType::Transfer);
        assert_money_eq(&ledger.balance(a.id).await, dec!(749.25), Currency::USD);
        assert_money_eq(&ledger.balance(b.id).await, dec!(250.75), Currency::USD);
        assert_conserved(&before, &ledger.total_balance(Currency::USD).await);
    }

    /// Tests the canonical limit scenario: 500 fits the daily limit, 1 more does not
    #[tokio::test]
    async fn test_daily_limit_scenario() {
        let ledger = TestLedger::new();
        let a = ledger
            .open(AccountBuilder::new().with_balance(dec!(1000)).with_daily_limit(dec!(500)))
            .await;
        let b = ledger.open(AccountBuilder::new()).await;
        let owner = Actor::Customer(a.owner_id);

        ledger.ledger.transfer(owner, transfer(a.id, b.id, dec!(500))).await.unwrap();
        let second = ledger.ledger.transfer(owner, transfer(a.id, b.id, dec!(1))).await;

        assert_ledger_err!(second, LedgerError::LimitExceeded { .. });
        assert_money_eq(&ledger.balance(a.id).await, dec!(500), Currency::USD);
        assert_money_eq(&ledger.balance(b.id).await, dec!(500), Currency::USD);
        assert_eq!(ledger.transactions_of(b.id).await.len(), 1);
    }

    /// Tests that an overdraft floor lets the balance go negative, but no further
    #[tokio::test]
    async fn test_overdraft_floor() {
        let ledger = TestLedger::new();
        let a = ledger
            .open(AccountBuilder::new().with_balance(dec!(100)).with_overdraft(dec!(50)))
            .await;
        let b = ledger.open(AccountBuilder::new()).await;
        let owner = Actor::Customer(a.owner_id);

        let too_much = ledger.ledger.transfer(owner, transfer(a.id, b.id, dec!(150.01))).await;
        assert_ledger_err!(too_much, LedgerError::InsufficientFunds { .. });

        ledger.ledger.transfer(owner, transfer(a.id, b.id, dec!(150))).await.unwrap();
        assert_money_eq(&ledger.balance(a.id).await, dec!(-50), Currency::USD);
    }
}

mod destination {
    use super::*;

    /// Tests transfers addressed by account number
    #[tokio::test]
    async fn test_transfer_by_account_number() {
        let ledger = TestLedger::new();
        let a = ledger.open(AccountBuilder::new().with_balance(dec!(300))).await;
        let b = ledger.open(AccountBuilder::new()).await;

        let receipt = ledger
            .ledger
            .transfer(
                Actor::Customer(a.owner_id),
                TransferRequest {
                    from_account_id: a.id,
                    to: Destination::AccountNumber(format!(" {} ", b.account_number)),
                    amount: dec!(120),
                    description: "gift".to_string(),
                    reference: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(receipt.credit.account_id, b.id);
        assert_money_eq(&ledger.balance(b.id).await, dec!(120), Currency::USD);
    }

    /// Tests that an unknown destination leaves the source untouched
    #[tokio::test]
    async fn test_unknown_destination() {
        let ledger = TestLedger::new();
        let a = ledger.open(AccountBuilder::new().with_balance(dec!(300))).await;

        let result = ledger
            .ledger
            .transfer(Actor::Customer(a.owner_id), transfer(a.id, AccountId::new(), dec!(10)))
            .await;

        assert_ledger_err!(result, LedgerError::AccountNotFound(_));
        assert_money_eq(&ledger.balance(a.id).await, dec!(300), Currency::USD);
    }

    /// Tests that suspended destinations are not resolvable
    #[tokio::test]
    async fn test_suspended_destination_not_found() {
        let ledger = TestLedger::new();
        let a = ledger.open(AccountBuilder::new().with_balance(dec!(300))).await;
        let b = ledger.open(AccountBuilder::new()).await;
        ledger.ledger.suspend_account(ledger.operator, b.id).await.unwrap();

        let result = ledger
            .ledger
            .transfer(Actor::Customer(a.owner_id), transfer(a.id, b.id, dec!(10)))
            .await;

        assert_ledger_err!(result, LedgerError::AccountNotFound(_));
    }

    /// Tests that a suspended source cannot send money
    #[tokio::test]
    async fn test_suspended_source_rejected() {
        let ledger = TestLedger::new();
        let a = ledger.open(AccountBuilder::new().with_balance(dec!(300))).await;
        let b = ledger.open(AccountBuilder::new()).await;
        ledger.ledger.suspend_account(ledger.operator, a.id).await.unwrap();

        let result = ledger.ledger.transfer(ledger.operator, transfer(a.id, b.id, dec!(10))).await;

        assert_ledger_err!(result, LedgerError::AccountNotActive { .. });
    }

    #[tokio::test]
    async fn test_same_account_rejected() {
        let ledger = TestLedger::new();
        let a = ledger.open(AccountBuilder::new().with_balance(dec!(300))).await;

        let result = ledger
            .ledger
            .transfer(Actor::Customer(a.owner_id), transfer(a.id, a.id, dec!(10)))
            .await;

        assert_ledger_err!(result, LedgerError::SameAccountTransfer);
        assert!(ledger.transactions_of(a.id).await.len() == 1);
    }

    #[tokio::test]
    async fn test_currency_mismatch() {
        let ledger = TestLedger::new();
        let a = ledger.open(AccountBuilder::new().with_balance(dec!(300))).await;
        let b = ledger.open(AccountBuilder::new().with_currency(Currency::EUR)).await;

        let result = ledger
            .ledger
            .transfer(Actor::Customer(a.owner_id), transfer(a.id, b.id, dec!(10)))
            .await;

        assert_ledger_err!(result, LedgerError::CurrencyMismatch { .. });
    }

    /// Tests amount validation against the source currency
    #[tokio::test]
    async fn test_invalid_amounts() {
        let ledger = TestLedger::new();
        let a = ledger.open(AccountBuilder::new().with_balance(dec!(300))).await;
        let b = ledger.open(AccountBuilder::new()).await;
        let owner = Actor::Customer(a.owner_id);

        for amount in [dec!(0), dec!(-5), dec!(0.001)] {
            let result = ledger.ledger.transfer(owner, transfer(a.id, b.id, amount)).await;
            assert_ledger_err!(result, LedgerError::InvalidAmount(_));
        }
    }
}

mod access {
    use super::*;

    /// Tests that customers cannot move money out of accounts they do not own
    #[tokio::test]
    async fn test_stranger_sees_not_found() {
        let ledger = TestLedger::new();
        let a = ledger.open(AccountBuilder::new().with_balance(dec!(300))).await;
        let b = ledger.open(AccountBuilder::new()).await;

        let result = ledger
            .ledger
            .transfer(Actor::Customer(UserId::new()), transfer(a.id, b.id, dec!(10)))
            .await;

        assert_ledger_err!(result, LedgerError::AccountNotFound(_));
        assert_money_eq(&ledger.balance(a.id).await, dec!(300), Currency::USD);
    }

    /// Tests that anyone may pay into an account they do not own
    #[tokio::test]
    async fn test_destination_need_not_be_owned() {
        let ledger = TestLedger::new();
        let a = ledger.open(AccountBuilder::new().with_balance(dec!(300))).await;
        let b = ledger.open(AccountBuilder::new()).await;
        assert_ne!(a.owner_id, b.owner_id);

        let result = ledger
            .ledger
            .transfer(Actor::Customer(a.owner_id), transfer(a.id, b.id, dec!(10)))
            .await;

        assert!(result.is_ok());
    }
}

mod replay {
    use super::*;

    fn with_reference(mut request: TransferRequest, reference: &str) -> TransferRequest {
        request.reference = Some(reference.to_string());
        request
    }

    /// Tests that repeating a transfer with its reference returns the original legs
    #[tokio::test]
    async fn test_replay_returns_original() {
        let ledger = TestLedger::new();
        let a = ledger.open(AccountBuilder::new().with_balance(dec!(300))).await;
        let b = ledger.open(AccountBuilder::new()).await;
        let owner = Actor::Customer(a.owner_id);
        let request = with_reference(transfer(a.id, b.id, dec!(40)), "INV-2024-001");

        let first = ledger.ledger.transfer(owner, request.clone()).await.unwrap();
        let second = ledger.ledger.transfer(owner, request).await.unwrap();

        assert!(second.replayed);
        assert_eq!(first.debit.id, second.debit.id);
        assert_eq!(first.credit.id, second.credit.id);
        assert_money_eq(&ledger.balance(a.id).await, dec!(260), Currency::USD);
        assert_eq!(ledger.transactions_of(b.id).await.len(), 1);
    }

    /// Tests that reusing a reference for a different amount is rejected
    #[tokio::test]
    async fn test_reused_reference_with_different_amount() {
        let ledger = TestLedger::new();
        let a = ledger.open(AccountBuilder::new().with_balance(dec!(300))).await;
        let b = ledger.open(AccountBuilder::new()).await;
        let owner = Actor::Customer(a.owner_id);

        ledger
            .ledger
            .transfer(owner, with_reference(transfer(a.id, b.id, dec!(40)), "INV-7"))
            .await
            .unwrap();
        let result = ledger
            .ledger
            .transfer(owner, with_reference(transfer(a.id, b.id, dec!(41)), "INV-7"))
            .await;

        assert_ledger_err!(result, LedgerError::DuplicateReference(_));
        assert_money_eq(&ledger.balance(a.id).await, dec!(260), Currency::USD);
    }

    /// Tests that a reference already used by a deposit cannot name a transfer
    #[tokio::test]
    async fn test_reference_used_by_other_kind() {
        let ledger = TestLedger::new();
        let a = ledger.open(AccountBuilder::new().with_balance(dec!(300))).await;
        let b = ledger.open(AccountBuilder::new()).await;
        let owner = Actor::Customer(a.owner_id);

        ledger
            .ledger
            .deposit(
                owner,
                DepositRequest {
                    account_id: a.id,
                    amount: dec!(40),
                    description: "cash".to_string(),
                    reference: Some("REF-1".to_string()),
                },
            )
            .await
            .unwrap();
        let result = ledger
            .ledger
            .transfer(owner, with_reference(transfer(a.id, b.id, dec!(40)), "REF-1"))
            .await;

        assert_ledger_err!(result, LedgerError::DuplicateReference(_));
    }

    /// Tests that two senders may use one reference towards the same account
    #[tokio::test]
    async fn test_senders_share_reference() {
        let ledger = TestLedger::new();
        let a = ledger.open(AccountBuilder::new().with_balance(dec!(300))).await;
        let b = ledger.open(AccountBuilder::new().with_balance(dec!(300))).await;
        let c = ledger.open(AccountBuilder::new()).await;

        let from_a = ledger
            .ledger
            .transfer(
                Actor::Customer(a.owner_id),
                with_reference(transfer(a.id, c.id, dec!(30)), "X"),
            )
            .await
            .unwrap();
        let from_b = ledger
            .ledger
            .transfer(
                Actor::Customer(b.owner_id),
                with_reference(transfer(b.id, c.id, dec!(30)), "X"),
            )
            .await
            .unwrap();

        assert!(!from_b.replayed);
        assert_ne!(from_a.credit.id, from_b.credit.id);
        assert_eq!(from_b.credit.counterparty_account_id, Some(b.id));
        assert_money_eq(&ledger.balance(b.id).await, dec!(270), Currency::USD);
        assert_money_eq(&ledger.balance(c.id).await, dec!(60), Currency::USD);
    }

    /// Tests that a received reference stays free for the receiver's own use
    #[tokio::test]
    async fn test_received_reference_free_for_receiver() {
        let ledger = TestLedger::new();
        let a = ledger.open(AccountBuilder::new().with_balance(dec!(300))).await;
        let c = ledger.open(AccountBuilder::new()).await;

        ledger
            .ledger
            .transfer(
                Actor::Customer(a.owner_id),
                with_reference(transfer(a.id, c.id, dec!(30)), "X"),
            )
            .await
            .unwrap();
        let deposit = ledger
            .ledger
            .deposit(
                Actor::Customer(c.owner_id),
                DepositRequest {
                    account_id: c.id,
                    amount: dec!(5),
                    description: "cash".to_string(),
                    reference: Some("X".to_string()),
                },
            )
            .await
            .unwrap();

        assert!(!deposit.replayed);
        assert_money_eq(&ledger.balance(c.id).await, dec!(35), Currency::USD);
    }

    /// Tests that a blank reference is treated as absent
    #[tokio::test]
    async fn test_blank_reference_generates_one() {
        let ledger = TestLedger::new();
        let a = ledger.open(AccountBuilder::new().with_balance(dec!(300))).await;
        let b = ledger.open(AccountBuilder::new()).await;
        let owner = Actor::Customer(a.owner_id);

        let first = ledger
            .ledger
            .transfer(owner, with_reference(transfer(a.id, b.id, dec!(5)), "   "))
            .await
            .unwrap();
        let second = ledger
            .ledger
            .transfer(owner, with_reference(transfer(a.id, b.id, dec!(5)), ""))
            .await
            .unwrap();

        assert!(first.reference().starts_with("TRF-"));
        assert_ne!(first.reference(), second.reference());
        assert!(!second.replayed);
        assert_money_eq(&ledger.balance(b.id).await, dec!(10), Currency::USD);
    }
}
