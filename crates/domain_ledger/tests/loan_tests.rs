//! Loan Repayment Tests

use core_kernel::{AccountId, Currency, LoanId, UserId};
use domain_ledger::{
    Actor, Loan, LedgerError, LoanRepaymentRequest, LoanStatus, TransactionType,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use test_utils::{
    assert_ledger_err, assert_money_eq, AccountBuilder, LoanBuilder, TestLedger,
};

struct Borrower {
    ledger: TestLedger,
    owner: Actor,
    account: AccountId,
    loan: Loan,
}

async fn borrower(balance: Decimal, principal: Decimal) -> Borrower {
    let ledger = TestLedger::new();
    let builder = AccountBuilder::new().with_balance(balance);
    let owner_id = builder.owner_id();
    let account = ledger.open(builder).await.id;
    let owner = Actor::Customer(owner_id);
    let loan = ledger
        .ledger
        .register_loan(owner, LoanBuilder::new(owner_id).with_principal(principal).build())
        .await
        .unwrap();
    Borrower {
        ledger,
        owner,
        account,
        loan,
    }
}

fn repayment(loan_id: LoanId, account_id: AccountId, amount: Decimal) -> LoanRepaymentRequest {
    LoanRepaymentRequest {
        loan_id,
        account_id,
        amount,
    }
}

mod registration {
    use super::*;

    /// Tests simple annual interest over the term
    #[tokio::test]
    async fn test_total_repayable_includes_interest() {
        let ledger = TestLedger::new();
        let owner_id = UserId::new();

        let loan = ledger
            .ledger
            .register_loan(
                ledger.operator,
                LoanBuilder::new(owner_id)
                    .with_principal(dec!(1000))
                    .with_rate_percent(dec!(10))
                    .with_term_months(18)
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(loan.status, LoanStatus::Active);
        assert_money_eq(&loan.total_repayable, dec!(1150), Currency::USD);
        assert_eq!(loan.remaining_amount, loan.total_repayable);
    }

    #[tokio::test]
    async fn test_invalid_terms_rejected() {
        let ledger = TestLedger::new();
        let owner_id = UserId::new();

        let zero_term = ledger
            .ledger
            .register_loan(ledger.operator, LoanBuilder::new(owner_id).with_term_months(0).build())
            .await;
        assert_ledger_err!(zero_term, LedgerError::InvalidAmount(_));

        let no_principal = ledger
            .ledger
            .register_loan(ledger.operator, LoanBuilder::new(owner_id).with_principal(dec!(0)).build())
            .await;
        assert_ledger_err!(no_principal, LedgerError::InvalidAmount(_));
    }
}

mod repaying {
    use super::*;

    /// Tests that a partial repayment debits the account and lowers the loan
    #[tokio::test]
    async fn test_partial_repayment() {
        let b = borrower(dec!(2000), dec!(1000)).await;

        let receipt = b
            .ledger
            .ledger
            .repay_loan(b.owner, repayment(b.loan.id, b.account, dec!(400)))
            .await
            .unwrap();

        assert_eq!(receipt.loan.status, LoanStatus::Active);
        assert_money_eq(&receipt.repayment.remaining_after, dec!(600), Currency::USD);
        assert_eq!(receipt.transaction.transaction_type, TransactionType::LoanRepayment);
        assert!(receipt.transaction.reference.starts_with("LRP-"));
        assert_money_eq(&receipt.transaction.amount, dec!(-400), Currency::USD);
        assert_eq!(receipt.repayment.transaction_id, receipt.transaction.id);
        assert_money_eq(&b.ledger.balance(b.account).await, dec!(1600), Currency::USD);
    }

    /// Tests that paying off the remainder marks the loan paid and closes it to repayments
    #[tokio::test]
    async fn test_full_repayment_then_already_paid() {
        let b = borrower(dec!(2000), dec!(1000)).await;
        let service = &b.ledger.ledger;

        service
            .repay_loan(b.owner, repayment(b.loan.id, b.account, dec!(600)))
            .await
            .unwrap();
        let receipt = service
            .repay_loan(b.owner, repayment(b.loan.id, b.account, dec!(400)))
            .await
            .unwrap();
        assert_eq!(receipt.loan.status, LoanStatus::Paid);
        assert!(receipt.loan.remaining_amount.is_zero());

        let again = service
            .repay_loan(b.owner, repayment(b.loan.id, b.account, dec!(1)))
            .await;
        assert_ledger_err!(again, LedgerError::LoanAlreadyPaid(_));
        assert_money_eq(&b.ledger.balance(b.account).await, dec!(1000), Currency::USD);
        assert_eq!(b.ledger.store.repayments().await.len(), 2);
    }

    /// Tests that an overpayment is debited in full and the loan floors at zero
    #[tokio::test]
    async fn test_overpayment_floors_at_zero() {
        let b = borrower(dec!(2000), dec!(1000)).await;

        let receipt = b
            .ledger
            .ledger
            .repay_loan(b.owner, repayment(b.loan.id, b.account, dec!(1200)))
            .await
            .unwrap();

        assert_eq!(receipt.loan.status, LoanStatus::Paid);
        assert!(receipt.repayment.remaining_after.is_zero());
        assert_money_eq(&b.ledger.balance(b.account).await, dec!(800), Currency::USD);
    }

    /// Tests that a repayment the account cannot cover changes nothing
    #[tokio::test]
    async fn test_insufficient_funds_leaves_loan_untouched() {
        let b = borrower(dec!(100), dec!(1000)).await;

        let result = b
            .ledger
            .ledger
            .repay_loan(b.owner, repayment(b.loan.id, b.account, dec!(100.01)))
            .await;

        assert_ledger_err!(result, LedgerError::InsufficientFunds { .. });
        let loan = b.ledger.ledger.get_loan(b.owner, b.loan.id).await.unwrap();
        assert_money_eq(&loan.remaining_amount, dec!(1000), Currency::USD);
    }

    /// Tests that only the borrower's own accounts can repay
    #[tokio::test]
    async fn test_other_owners_account_not_found() {
        let b = borrower(dec!(500), dec!(1000)).await;
        let other = b.ledger.open(AccountBuilder::new().with_balance(dec!(500))).await;

        let result = b
            .ledger
            .ledger
            .repay_loan(b.ledger.operator, repayment(b.loan.id, other.id, dec!(50)))
            .await;

        assert_ledger_err!(result, LedgerError::AccountNotFound(_));
    }

    #[tokio::test]
    async fn test_unknown_loan() {
        let b = borrower(dec!(500), dec!(1000)).await;

        let result = b
            .ledger
            .ledger
            .repay_loan(b.owner, repayment(LoanId::new(), b.account, dec!(50)))
            .await;

        assert_ledger_err!(result, LedgerError::LoanNotFound(_));
    }
}

mod closing {
    use super::*;

    /// Tests that rejected and withdrawn loans refuse repayments
    #[tokio::test]
    async fn test_closed_loans_not_repayable() {
        let b = borrower(dec!(500), dec!(1000)).await;
        let service = &b.ledger.ledger;

        let rejected = service.reject_loan(b.ledger.operator, b.loan.id).await.unwrap();
        assert_eq!(rejected.status, LoanStatus::Rejected);

        let result = service
            .repay_loan(b.owner, repayment(b.loan.id, b.account, dec!(50)))
            .await;
        assert_ledger_err!(result, LedgerError::LoanNotActive { .. });

        let withdraw = service.withdraw_loan(b.owner, b.loan.id).await;
        assert_ledger_err!(withdraw, LedgerError::InvalidStatusTransition { .. });
    }

    /// Tests that a loan with repayments can no longer be withdrawn
    #[tokio::test]
    async fn test_withdraw_after_repayment_rejected() {
        let b = borrower(dec!(500), dec!(1000)).await;
        let service = &b.ledger.ledger;

        service
            .repay_loan(b.owner, repayment(b.loan.id, b.account, dec!(50)))
            .await
            .unwrap();
        let result = service.withdraw_loan(b.owner, b.loan.id).await;

        assert_ledger_err!(result, LedgerError::InvalidStatusTransition { .. });
    }

    #[tokio::test]
    async fn test_customer_withdraws_own_loan() {
        let b = borrower(dec!(500), dec!(1000)).await;

        let loan = b.ledger.ledger.withdraw_loan(b.owner, b.loan.id).await.unwrap();

        assert_eq!(loan.status, LoanStatus::Withdrawn);
    }
}
