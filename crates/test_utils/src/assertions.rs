//! Custom Test Assertions
//!
//! Provides assertion helpers for ledger invariants that give more
//! meaningful failure messages than standard assertions.

use core_kernel::{Money, Currency};
use domain_ledger::{Account, LedgerError, Transaction, TransactionStatus, TransferReceipt};
use rust_decimal::Decimal;

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that a Money value equals `expected` in the given currency
pub fn assert_money_eq(actual: &Money, expected: Decimal, currency: Currency) {
    assert_eq!(actual.currency(), currency, "Currency mismatch for {}", actual);
    assert_eq!(
        actual.amount(),
        expected,
        "Expected {} {}, got {}",
        currency.symbol(),
        expected,
        actual
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(money.is_zero(), "Expected zero money, got {}", money);
}

/// Asserts the shape of a transfer pair
///
/// Both legs are completed, share one reference, point at each other and
/// sum to zero.
pub fn assert_transfer_pair(receipt: &TransferReceipt) {
    let TransferReceipt { debit, credit, .. } = receipt;

    assert_eq!(debit.reference, credit.reference, "Transfer legs must share a reference");
    assert_eq!(debit.status, TransactionStatus::Completed);
    assert_eq!(credit.status, TransactionStatus::Completed);
    assert!(debit.is_debit(), "First leg must be a debit, got {}", debit.amount);
    assert!(!credit.is_debit(), "Second leg must be a credit, got {}", credit.amount);
    assert_eq!(debit.counterparty_account_id, Some(credit.account_id));
    assert_eq!(credit.counterparty_account_id, Some(debit.account_id));

    let net = debit
        .amount
        .checked_add(&credit.amount)
        .expect("legs must share a currency");
    assert!(net.is_zero(), "Transfer legs must sum to zero, got {}", net);
}

/// Asserts that a total was conserved
pub fn assert_conserved(before: &Money, after: &Money) {
    assert_eq!(
        before, after,
        "Money was created or destroyed: before={}, after={}",
        before, after
    );
}

/// Asserts every account balance equals the sum of its completed transactions
pub fn assert_balances_match_history(accounts: &[Account], transactions: &[Transaction]) {
    for account in accounts {
        let amounts: Vec<Money> = transactions
            .iter()
            .filter(|t| t.account_id == account.id && t.status == TransactionStatus::Completed)
            .map(|t| t.amount)
            .collect();
        let history = Money::sum(&amounts, account.currency).expect("history should add up");
        assert_eq!(
            account.balance, history,
            "Balance of {} does not match its transaction history",
            account.id
        );
    }
}

/// Asserts that no committed balance is below its overdraft floor
pub fn assert_within_floor(accounts: &[Account]) {
    for account in accounts {
        assert!(
            account.balance >= account.overdraft_floor,
            "Account {} is below its floor: balance={}, floor={}",
            account.id,
            account.balance,
            account.overdraft_floor
        );
    }
}

/// Asserts that a ledger result failed with the given error variant
#[macro_export]
macro_rules! assert_ledger_err {
    ($result:expr, $pattern:pat) => {
        match $result {
            Err(ref error) if matches!(error, $pattern) => {}
            Err(error) => panic!("Unexpected ledger error: {:?}", error),
            Ok(value) => panic!("Expected a ledger error, got {:?}", value),
        }
    };
}

/// Returns the error of a failed ledger result
pub fn expect_ledger_err<T: std::fmt::Debug>(result: Result<T, LedgerError>) -> LedgerError {
    match result {
        Ok(value) => panic!("Expected a ledger error, got {:?}", value),
        Err(error) => error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_assert_money_approx_eq_passes() {
        let a = Money::new(dec!(100.00), Currency::USD);
        let b = Money::new(dec!(100.01), Currency::USD);
        assert_money_approx_eq(&a, &b, dec!(0.01));
    }

    #[test]
    #[should_panic(expected = "created or destroyed")]
    fn test_assert_conserved_detects_drift() {
        let before = Money::new(dec!(100), Currency::USD);
        let after = Money::new(dec!(100.01), Currency::USD);
        assert_conserved(&before, &after);
    }
}
