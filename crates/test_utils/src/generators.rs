//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating ledger inputs that respect
//! domain invariants.

use core_kernel::{Currency, Money};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for generating valid Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::JPY),
        Just(Currency::CHF),
        Just(Currency::INR),
    ]
}

/// Strategy for generating valid positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000i64
}

/// Strategy for generating valid USD Money values
pub fn usd_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(|amount| Money::from_minor(amount, Currency::USD))
}

/// Strategy for cent-precise positive USD amounts up to `max_units`
pub fn usd_amount_strategy(max_units: i64) -> impl Strategy<Value = Decimal> {
    (1i64..=max_units * 100).prop_map(|cents| Decimal::new(cents, 2))
}

/// One step of a random transfer sequence between `accounts` accounts
#[derive(Debug, Clone)]
pub struct TransferStep {
    pub from: usize,
    pub to: usize,
    pub amount: Decimal,
}

/// Strategy for a transfer between two account indexes below `accounts`
///
/// `from` and `to` may coincide so that same-account rejection is exercised.
pub fn transfer_step_strategy(accounts: usize, max_units: i64) -> impl Strategy<Value = TransferStep> {
    (0..accounts, 0..accounts, usd_amount_strategy(max_units))
        .prop_map(|(from, to, amount)| TransferStep { from, to, amount })
}

/// Strategy for a sequence of transfer steps
pub fn transfer_sequence_strategy(
    accounts: usize,
    max_units: i64,
    max_len: usize,
) -> impl Strategy<Value = Vec<TransferStep>> {
    prop::collection::vec(transfer_step_strategy(accounts, max_units), 1..max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_usd_amounts_are_cent_precise(amount in usd_amount_strategy(500)) {
            prop_assert!(amount > Decimal::ZERO);
            prop_assert!(amount.scale() <= 2);
        }

        #[test]
        fn test_steps_stay_in_range(step in transfer_step_strategy(4, 100)) {
            prop_assert!(step.from < 4);
            prop_assert!(step.to < 4);
        }
    }
}
