//! Request and response bodies
//!
//! Requests are validated with `validator` before they reach the ledger;
//! amounts travel as decimal strings alongside their currency code.

pub mod accounts;
pub mod loans;
pub mod payments;

use rust_decimal::Decimal;
use validator::ValidationError;

/// Rejects zero and negative amounts
pub(crate) fn positive(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_positive() && !amount.is_zero() {
        Ok(())
    } else {
        Err(ValidationError::new("amount_not_positive"))
    }
}

/// Rejects negative amounts
pub(crate) fn non_negative(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        Err(ValidationError::new("amount_negative"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_validators() {
        assert!(positive(&dec!(0.01)).is_ok());
        assert!(positive(&dec!(0)).is_err());
        assert!(positive(&dec!(-3)).is_err());
        assert!(non_negative(&dec!(0)).is_ok());
        assert!(non_negative(&dec!(-0.01)).is_err());
    }
}
