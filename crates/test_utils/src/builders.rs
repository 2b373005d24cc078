//! Test Data Builders
//!
//! Provides builder patterns for constructing ledger requests with sensible
//! defaults. Tests specify only the fields they care about.

use core_kernel::{Currency, UserId};
use domain_ledger::{BillPayee, OpenAccountRequest, RegisterLoanRequest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Builder for account opening requests
#[derive(Debug, Clone)]
pub struct AccountBuilder {
    owner_id: UserId,
    currency: Currency,
    daily_limit: Decimal,
    monthly_limit: Decimal,
    overdraft_limit: Decimal,
    initial_deposit: Option<Decimal>,
}

impl Default for AccountBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountBuilder {
    /// USD account, daily limit 1000, monthly limit 10000, no overdraft, empty
    pub fn new() -> Self {
        Self {
            owner_id: UserId::new(),
            currency: Currency::USD,
            daily_limit: dec!(1000),
            monthly_limit: dec!(10000),
            overdraft_limit: dec!(0),
            initial_deposit: None,
        }
    }

    /// Sets the owner
    pub fn owned_by(mut self, owner_id: UserId) -> Self {
        self.owner_id = owner_id;
        self
    }

    /// Sets the currency
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Sets the daily limit
    pub fn with_daily_limit(mut self, limit: Decimal) -> Self {
        self.daily_limit = limit;
        self
    }

    /// Sets the monthly limit
    pub fn with_monthly_limit(mut self, limit: Decimal) -> Self {
        self.monthly_limit = limit;
        self
    }

    /// Allows the balance to go down to `-overdraft`
    pub fn with_overdraft(mut self, overdraft: Decimal) -> Self {
        self.overdraft_limit = overdraft;
        self
    }

    /// Posts an opening deposit
    pub fn with_balance(mut self, amount: Decimal) -> Self {
        self.initial_deposit = Some(amount);
        self
    }

    /// Returns the owner the account will be opened for
    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Builds the request
    pub fn build(self) -> OpenAccountRequest {
        OpenAccountRequest {
            owner_id: self.owner_id,
            currency: self.currency,
            daily_limit: self.daily_limit,
            monthly_limit: self.monthly_limit,
            overdraft_limit: self.overdraft_limit,
            initial_deposit: self.initial_deposit,
        }
    }
}

/// Builder for loan registration requests
#[derive(Debug, Clone)]
pub struct LoanBuilder {
    owner_id: UserId,
    currency: Currency,
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
}

impl LoanBuilder {
    /// Interest-free USD loan of 1000 over 12 months
    pub fn new(owner_id: UserId) -> Self {
        Self {
            owner_id,
            currency: Currency::USD,
            principal: dec!(1000),
            annual_rate_percent: dec!(0),
            term_months: 12,
        }
    }

    /// Sets the principal
    pub fn with_principal(mut self, principal: Decimal) -> Self {
        self.principal = principal;
        self
    }

    /// Sets the annual interest rate in percent
    pub fn with_rate_percent(mut self, rate: Decimal) -> Self {
        self.annual_rate_percent = rate;
        self
    }

    /// Sets the term
    pub fn with_term_months(mut self, months: u32) -> Self {
        self.term_months = months;
        self
    }

    /// Sets the currency
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Builds the request
    pub fn build(self) -> RegisterLoanRequest {
        RegisterLoanRequest {
            owner_id: self.owner_id,
            currency: self.currency,
            principal: self.principal,
            annual_rate_percent: self.annual_rate_percent,
            term_months: self.term_months,
        }
    }
}

/// Builder for bill payees
#[derive(Debug, Clone)]
pub struct PayeeBuilder {
    name: String,
    account_number: String,
    category: String,
}

impl PayeeBuilder {
    /// A utilities payee paid into `account_number`
    pub fn new(account_number: impl Into<String>) -> Self {
        Self {
            name: "City Power & Water".to_string(),
            account_number: account_number.into(),
            category: "utilities".to_string(),
        }
    }

    /// Sets the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Builds the payee
    pub fn build(self) -> BillPayee {
        BillPayee::new(self.name, self.account_number, self.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_builder_defaults() {
        let request = AccountBuilder::new().build();
        assert_eq!(request.currency, Currency::USD);
        assert_eq!(request.daily_limit, dec!(1000));
        assert_eq!(request.overdraft_limit, dec!(0));
        assert!(request.initial_deposit.is_none());
    }

    #[test]
    fn test_account_builder_overrides() {
        let owner = UserId::new();
        let request = AccountBuilder::new()
            .owned_by(owner)
            .with_balance(dec!(250))
            .with_overdraft(dec!(100))
            .build();

        assert_eq!(request.owner_id, owner);
        assert_eq!(request.initial_deposit, Some(dec!(250)));
        assert_eq!(request.overdraft_limit, dec!(100));
    }

    #[test]
    fn test_loan_builder() {
        let owner = UserId::new();
        let request = LoanBuilder::new(owner).with_principal(dec!(5000)).with_term_months(24).build();
        assert_eq!(request.principal, dec!(5000));
        assert_eq!(request.term_months, 24);
    }
}
