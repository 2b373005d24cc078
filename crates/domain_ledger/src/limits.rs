//! Limit policy evaluation
//!
//! Spending allowance is derived from history, never stored: the completed
//! limited debits since local midnight (daily) and since the first of the
//! month (monthly) are summed and subtracted from the account's limits.
//! Callers must hold the account lock when evaluating so that the check and
//! the debit it guards cannot interleave with another debit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{CalendarWindows, Money, Timezone};

use crate::account::Account;
use crate::error::LedgerError;
use crate::ports::LedgerScope;
use crate::transaction::TransactionType;

/// Limit window that was exceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitWindow {
    Daily,
    Monthly,
}

impl fmt::Display for LimitWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitWindow::Daily => f.write_str("Daily"),
            LimitWindow::Monthly => f.write_str("Monthly"),
        }
    }
}

/// Remaining spending allowance of an account
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpendingAllowance {
    pub daily_used: Money,
    pub daily_remaining: Money,
    pub monthly_used: Money,
    pub monthly_remaining: Money,
}

impl SpendingAllowance {
    /// Builds the allowance from limits and usage
    pub fn from_usage(
        daily_limit: &Money,
        daily_used: Money,
        monthly_limit: &Money,
        monthly_used: Money,
    ) -> Result<Self, LedgerError> {
        Ok(Self {
            daily_remaining: remaining(daily_limit, &daily_used)?,
            daily_used,
            monthly_remaining: remaining(monthly_limit, &monthly_used)?,
            monthly_used,
        })
    }

    /// Fails with `LimitExceeded` if `amount` does not fit in either window
    ///
    /// The daily window is checked first.
    pub fn ensure_allows(&self, amount: &Money) -> Result<(), LedgerError> {
        for (window, remaining) in [
            (LimitWindow::Daily, self.daily_remaining),
            (LimitWindow::Monthly, self.monthly_remaining),
        ] {
            if *amount > remaining {
                return Err(LedgerError::LimitExceeded {
                    window,
                    requested: *amount,
                    remaining,
                });
            }
        }
        Ok(())
    }
}

/// `max(0, limit - used)`
pub fn remaining(limit: &Money, used: &Money) -> Result<Money, LedgerError> {
    Ok(limit.checked_sub(used)?.floor_at_zero())
}

/// Computes the allowance of `account` at `now` in `timezone`
pub async fn evaluate(
    scope: &mut dyn LedgerScope,
    account: &Account,
    now: DateTime<Utc>,
    timezone: Timezone,
) -> Result<SpendingAllowance, LedgerError> {
    let windows = CalendarWindows::containing(now, timezone);
    let kinds = TransactionType::LIMITED;

    let daily_used = scope
        .sum_debits_since(account.id, &kinds, windows.day_start)
        .await?;
    let monthly_used = scope
        .sum_debits_since(account.id, &kinds, windows.month_start)
        .await?;

    SpendingAllowance::from_usage(
        &account.daily_limit,
        Money::new(daily_used, account.currency),
        &account.monthly_limit,
        Money::new(monthly_used, account.currency),
    )
}
