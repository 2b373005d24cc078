//! Loan DTOs

use chrono::{DateTime, Utc};
use core_kernel::Currency;
use domain_ledger::{Loan, RepaymentReceipt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::accounts::TransactionResponse;
use super::{non_negative, positive};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterLoanBody {
    pub owner_id: Uuid,
    pub currency: Currency,
    #[validate(custom(function = "positive"))]
    pub principal: Decimal,
    #[validate(custom(function = "non_negative"))]
    pub annual_rate_percent: Decimal,
    #[validate(range(min = 1, max = 600))]
    pub term_months: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RepayBody {
    pub account_id: Uuid,
    #[validate(custom(function = "positive"))]
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct LoanResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub currency: Currency,
    pub principal: Decimal,
    pub annual_rate_percent: Decimal,
    pub term_months: u32,
    pub total_repayable: Decimal,
    pub remaining_amount: Decimal,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        Self {
            id: loan.id.into(),
            owner_id: loan.owner_id.into(),
            currency: loan.currency(),
            principal: loan.principal.amount(),
            annual_rate_percent: loan.interest_rate.as_percentage(),
            term_months: loan.term_months,
            total_repayable: loan.total_repayable.amount(),
            remaining_amount: loan.remaining_amount.amount(),
            status: loan.status.to_string(),
            updated_at: loan.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RepaymentResponse {
    pub repayment_id: Uuid,
    pub remaining_after: Decimal,
    pub loan: LoanResponse,
    pub transaction: TransactionResponse,
}

impl From<RepaymentReceipt> for RepaymentResponse {
    fn from(receipt: RepaymentReceipt) -> Self {
        Self {
            repayment_id: receipt.repayment.id.into(),
            remaining_after: receipt.repayment.remaining_after.amount(),
            loan: receipt.loan.into(),
            transaction: receipt.transaction.into(),
        }
    }
}
