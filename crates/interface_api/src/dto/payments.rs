//! Transfer, bill payment and payee DTOs

use domain_ledger::{BillPayee, TransferReceipt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::accounts::TransactionResponse;
use super::positive;

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "one_destination"))]
pub struct TransferBody {
    pub from_account_id: Uuid,
    pub to_account_id: Option<Uuid>,
    #[validate(length(min = 1, max = 34))]
    pub to_account_number: Option<String>,
    #[validate(custom(function = "positive"))]
    pub amount: Decimal,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub description: String,
    #[validate(length(min = 1, max = 64))]
    pub reference: Option<String>,
}

fn one_destination(body: &TransferBody) -> Result<(), ValidationError> {
    match (&body.to_account_id, &body.to_account_number) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        _ => Err(ValidationError::new("exactly_one_destination")),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct BillPaymentBody {
    pub payee_id: Uuid,
    pub account_id: Uuid,
    #[validate(custom(function = "positive"))]
    pub amount: Decimal,
    #[validate(length(min = 1, max = 64))]
    pub reference: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub document_ref: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub reference: String,
    pub debit: TransactionResponse,
    pub credit: TransactionResponse,
    pub replayed: bool,
}

impl From<TransferReceipt> for TransferResponse {
    fn from(receipt: TransferReceipt) -> Self {
        Self {
            reference: receipt.reference().to_string(),
            debit: receipt.debit.into(),
            credit: receipt.credit.into(),
            replayed: receipt.replayed,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayeeBody {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 34))]
    pub account_number: String,
    #[validate(length(min = 1, max = 64))]
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct PayeeResponse {
    pub id: Uuid,
    pub name: String,
    pub account_number: String,
    pub category: String,
}

impl From<BillPayee> for PayeeResponse {
    fn from(payee: BillPayee) -> Self {
        Self {
            id: payee.id.into(),
            name: payee.name,
            account_number: payee.account_number,
            category: payee.category,
        }
    }
}
