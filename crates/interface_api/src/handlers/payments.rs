//! Transfer, bill payment and payee handlers

use axum::{extract::State, http::StatusCode, Extension, Json};
use core_kernel::{AccountId, PayeeId};
use domain_ledger::{Actor, BillPayee, BillPaymentRequest, Destination, TransferRequest};
use validator::Validate;

use crate::auth::require_operator;
use crate::dto::payments::*;
use crate::{error::ApiError, AppState};

/// Moves money between two accounts
pub async fn transfer(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<TransferBody>,
) -> Result<Json<TransferResponse>, ApiError> {
    body.validate()?;
    let to = match (body.to_account_id, body.to_account_number) {
        (Some(id), _) => Destination::Account(AccountId::from(id)),
        (None, Some(number)) => Destination::AccountNumber(number),
        (None, None) => return Err(ApiError::BadRequest("destination is required".to_string())),
    };

    let receipt = state
        .ledger
        .transfer(
            actor,
            TransferRequest {
                from_account_id: AccountId::from(body.from_account_id),
                to,
                amount: body.amount,
                description: body.description,
                reference: body.reference,
            },
        )
        .await?;
    Ok(Json(receipt.into()))
}

/// Pays a registered payee
pub async fn pay_bill(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<BillPaymentBody>,
) -> Result<Json<TransferResponse>, ApiError> {
    body.validate()?;
    let receipt = state
        .ledger
        .pay_bill(
            actor,
            BillPaymentRequest {
                payee_id: PayeeId::from(body.payee_id),
                account_id: AccountId::from(body.account_id),
                amount: body.amount,
                reference: body.reference,
                document_ref: body.document_ref,
            },
        )
        .await?;
    Ok(Json(receipt.into()))
}

/// Registers a bill payee (operators only)
pub async fn register_payee(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<RegisterPayeeBody>,
) -> Result<(StatusCode, Json<PayeeResponse>), ApiError> {
    require_operator(&actor)?;
    body.validate()?;
    let payee = state
        .ledger
        .register_payee(BillPayee::new(body.name, body.account_number, body.category))
        .await?;
    Ok((StatusCode::CREATED, Json(payee.into())))
}
