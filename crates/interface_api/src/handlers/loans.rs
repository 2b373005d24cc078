//! Loan handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use core_kernel::{AccountId, LoanId, UserId};
use domain_ledger::{Actor, LoanRepaymentRequest, RegisterLoanRequest};
use uuid::Uuid;
use validator::Validate;

use crate::auth::require_operator;
use crate::dto::loans::*;
use crate::{error::ApiError, AppState};

/// Registers a loan (operators only)
pub async fn register_loan(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<RegisterLoanBody>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    require_operator(&actor)?;
    body.validate()?;
    let loan = state
        .ledger
        .register_loan(
            actor,
            RegisterLoanRequest {
                owner_id: UserId::from(body.owner_id),
                currency: body.currency,
                principal: body.principal,
                annual_rate_percent: body.annual_rate_percent,
                term_months: body.term_months,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(loan.into())))
}

/// Gets a loan by ID
pub async fn get_loan(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan = state.ledger.get_loan(actor, LoanId::from(id)).await?;
    Ok(Json(loan.into()))
}

/// Repays a loan from one of the borrower's accounts
pub async fn repay(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<RepayBody>,
) -> Result<Json<RepaymentResponse>, ApiError> {
    body.validate()?;
    let receipt = state
        .ledger
        .repay_loan(
            actor,
            LoanRepaymentRequest {
                loan_id: LoanId::from(id),
                account_id: AccountId::from(body.account_id),
                amount: body.amount,
            },
        )
        .await?;
    Ok(Json(receipt.into()))
}

/// Rejects a loan before any repayment (operators only)
pub async fn reject_loan(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    require_operator(&actor)?;
    let loan = state.ledger.reject_loan(actor, LoanId::from(id)).await?;
    Ok(Json(loan.into()))
}

/// Withdraws a loan before any repayment
pub async fn withdraw_loan(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan = state.ledger.withdraw_loan(actor, LoanId::from(id)).await?;
    Ok(Json(loan.into()))
}
