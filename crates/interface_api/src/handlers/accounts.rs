//! Account handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use core_kernel::{AccountId, TransactionId, UserId};
use domain_ledger::{Actor, DepositRequest, OpenAccountRequest, WithdrawalRequest};
use uuid::Uuid;
use validator::Validate;

use crate::auth::require_operator;
use crate::dto::accounts::*;
use crate::{error::ApiError, AppState};

/// Opens an account for the caller, or for anyone when called by an operator
pub async fn open_account(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<OpenAccountBody>,
) -> Result<(StatusCode, Json<OpenAccountResponse>), ApiError> {
    body.validate()?;
    let owner_id = body.owner_id.map(UserId::from).unwrap_or(actor.user_id());

    let opened = state
        .ledger
        .open_account(
            actor,
            OpenAccountRequest {
                owner_id,
                currency: body.currency,
                daily_limit: body.daily_limit,
                monthly_limit: body.monthly_limit,
                overdraft_limit: body.overdraft_limit,
                initial_deposit: body.initial_deposit,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OpenAccountResponse {
            account: opened.account.into(),
            opening_deposit: opened.opening_deposit.map(Into::into),
        }),
    ))
}

/// Gets an account by ID
pub async fn get_account(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.ledger.get_account(actor, AccountId::from(id)).await?;
    Ok(Json(account.into()))
}

/// Credits an account
pub async fn deposit(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<MovementBody>,
) -> Result<Json<MovementResponse>, ApiError> {
    body.validate()?;
    let receipt = state
        .ledger
        .deposit(
            actor,
            DepositRequest {
                account_id: AccountId::from(id),
                amount: body.amount,
                description: body.description,
                reference: body.reference,
            },
        )
        .await?;
    Ok(Json(receipt.into()))
}

/// Debits an account
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<MovementBody>,
) -> Result<Json<MovementResponse>, ApiError> {
    body.validate()?;
    let receipt = state
        .ledger
        .withdraw(
            actor,
            WithdrawalRequest {
                account_id: AccountId::from(id),
                amount: body.amount,
                description: body.description,
                reference: body.reference,
            },
        )
        .await?;
    Ok(Json(receipt.into()))
}

/// Closes an empty account
pub async fn close_account(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.ledger.close_account(actor, AccountId::from(id)).await?;
    Ok(Json(account.into()))
}

/// Suspends an account (operators only)
pub async fn suspend_account(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountResponse>, ApiError> {
    require_operator(&actor)?;
    let account = state.ledger.suspend_account(actor, AccountId::from(id)).await?;
    Ok(Json(account.into()))
}

/// Lifts a suspension (operators only)
pub async fn reactivate_account(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountResponse>, ApiError> {
    require_operator(&actor)?;
    let account = state
        .ledger
        .reactivate_account(actor, AccountId::from(id))
        .await?;
    Ok(Json(account.into()))
}

/// Remaining daily and monthly allowance
pub async fn allowance(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<AllowanceResponse>, ApiError> {
    let allowance = state
        .ledger
        .spending_allowance(actor, AccountId::from(id))
        .await?;
    Ok(Json(allowance.into()))
}

/// Recent transactions, newest first
pub async fn transactions(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Query(query): Query<StatementQuery>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    query.validate()?;
    let statement = state
        .ledger
        .account_statement(actor, AccountId::from(id), query.limit)
        .await?;
    Ok(Json(statement.into_iter().map(Into::into).collect()))
}

/// Changes the category of a transaction
pub async fn set_category(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(body): Json<CategoryBody>,
) -> Result<Json<TransactionResponse>, ApiError> {
    body.validate()?;
    let transaction = state
        .ledger
        .recategorize(actor, TransactionId::from(id), body.category)
        .await?;
    Ok(Json(transaction.into()))
}
