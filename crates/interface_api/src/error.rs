//! API error handling
//!
//! Ledger errors keep their stable kind code as the `error` field of the
//! response body; the HTTP status groups them by what the caller can do
//! about it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain_ledger::LedgerError;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

fn ledger_status(error: &LedgerError) -> StatusCode {
    match error {
        LedgerError::AccountNotFound(_)
        | LedgerError::LoanNotFound(_)
        | LedgerError::PayeeNotFound(_)
        | LedgerError::TransactionNotFound(_) => StatusCode::NOT_FOUND,

        LedgerError::DuplicateReference(_)
        | LedgerError::AccountNotActive { .. }
        | LedgerError::LoanAlreadyPaid(_)
        | LedgerError::LoanNotActive { .. }
        | LedgerError::AccountNotEmpty { .. }
        | LedgerError::InvalidStatusTransition { .. } => StatusCode::CONFLICT,

        LedgerError::InvalidAmount(_)
        | LedgerError::InsufficientFunds { .. }
        | LedgerError::LimitExceeded { .. }
        | LedgerError::SameAccountTransfer
        | LedgerError::CurrencyMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,

        LedgerError::VerificationRequired { .. } => StatusCode::PRECONDITION_REQUIRED,

        LedgerError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn ledger_details(error: &LedgerError) -> Option<Value> {
    match error {
        LedgerError::VerificationRequired { threshold } => Some(json!({
            "threshold": threshold.amount(),
            "currency": threshold.currency(),
        })),
        LedgerError::LimitExceeded {
            window,
            requested,
            remaining,
        } => Some(json!({
            "window": window,
            "requested": requested.amount(),
            "remaining": remaining.amount(),
            "currency": requested.currency(),
        })),
        LedgerError::InsufficientFunds {
            requested,
            available,
            ..
        } => Some(json!({
            "requested": requested.amount(),
            "available": available.amount(),
        })),
        _ => None,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Unauthorized".to_string(),
                None,
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone(), None),
            ApiError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                msg.clone(),
                None,
            ),
            ApiError::Ledger(error) => {
                // Storage internals stay in the logs
                let message = if error.is_retryable() {
                    "Ledger storage is temporarily unavailable".to_string()
                } else {
                    error.to_string()
                };
                (ledger_status(error), error.kind().code(), message, ledger_details(error))
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MissingPermission(permission) => ApiError::Forbidden(permission),
            AuthError::InvalidToken | AuthError::TokenExpired => ApiError::Unauthorized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{Currency, Money, PortError};
    use domain_ledger::LimitWindow;
    use rust_decimal_macros::dec;

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    #[test]
    fn test_status_groups() {
        let cases = [
            (LedgerError::AccountNotFound("a".into()), StatusCode::NOT_FOUND),
            (LedgerError::DuplicateReference("r".into()), StatusCode::CONFLICT),
            (LedgerError::LoanAlreadyPaid("l".into()), StatusCode::CONFLICT),
            (LedgerError::SameAccountTransfer, StatusCode::UNPROCESSABLE_ENTITY),
            (
                LedgerError::VerificationRequired { threshold: usd(dec!(10000)) },
                StatusCode::PRECONDITION_REQUIRED,
            ),
            (
                LedgerError::StorageUnavailable(PortError::connection("down")),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).into_response().status(), status);
        }
    }

    #[test]
    fn test_limit_details() {
        let error = LedgerError::LimitExceeded {
            window: LimitWindow::Daily,
            requested: usd(dec!(20)),
            remaining: usd(dec!(5)),
        };
        let details = ledger_details(&error).unwrap();
        assert_eq!(details["currency"], "USD");
        assert!(details.get("remaining").is_some());
    }

    #[test]
    fn test_auth_errors() {
        let forbidden = ApiError::from(AuthError::MissingPermission("x".into()));
        assert_eq!(forbidden.into_response().status(), StatusCode::FORBIDDEN);
        let expired = ApiError::from(AuthError::TokenExpired);
        assert_eq!(expired.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
