//! HTTP API Layer
//!
//! This crate provides the REST API for the ledger using Axum. Handlers are
//! thin: they validate the body, resolve the caller and delegate to
//! [`LedgerService`].
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers per resource
//! - **Middleware**: Bearer-token authentication and request logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Ledger errors mapped to status codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(Arc::new(ledger), config);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use domain_ledger::LedgerService;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{accounts, health, loans, payments};
use crate::middleware::{auth_middleware, request_log_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerService>,
    pub config: ApiConfig,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `ledger` - Ledger service backed by the configured store
/// * `config` - API configuration
pub fn create_router(ledger: Arc<LedgerService>, config: ApiConfig) -> Router {
    let state = AppState { ledger, config };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let account_routes = Router::new()
        .route("/", post(accounts::open_account))
        .route("/:id", get(accounts::get_account))
        .route("/:id/deposit", post(accounts::deposit))
        .route("/:id/withdraw", post(accounts::withdraw))
        .route("/:id/close", post(accounts::close_account))
        .route("/:id/suspend", post(accounts::suspend_account))
        .route("/:id/reactivate", post(accounts::reactivate_account))
        .route("/:id/allowance", get(accounts::allowance))
        .route("/:id/transactions", get(accounts::transactions));

    let loan_routes = Router::new()
        .route("/", post(loans::register_loan))
        .route("/:id", get(loans::get_loan))
        .route("/:id/repay", post(loans::repay))
        .route("/:id/reject", post(loans::reject_loan))
        .route("/:id/withdraw", post(loans::withdraw_loan));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/accounts", account_routes)
        .nest("/loans", loan_routes)
        .route("/transfers", post(payments::transfer))
        .route("/bills/pay", post(payments::pay_bill))
        .route("/payees", post(payments::register_payee))
        .route("/transactions/:id/category", put(accounts::set_category))
        .layer(axum_middleware::from_fn(request_log_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
