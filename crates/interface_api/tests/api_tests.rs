//! Router-level tests against an in-memory ledger

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use domain_ledger::{InMemoryLedgerStore, LedgerConfig, LedgerService};
use interface_api::{
    auth::{create_token, roles},
    config::ApiConfig,
    create_router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "api-test-secret";

fn app() -> Router {
    let ledger = LedgerService::new(Arc::new(InMemoryLedgerStore::new()), LedgerConfig::default());
    let config = ApiConfig {
        jwt_secret: SECRET.to_string(),
        ..ApiConfig::default()
    };
    create_router(Arc::new(ledger), config)
}

fn customer_token(user: Uuid) -> String {
    create_token(&user.to_string(), vec![], SECRET, 600).unwrap()
}

fn operator_token() -> String {
    create_token(
        &Uuid::new_v4().to_string(),
        vec![roles::OPERATOR.to_string()],
        SECRET,
        600,
    )
    .unwrap()
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

async fn open_account(app: &Router, token: &str, deposit: &str) -> Value {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/v1/accounts",
        Some(token),
        Some(json!({
            "currency": "USD",
            "daily_limit": "50000",
            "monthly_limit": "100000",
            "initial_deposit": deposit,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["account"].clone()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = call(&app, Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_api_requires_token() {
    let app = app();
    let (status, body) = call(&app, Method::POST, "/api/v1/accounts", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/v1/accounts/{}", Uuid::new_v4()),
        Some("not-a-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_open_deposit_and_withdraw() {
    let app = app();
    let user = Uuid::new_v4();
    let token = customer_token(user);

    let account = open_account(&app, &token, "100").await;
    assert_eq!(account["owner_id"], user.to_string());
    assert_eq!(account["status"], "ACTIVE");
    assert_eq!(decimal(&account["balance"]), Decimal::from(100));
    let id = account["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/accounts/{id}/deposit"),
        Some(&token),
        Some(json!({ "amount": "25.50", "reference": "pay-slip-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["replayed"], false);
    assert_eq!(body["transaction"]["reference"], "pay-slip-1");

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/accounts/{id}/withdraw"),
        Some(&token),
        Some(json!({ "amount": "500" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(decimal(&body["details"]["available"]), Decimal::from_str("125.50").unwrap());

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/v1/accounts/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["balance"]), Decimal::from_str("125.50").unwrap());

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/v1/accounts/{id}/transactions?limit=1"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["reference"], "pay-slip-1");
}

#[tokio::test]
async fn test_transfer_by_account_number() {
    let app = app();
    let token = customer_token(Uuid::new_v4());
    let from = open_account(&app, &token, "300").await;
    let to = open_account(&app, &token, "1").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/transfers",
        Some(&token),
        Some(json!({
            "from_account_id": from["id"],
            "to_account_number": to["account_number"],
            "amount": "120",
            "description": "rent share",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let reference = body["reference"].as_str().unwrap();
    assert!(reference.starts_with("TRF-"));
    assert_eq!(body["debit"]["reference"], body["credit"]["reference"]);

    let (_, allowance) = call(
        &app,
        Method::GET,
        &format!("/api/v1/accounts/{}/allowance", from["id"].as_str().unwrap()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(decimal(&allowance["daily_used"]), Decimal::from(120));
    assert_eq!(decimal(&allowance["remaining_daily"]), Decimal::from(49880));
}

#[tokio::test]
async fn test_transfer_needs_exactly_one_destination() {
    let app = app();
    let token = customer_token(Uuid::new_v4());
    let from = open_account(&app, &token, "300").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/transfers",
        Some(&token),
        Some(json!({ "from_account_id": from["id"], "amount": "10" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_large_bill_requires_document() {
    let app = app();
    let operator = operator_token();
    let token = customer_token(Uuid::new_v4());

    let utility = open_account(&app, &operator, "1").await;
    let (status, payee) = call(
        &app,
        Method::POST,
        "/api/v1/payees",
        Some(&operator),
        Some(json!({
            "name": "City Power",
            "account_number": utility["account_number"],
            "category": "utilities",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{payee}");

    let account = open_account(&app, &token, "20000").await;
    let bill = json!({
        "payee_id": payee["id"],
        "account_id": account["id"],
        "amount": "10000",
    });

    let (status, body) = call(&app, Method::POST, "/api/v1/bills/pay", Some(&token), Some(bill.clone())).await;
    assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);
    assert_eq!(decimal(&body["details"]["threshold"]), Decimal::from(10000));
    assert_eq!(body["details"]["currency"], "USD");

    let mut verified = bill;
    verified["document_ref"] = json!("INV-2026-10");
    let (status, body) = call(&app, Method::POST, "/api/v1/bills/pay", Some(&token), Some(verified)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["debit"]["category"], "utilities");
    assert_eq!(body["debit"]["document_ref"], "INV-2026-10");
}

#[tokio::test]
async fn test_customer_cannot_use_operator_routes() {
    let app = app();
    let token = customer_token(Uuid::new_v4());
    let account = open_account(&app, &token, "10").await;

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/accounts/{}/suspend", account["id"].as_str().unwrap()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/payees",
        Some(&token),
        Some(json!({ "name": "x", "account_number": "1", "category": "y" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_operator_suspends_account() {
    let app = app();
    let operator = operator_token();
    let token = customer_token(Uuid::new_v4());
    let account = open_account(&app, &token, "10").await;
    let id = account["id"].as_str().unwrap();

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/accounts/{id}/suspend"),
        Some(&operator),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "SUSPENDED");

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/accounts/{id}/withdraw"),
        Some(&token),
        Some(json!({ "amount": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "account_not_active");
}

#[tokio::test]
async fn test_stranger_sees_not_found() {
    let app = app();
    let owner = customer_token(Uuid::new_v4());
    let stranger = customer_token(Uuid::new_v4());
    let account = open_account(&app, &owner, "10").await;

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/v1/accounts/{}", account["id"].as_str().unwrap()),
        Some(&stranger),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rejects_non_positive_amount() {
    let app = app();
    let token = customer_token(Uuid::new_v4());
    let account = open_account(&app, &token, "10").await;

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/accounts/{}/deposit", account["id"].as_str().unwrap()),
        Some(&token),
        Some(json!({ "amount": "-5" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_loan_lifecycle_over_http() {
    let app = app();
    let operator = operator_token();
    let borrower = Uuid::new_v4();
    let token = customer_token(borrower);
    let account = open_account(&app, &token, "2000").await;

    let (status, loan) = call(
        &app,
        Method::POST,
        "/api/v1/loans",
        Some(&operator),
        Some(json!({
            "owner_id": borrower,
            "currency": "USD",
            "principal": "1000",
            "annual_rate_percent": "10",
            "term_months": 18,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{loan}");
    assert_eq!(decimal(&loan["total_repayable"]), Decimal::from(1150));
    let loan_id = loan["id"].as_str().unwrap();

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/loans/{loan_id}/repay"),
        Some(&token),
        Some(json!({ "account_id": account["id"], "amount": "1150" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["loan"]["status"], "PAID");
    assert_eq!(decimal(&body["remaining_after"]), Decimal::ZERO);

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/loans/{loan_id}/repay"),
        Some(&token),
        Some(json!({ "account_id": account["id"], "amount": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "loan_already_paid");
}
