//! Integration tests for the HTTP adapter.
//!
//! Router tests drive the axum app in-process with `tower::ServiceExt`.
//! Client tests bind a real listener on an ephemeral port and talk to it
//! through [`HttpClient`].

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use payment_system::{
    app,
    client::HttpClient,
    error::AppError,
    models::{Account, Direction, TransferRequest},
    services::{self, PaymentService},
    store::{Fault, LedgerStore, MemoryLedgerStore},
};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn setup() -> (MemoryLedgerStore, Router) {
    let store = MemoryLedgerStore::with_accounts([
        Account::new("alice456", dec!(0.01), "USD"),
        Account::new("bob123", dec!(100), "USD"),
    ])
    .await;
    let router = app::router(services::build(Arc::new(store.clone())));
    (store, router)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(path: &str) -> Request<Body> {
    Request::get(path).body(Body::empty()).unwrap()
}

fn post_json(path: &str, body: &str) -> Request<Body> {
    Request::post(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_healthcheck() {
    let (store, router) = setup().await;

    let (status, body) = send(&router, get("/v1/healthcheck")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    store.inject_fault(Fault::Begin).await;
    let (status, body) = send(&router, get("/v1/healthcheck")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "success": false, "error": "An internal error occurred" })
    );
}

#[tokio::test]
async fn test_list_accounts() {
    let (_store, router) = setup().await;

    let (status, body) = send(&router, get("/v1/accounts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let accounts = body["accounts"].as_array().unwrap();
    assert_eq!(accounts.len(), 2);
    let bob = accounts
        .iter()
        .find(|account| account["id"] == json!("bob123"))
        .unwrap();
    assert_eq!(bob["balance"], json!(100.0));
    assert_eq!(bob["currency"], json!("USD"));
}

#[tokio::test]
async fn test_transfer_and_payment_history() {
    let (_store, router) = setup().await;

    let (status, body) = send(
        &router,
        post_json(
            "/v1/transfer",
            r#"{"from": "bob123", "to": "alice456", "amount": 0.01}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["currency"], json!("USD"));

    let (status, body) = send(&router, get("/v1/payments")).await;
    assert_eq!(status, StatusCode::OK);

    let payments = body["payments"].as_array().unwrap();
    assert_eq!(payments.len(), 2);

    let outgoing = payments
        .iter()
        .find(|payment| payment["direction"] == json!("outgoing"))
        .unwrap();
    assert_eq!(outgoing["account"], json!("bob123"));
    assert_eq!(outgoing["to_account"], json!("alice456"));
    assert_eq!(outgoing["error"], json!(""));

    let incoming = payments
        .iter()
        .find(|payment| payment["direction"] == json!("incoming"))
        .unwrap();
    assert_eq!(incoming["account"], json!("alice456"));
    assert_eq!(incoming["from_account"], json!("bob123"));
}

#[tokio::test]
async fn test_business_rule_failures_are_bad_requests() {
    let (_store, router) = setup().await;

    let cases = [
        (r#"{"from": "alice456", "to": "bob123", "amount": 0.02}"#, "Insufficient funds"),
        (r#"{"from": "bob123", "to": "bob123", "amount": 1}"#, "Transfer to self"),
        (r#"{"from": "vasya", "to": "bob123", "amount": 1}"#, "Payer not found"),
        (r#"{"from": "bob123", "to": "vasya", "amount": 1}"#, "Payee not found"),
        (
            r#"{"from": "bob123", "to": "alice456", "amount": 1, "currency": "RUB"}"#,
            "Wrong currency",
        ),
        (r#"{}"#, "Required argument missing or it is incorrect"),
    ];

    for (request, message) in cases {
        let (status, body) = send(&router, post_json("/v1/transfer", request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{request}");
        assert_eq!(body, json!({ "success": false, "error": message }), "{request}");
    }
}

#[tokio::test]
async fn test_malformed_body_is_internal_error() {
    let (store, router) = setup().await;

    let (status, body) = send(&router, post_json("/v1/transfer", "{not json")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request"));
    assert!(store.list_transactions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_store_failures_are_internal_errors() {
    let (store, router) = setup().await;
    store.inject_fault(Fault::Commit).await;

    let (status, body) = send(
        &router,
        post_json(
            "/v1/transfer",
            r#"{"from": "bob123", "to": "alice456", "amount": 1}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "success": false, "error": "Transaction failed" }));
    assert_eq!(store.account("bob123").await.unwrap().balance, dec!(100));
}

async fn spawn_server() -> (MemoryLedgerStore, HttpClient) {
    let (store, router) = setup().await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = HttpClient::new(&addr.to_string()).unwrap();
    (store, client)
}

#[tokio::test]
async fn test_client_round_trip() {
    let (store, client) = spawn_server().await;

    assert!(client.health_check().await.unwrap());

    let err = client
        .transfer(TransferRequest {
            from: "alice456".to_string(),
            to: "bob123".to_string(),
            amount: dec!(0.02),
            currency: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds), "{err}");

    let transfer = client
        .transfer(TransferRequest {
            from: "bob123".to_string(),
            to: "alice456".to_string(),
            amount: dec!(0.01),
            currency: "USD".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(transfer.payer, "bob123");
    assert_eq!(transfer.amount, dec!(0.01));
    assert_eq!(store.account("alice456").await.unwrap().balance, dec!(0.02));

    let accounts = client.list_accounts().await.unwrap();
    let bob = accounts
        .iter()
        .find(|account| account.user_id == "bob123")
        .unwrap();
    assert_eq!(bob.balance, dec!(99.99));

    let records = client.list_transactions().await.unwrap();
    assert_eq!(records.len(), 3);
    let incoming = records
        .iter()
        .find(|record| record.direction == Direction::Incoming)
        .unwrap();
    assert_eq!(incoming.payer, "bob123");
    assert_eq!(incoming.payee, "alice456");
}

#[tokio::test]
async fn test_client_reports_unknown_failures_as_remote() {
    let (store, client) = spawn_server().await;
    store.inject_fault(Fault::LockAndFetch).await;

    let err = client
        .transfer(TransferRequest {
            from: "bob123".to_string(),
            to: "alice456".to_string(),
            amount: dec!(1),
            currency: String::new(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Remote { status: 500, .. }), "{err}");
}
