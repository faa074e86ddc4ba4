//! Purchase flow integration tests.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{MockGateway, TestHarness};
use serde_json::json;

use scout_billing_store::Store;

fn purchase_body(request_id: &str) -> serde_json::Value {
    json!({
        "pack_id": "starter",
        "request_id": request_id
    })
}

// ============================================================================
// Success
// ============================================================================

#[tokio::test]
async fn purchase_from_zero_balance_grants_pack_credits() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/purchases")
        .add_header("authorization", harness.user_auth_header())
        .json(&purchase_body("req-1"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["remaining_credits"], 50);
    assert_eq!(body["outcome"], "succeeded");
    assert_eq!(body["credits_granted"], 50);
    assert_eq!(body["amount_charged_minor"], 900);
    assert_eq!(body["already_processed"], false);

    assert_eq!(harness.ledger_balance(), 50);

    // Exactly one purchase record with outcome succeeded
    let records = harness
        .store
        .list_purchases_by_email(&harness.email, 10, 0)
        .unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].outcome.is_succeeded());
}

// ============================================================================
// Idempotent retry
// ============================================================================

#[tokio::test]
async fn retrying_a_succeeded_purchase_does_not_double_credit() {
    let gateway = Arc::new(MockGateway::default());
    let harness = TestHarness::with_gateway(Arc::clone(&gateway));

    harness
        .server
        .post("/v1/purchases")
        .add_header("authorization", harness.user_auth_header())
        .json(&purchase_body("req-1"))
        .await
        .assert_status_ok();

    // Same request_id → the gateway resolves to the same transaction
    let response = harness
        .server
        .post("/v1/purchases")
        .add_header("authorization", harness.user_auth_header())
        .json(&purchase_body("req-1"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["already_processed"], true);
    assert_eq!(body["remaining_credits"], 50);

    // Both submissions reached the gateway; the ledger saw one credit, the
    // history one record.
    assert_eq!(gateway.charges.load(Ordering::SeqCst), 2);
    assert_eq!(harness.ledger_balance(), 50);
    let records = harness
        .store
        .list_purchases_by_email(&harness.email, 10, 0)
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn distinct_requests_credit_separately() {
    let harness = TestHarness::new();

    for request_id in ["req-1", "req-2"] {
        harness
            .server
            .post("/v1/purchases")
            .add_header("authorization", harness.user_auth_header())
            .json(&purchase_body(request_id))
            .await
            .assert_status_ok();
    }

    assert_eq!(harness.ledger_balance(), 100);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn declined_charge_records_failure_and_credits_nothing() {
    let gateway = Arc::new(MockGateway {
        decline_reason: Some("insufficient_funds".into()),
        ..MockGateway::default()
    });
    let harness = TestHarness::with_gateway(gateway);

    let response = harness
        .server
        .post("/v1/purchases")
        .add_header("authorization", harness.user_auth_header())
        .json(&purchase_body("req-1"))
        .await;

    response.assert_status(axum::http::StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "payment_failed");
    assert_eq!(body["error"]["message"], "insufficient_funds");

    assert_eq!(harness.ledger_balance(), 0);

    // Exactly one purchase record with outcome failed
    let records = harness
        .store
        .list_purchases_by_email(&harness.email, 10, 0)
        .unwrap();
    assert_eq!(records.len(), 1);
    assert!(!records[0].outcome.is_succeeded());
    assert_eq!(records[0].failure_reason.as_deref(), Some("insufficient_funds"));
}

#[tokio::test]
async fn unknown_pack_is_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/purchases")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({"pack_id": "enterprise"}))
        .await;

    response.assert_status_not_found();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "unknown_pack");
    assert_eq!(harness.ledger_balance(), 0);
}

#[tokio::test]
async fn missing_payment_method_is_rejected() {
    let gateway = Arc::new(MockGateway {
        default_payment_method: None,
        ..MockGateway::default()
    });
    let harness = TestHarness::with_gateway(gateway);

    let response = harness
        .server
        .post("/v1/purchases")
        .add_header("authorization", harness.user_auth_header())
        .json(&purchase_body("req-1"))
        .await;

    response.assert_status(axum::http::StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "no_payment_method");
}

#[tokio::test]
async fn purchase_without_gateway_fails_with_gateway_error() {
    let harness = TestHarness::with_parts(None, None);

    let response = harness
        .server
        .post("/v1/purchases")
        .add_header("authorization", harness.user_auth_header())
        .json(&purchase_body("req-1"))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
}

// ============================================================================
// History
// ============================================================================

#[tokio::test]
async fn purchase_history_lists_newest_first() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/v1/purchases")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({"pack_id": "starter", "request_id": "req-1"}))
        .await
        .assert_status_ok();

    tokio::time::sleep(std::time::Duration::from_millis(2)).await;

    harness
        .server
        .post("/v1/purchases")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({"pack_id": "growth", "request_id": "req-2"}))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/purchases")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let purchases = body["purchases"].as_array().unwrap();
    assert_eq!(purchases.len(), 2);
    assert_eq!(purchases[0]["pack_id"], "growth");
    assert_eq!(purchases[1]["pack_id"], "starter");
    assert_eq!(body["has_more"], false);
}
