//! Search-debit flow integration tests.

mod common;

use std::sync::Arc;

use common::{StubSearch, TestHarness};
use serde_json::json;

use scout_billing_store::Store;

fn search_body() -> serde_json::Value {
    json!({
        "operation_type": "email_verification",
        "query": {"email": "target@example.org"}
    })
}

// ============================================================================
// Success path
// ============================================================================

#[tokio::test]
async fn search_debits_one_credit_and_returns_result() {
    let harness = TestHarness::new();
    harness.seed_credits(5);

    let response = harness
        .server
        .post("/v1/searches")
        .add_header("authorization", harness.user_auth_header())
        .json(&search_body())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["remaining_credits"], 4);
    assert_eq!(body["status"], "success");
    assert_eq!(body["result"]["deliverable"], true);

    assert_eq!(harness.ledger_balance(), 4);

    // Exactly one history record, marked success
    let records = harness
        .store
        .list_searches_by_email(&harness.email, 10, 0)
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, scout_billing_core::SearchStatus::Success);
    assert!(records[0].raw_response.is_some());
}

#[tokio::test]
async fn search_with_exact_balance_succeeds_then_rejects() {
    let harness = TestHarness::new();
    harness.seed_credits(1);

    let response = harness
        .server
        .post("/v1/searches")
        .add_header("authorization", harness.user_auth_header())
        .json(&search_body())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["remaining_credits"], 0);

    let response = harness
        .server
        .post("/v1/searches")
        .add_header("authorization", harness.user_auth_header())
        .json(&search_body())
        .await;
    response.assert_status(axum::http::StatusCode::PAYMENT_REQUIRED);
}

// ============================================================================
// Insufficient credits
// ============================================================================

#[tokio::test]
async fn search_with_no_credits_is_rejected_and_recorded() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/searches")
        .add_header("authorization", harness.user_auth_header())
        .json(&search_body())
        .await;

    response.assert_status(axum::http::StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "purchase_required");
    assert_eq!(body["error"]["details"]["balance"], 0);
    assert_eq!(body["error"]["details"]["required"], 1);

    // Balance untouched, exactly one no_credits history record
    assert_eq!(harness.ledger_balance(), 0);
    let records = harness
        .store
        .list_searches_by_email(&harness.email, 10, 0)
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].status,
        scout_billing_core::SearchStatus::NoCredits
    );
}

// ============================================================================
// Backend failure after debit
// ============================================================================

#[tokio::test]
async fn failed_backend_call_keeps_the_debit() {
    let harness = TestHarness::with_search(Arc::new(StubSearch::failing("upstream timeout")));
    harness.seed_credits(2);

    let response = harness
        .server
        .post("/v1/searches")
        .add_header("authorization", harness.user_auth_header())
        .json(&search_body())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "failed");
    assert_eq!(body["remaining_credits"], 1);
    assert!(body["error"].as_str().unwrap().contains("upstream timeout"));

    // The debit stands
    assert_eq!(harness.ledger_balance(), 1);

    let records = harness
        .store
        .list_searches_by_email(&harness.email, 10, 0)
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, scout_billing_core::SearchStatus::Failed);
}

// ============================================================================
// Input validation
// ============================================================================

#[tokio::test]
async fn empty_query_rejected_before_any_side_effect() {
    let harness = TestHarness::new();
    harness.seed_credits(5);

    let response = harness
        .server
        .post("/v1/searches")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({"operation_type": "domain_search", "query": {}}))
        .await;

    response.assert_status_bad_request();

    // No debit, no history record
    assert_eq!(harness.ledger_balance(), 5);
    assert!(harness
        .store
        .list_searches_by_email(&harness.email, 10, 0)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn search_without_auth_fails() {
    let harness = TestHarness::new();

    let response = harness.server.post("/v1/searches").json(&search_body()).await;

    response.assert_status_unauthorized();
}

// ============================================================================
// History listing
// ============================================================================

#[tokio::test]
async fn history_is_newest_first_with_pagination() {
    let harness = TestHarness::new();
    harness.seed_credits(10);

    for domain in ["one.example", "two.example", "three.example"] {
        harness
            .server
            .post("/v1/searches")
            .add_header("authorization", harness.user_auth_header())
            .json(&json!({
                "operation_type": "domain_search",
                "query": {"domain": domain}
            }))
            .await
            .assert_status_ok();
        // ULID request IDs order the history; keep timestamps distinct
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let response = harness
        .server
        .get("/v1/searches?limit=2&offset=0")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let searches = body["searches"].as_array().unwrap();
    assert_eq!(searches.len(), 2);
    assert_eq!(searches[0]["query"]["domain"], "three.example");
    assert_eq!(searches[1]["query"]["domain"], "two.example");
    assert_eq!(body["has_more"], true);

    let response = harness
        .server
        .get("/v1/searches?limit=2&offset=2")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    let searches = body["searches"].as_array().unwrap();
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0]["query"]["domain"], "one.example");
    assert_eq!(body["has_more"], false);
}
