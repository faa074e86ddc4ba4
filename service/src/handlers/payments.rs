//! Purchase and payment-method handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use scout_billing_core::{PurchaseOutcome, PurchaseRecord};
use scout_billing_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::gateway::{PaymentGateway, PaymentMethodRef};
use crate::purchase::{PurchaseArgs, PurchaseError, PurchaseOrchestrator};
use crate::state::AppState;

/// Purchase request body.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    /// Catalog pack ID or processor price ID.
    pub pack_id: String,
    /// Explicit payment method; the customer default is used when absent.
    pub payment_method_id: Option<String>,
    /// Client idempotency token; re-submitting with the same token cannot
    /// double-charge or double-credit.
    pub request_id: Option<String>,
}

/// Purchase response.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    /// Balance after the purchase.
    pub remaining_credits: i64,
    /// Outcome of the attempt.
    pub outcome: PurchaseOutcome,
    /// Purchase record ID.
    pub purchase_id: String,
    /// Processor transaction ID for the charge.
    pub charge_id: Option<String>,
    /// The purchased pack.
    pub pack_id: String,
    /// Credits granted.
    pub credits_granted: i64,
    /// Amount charged, in the currency's smallest unit.
    pub amount_charged_minor: i64,
    /// Whether this request observed an already-processed charge.
    pub already_processed: bool,
}

/// Purchase a credit pack.
pub async fn purchase_pack(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let gateway = require_gateway(&state)?;

    let orchestrator = PurchaseOrchestrator::new(
        Arc::clone(&state.store),
        Arc::clone(gateway),
        state.config.packs.clone(),
    );

    let result = orchestrator
        .execute(PurchaseArgs {
            email: auth.email.clone(),
            pack_id: body.pack_id,
            payment_method_id: body.payment_method_id,
            request_id: body.request_id,
        })
        .await
        .map_err(map_purchase_error)?;

    Ok(Json(PurchaseResponse {
        remaining_credits: result.balance,
        outcome: result.record.outcome,
        purchase_id: result.record.id.to_string(),
        charge_id: result.record.charge_id.clone(),
        pack_id: result.record.pack_id.clone(),
        credits_granted: result.record.credits_granted,
        amount_charged_minor: result.record.amount_charged_minor,
        already_processed: result.already_processed,
    }))
}

/// Purchase history query parameters.
#[derive(Debug, Deserialize)]
pub struct ListPurchasesQuery {
    /// Maximum number of records to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// One purchase history entry.
#[derive(Debug, Serialize)]
pub struct PurchaseHistoryEntry {
    /// Purchase record ID.
    pub purchase_id: String,
    /// The purchased pack.
    pub pack_id: String,
    /// Amount charged, in the currency's smallest unit.
    pub amount_charged_minor: i64,
    /// Credits granted (0 for failed attempts).
    pub credits_granted: i64,
    /// Outcome of the attempt.
    pub outcome: PurchaseOutcome,
    /// Processor failure reason for failed attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// When the attempt was made.
    pub created_at: String,
}

impl From<&PurchaseRecord> for PurchaseHistoryEntry {
    fn from(record: &PurchaseRecord) -> Self {
        Self {
            purchase_id: record.id.to_string(),
            pack_id: record.pack_id.clone(),
            amount_charged_minor: record.amount_charged_minor,
            credits_granted: record.credits_granted,
            outcome: record.outcome,
            failure_reason: record.failure_reason.clone(),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// Purchase history response.
#[derive(Debug, Serialize)]
pub struct ListPurchasesResponse {
    /// Records, newest first.
    pub purchases: Vec<PurchaseHistoryEntry>,
    /// Whether there are more records.
    pub has_more: bool,
}

/// List purchase history, newest first.
pub async fn list_purchases(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListPurchasesQuery>,
) -> Result<Json<ListPurchasesResponse>, ApiError> {
    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let records = state
        .store
        .list_purchases_by_email(&auth.email, limit + 1, query.offset)?;

    let has_more = records.len() > limit;
    let purchases: Vec<_> = records
        .iter()
        .take(limit)
        .map(PurchaseHistoryEntry::from)
        .collect();

    Ok(Json(ListPurchasesResponse {
        purchases,
        has_more,
    }))
}

/// Payment methods response.
#[derive(Debug, Serialize)]
pub struct ListPaymentMethodsResponse {
    /// Stored payment methods.
    pub payment_methods: Vec<PaymentMethodRef>,
}

/// List the account's stored payment methods.
pub async fn list_payment_methods(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ListPaymentMethodsResponse>, ApiError> {
    let gateway = require_gateway(&state)?;

    let customer = gateway
        .ensure_customer(&auth.email)
        .await
        .map_err(|e| ApiError::Gateway(e.to_string()))?;
    state
        .store
        .link_processor_customer(&auth.email, &customer.id)?;

    let payment_methods = gateway
        .list_payment_methods(&customer)
        .await
        .map_err(|e| ApiError::Gateway(e.to_string()))?;

    Ok(Json(ListPaymentMethodsResponse { payment_methods }))
}

/// Set-default request body.
#[derive(Debug, Deserialize)]
pub struct SetDefaultRequest {
    /// The payment method to mark as default.
    pub payment_method_id: String,
}

/// Simple acknowledgement response.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    /// Always true.
    pub ok: bool,
}

/// Mark a payment method as the account's default.
pub async fn set_default_payment_method(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<SetDefaultRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    if body.payment_method_id.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "payment_method_id must not be empty".into(),
        ));
    }

    let gateway = require_gateway(&state)?;

    let customer = gateway
        .ensure_customer(&auth.email)
        .await
        .map_err(|e| ApiError::Gateway(e.to_string()))?;

    gateway
        .set_default_payment_method(&customer.id, &body.payment_method_id)
        .await
        .map_err(|e| ApiError::Gateway(e.to_string()))?;

    tracing::info!(
        email = %auth.email,
        payment_method = %body.payment_method_id,
        "Default payment method updated"
    );

    Ok(Json(OkResponse { ok: true }))
}

/// Detach a payment method from the account.
pub async fn delete_payment_method(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(payment_method_id): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    let gateway = require_gateway(&state)?;

    gateway
        .detach_payment_method(&payment_method_id)
        .await
        .map_err(|e| ApiError::Gateway(e.to_string()))?;

    tracing::info!(
        email = %auth.email,
        payment_method = %payment_method_id,
        "Payment method detached"
    );

    Ok(Json(OkResponse { ok: true }))
}

fn require_gateway(state: &AppState) -> Result<&Arc<dyn PaymentGateway>, ApiError> {
    state
        .gateway
        .as_ref()
        .ok_or_else(|| ApiError::Gateway("payment gateway not configured".into()))
}

fn map_purchase_error(err: PurchaseError) -> ApiError {
    match err {
        PurchaseError::UnknownPack(id) => ApiError::UnknownPack(id),
        PurchaseError::NoPaymentMethod => ApiError::NoPaymentMethod,
        PurchaseError::PaymentFailed(reason) => ApiError::PaymentFailed(reason),
        PurchaseError::Gateway(err) => ApiError::Gateway(err.to_string()),
        PurchaseError::Storage(err) => err.into(),
    }
}
