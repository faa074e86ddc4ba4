//! Operator endpoints: credit grants and balance resets.
//!
//! These are tooling for support and debugging, gated behind the admin API
//! key; they are never reachable with an end-user token.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use scout_billing_core::Email;
use scout_billing_store::Store;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Grant-credits request body.
#[derive(Debug, Deserialize)]
pub struct GrantCreditsRequest {
    /// Account to grant credits to.
    pub email: String,
    /// Number of credits to grant.
    pub amount: i64,
    /// Reason for the grant (logged for audit).
    pub reason: String,
}

/// Grant-credits response.
#[derive(Debug, Serialize)]
pub struct GrantCreditsResponse {
    /// Balance after the grant.
    pub credits: i64,
}

/// Grant credits to an account (support/compensation path).
pub async fn grant_credits(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Json(body): Json<GrantCreditsRequest>,
) -> Result<Json<GrantCreditsResponse>, ApiError> {
    let email: Email = body.email.parse()?;

    let credits = state.store.credit(&email, body.amount)?;

    tracing::info!(
        email = %email,
        amount = %body.amount,
        reason = %body.reason,
        new_balance = %credits,
        "Credits granted"
    );

    Ok(Json(GrantCreditsResponse { credits }))
}

/// Reset request body.
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    /// Account to reset.
    pub email: String,
}

/// Reset response.
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    /// Balance after the reset (always 0).
    pub credits: i64,
}

/// Unconditionally reset an account's balance to 0. Irreversible.
pub async fn reset_balance(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Json(body): Json<ResetRequest>,
) -> Result<Json<ResetResponse>, ApiError> {
    let email: Email = body.email.parse()?;

    let credits = state.store.reset(&email)?;

    tracing::warn!(email = %email, "Balance reset to 0");

    Ok(Json(ResetResponse { credits }))
}
