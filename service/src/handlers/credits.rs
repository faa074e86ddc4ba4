//! Credit balance handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use scout_billing_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Remaining search credits.
    pub credits: i64,
}

/// Get the current credit balance.
///
/// An account that has never been touched reads as a balance of 0; the
/// query itself never creates or mutates anything.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let credits = state.store.balance(&auth.email)?;

    Ok(Json(BalanceResponse { credits }))
}
