//! Search-debit flow and search history handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use scout_billing_core::{SearchOperation, SearchQuery, SearchRecord, SearchStatus};
use scout_billing_store::{Store, StoreError};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Use-search request body.
#[derive(Debug, Deserialize)]
pub struct UseSearchRequest {
    /// The operation to run.
    pub operation_type: SearchOperation,
    /// Operation parameters, passed through to the search backend.
    #[serde(default)]
    pub query: serde_json::Value,
}

/// Use-search response.
#[derive(Debug, Serialize)]
pub struct UseSearchResponse {
    /// Balance after the debit.
    pub remaining_credits: i64,
    /// Outcome of the attempt (`success` or `failed`).
    pub status: SearchStatus,
    /// History record ID for this attempt.
    pub request_id: String,
    /// Raw backend result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Backend error message when the search failed after the debit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run one search: debit a credit, call the backend, record history.
///
/// The debit happens first and is never reversed, even when the backend
/// call fails afterwards. Every attempt — including ones rejected for
/// insufficient credits — leaves exactly one history record.
pub async fn use_search(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<UseSearchRequest>,
) -> Result<Json<UseSearchResponse>, ApiError> {
    let query = SearchQuery {
        operation: body.operation_type,
        params: body.query,
    };

    if query.is_empty() {
        return Err(ApiError::InvalidInput("query must not be empty".into()));
    }

    // Reject before the debit if no backend is configured: debiting for a
    // search that can never run would be a guaranteed loss for the user.
    let backend = state
        .search
        .as_ref()
        .ok_or_else(|| ApiError::Gateway("search backend not configured".into()))?;

    let cost = state.config.search_costs.cost(query.operation);

    let remaining = match state.store.debit(&auth.email, cost) {
        Ok(remaining) => remaining,
        Err(StoreError::InsufficientCredits { balance, required }) => {
            state
                .store
                .put_search(&SearchRecord::no_credits(auth.email.clone(), query))?;

            tracing::info!(
                email = %auth.email,
                balance,
                required,
                "Search rejected: insufficient credits"
            );

            return Err(ApiError::PurchaseRequired { balance, required });
        }
        Err(err) => return Err(err.into()),
    };

    // The credit is consumed; run the search and record what happened.
    let (record, error) = match backend.execute(&query).await {
        Ok(raw) => (SearchRecord::success(auth.email.clone(), query, raw), None),
        Err(err) => {
            tracing::warn!(
                email = %auth.email,
                error = %err,
                "Search backend call failed after debit"
            );
            (
                SearchRecord::failed(auth.email.clone(), query, None),
                Some(err.to_string()),
            )
        }
    };

    state.store.put_search(&record)?;

    tracing::info!(
        email = %auth.email,
        request_id = %record.request_id,
        status = ?record.status,
        cost,
        remaining,
        "Search processed"
    );

    Ok(Json(UseSearchResponse {
        remaining_credits: remaining,
        status: record.status,
        request_id: record.request_id.to_string(),
        result: record.raw_response,
        error,
    }))
}

/// Search history query parameters.
#[derive(Debug, Deserialize)]
pub struct ListSearchesQuery {
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

/// One search history entry.
#[derive(Debug, Serialize)]
pub struct SearchHistoryEntry {
    /// History record ID.
    pub request_id: String,
    /// When the attempt was made.
    pub timestamp: String,
    /// The operation that was run.
    pub operation_type: SearchOperation,
    /// The query parameters.
    pub query: serde_json::Value,
    /// Outcome of the attempt.
    pub status: SearchStatus,
}

impl From<&SearchRecord> for SearchHistoryEntry {
    fn from(record: &SearchRecord) -> Self {
        Self {
            request_id: record.request_id.to_string(),
            timestamp: record.timestamp.to_rfc3339(),
            operation_type: record.query.operation,
            query: record.query.params.clone(),
            status: record.status,
        }
    }
}

/// Search history response.
#[derive(Debug, Serialize)]
pub struct ListSearchesResponse {
    /// Records, newest first.
    pub searches: Vec<SearchHistoryEntry>,
    /// Whether there are more records.
    pub has_more: bool,
}

/// List search history, newest first.
pub async fn list_searches(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListSearchesQuery>,
) -> Result<Json<ListSearchesResponse>, ApiError> {
    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let records = state
        .store
        .list_searches_by_email(&auth.email, limit + 1, query.offset)?;

    let has_more = records.len() > limit;
    let searches: Vec<_> = records
        .iter()
        .take(limit)
        .map(SearchHistoryEntry::from)
        .collect();

    Ok(Json(ListSearchesResponse { searches, has_more }))
}
