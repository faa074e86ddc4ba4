//! Search history types for scout-billing.
//!
//! Every `useSearch` attempt appends exactly one `SearchRecord`, including
//! attempts rejected for lack of credits. Records are immutable once
//! written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Email, RequestId};

/// The kind of contact search being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOperation {
    /// Verify that a single email address is deliverable.
    EmailVerification,

    /// Find contact emails for a domain.
    DomainSearch,

    /// Enrich a person record (name/company → contact details).
    PersonEnrichment,
}

/// The structured input of one search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The operation to run.
    pub operation: SearchOperation,

    /// Operation parameters (e.g. `{"email": "a@b.com"}`), passed through
    /// to the search backend opaquely.
    pub params: serde_json::Value,
}

impl SearchQuery {
    /// Whether the query carries no usable parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.params {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            serde_json::Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

/// Outcome of one search attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// Credit debited, backend returned a result.
    Success,

    /// Credit debited, backend call failed. The debit stands.
    Failed,

    /// Rejected before any side effect: balance too low.
    NoCredits,
}

/// An append-only record of one search attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    /// Unique request ID (ULID, primary key).
    pub request_id: RequestId,

    /// When the attempt was made.
    pub timestamp: DateTime<Utc>,

    /// The account that made the attempt.
    pub email: Email,

    /// The structured query input.
    pub query: SearchQuery,

    /// Outcome of the attempt.
    pub status: SearchStatus,

    /// Raw backend response payload, when one was received.
    pub raw_response: Option<serde_json::Value>,
}

impl SearchRecord {
    /// Record a search whose backend call returned a result.
    #[must_use]
    pub fn success(email: Email, query: SearchQuery, raw_response: serde_json::Value) -> Self {
        Self::new(email, query, SearchStatus::Success, Some(raw_response))
    }

    /// Record a search whose backend call failed after the debit.
    #[must_use]
    pub fn failed(email: Email, query: SearchQuery, raw_response: Option<serde_json::Value>) -> Self {
        Self::new(email, query, SearchStatus::Failed, raw_response)
    }

    /// Record an attempt rejected for insufficient credits.
    #[must_use]
    pub fn no_credits(email: Email, query: SearchQuery) -> Self {
        Self::new(email, query, SearchStatus::NoCredits, None)
    }

    fn new(
        email: Email,
        query: SearchQuery,
        status: SearchStatus,
        raw_response: Option<serde_json::Value>,
    ) -> Self {
        Self {
            request_id: RequestId::generate(),
            timestamp: Utc::now(),
            email,
            query,
            status,
            raw_response,
        }
    }
}
