//! Contact search / enrichment backend integration.
//!
//! Running the actual search is delegated to an external enrichment API.
//! The debit flow only cares that the backend either returned a raw result
//! payload or failed; it speaks to it through the `SearchBackend` trait so
//! tests can substitute a stub.

pub mod client;

pub use client::{EnrichClient, EnrichError};

use async_trait::async_trait;

use scout_billing_core::SearchQuery;

/// The search backend boundary.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run one search and return the backend's raw response payload.
    async fn execute(&self, query: &SearchQuery) -> Result<serde_json::Value, EnrichError>;
}
