//! Application state.

use std::sync::Arc;

use scout_billing_store::Store;

use crate::config::ServiceConfig;
use crate::enrichment::{EnrichClient, SearchBackend};
use crate::gateway::PaymentGateway;
use crate::stripe::StripeClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend (ledger, purchase records, search history).
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Payment gateway for purchases (optional).
    pub gateway: Option<Arc<dyn PaymentGateway>>,

    /// Search backend for running enrichment queries (optional).
    pub search: Option<Arc<dyn SearchBackend>>,
}

impl AppState {
    /// Create a new application state, building the external clients that
    /// the configuration enables.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        // Create the Stripe gateway if configured
        let gateway: Option<Arc<dyn PaymentGateway>> =
            config.stripe_api_key.as_ref().map(|key| {
                tracing::info!("Stripe integration enabled");
                Arc::new(StripeClient::new(key, config.currency.clone())) as Arc<dyn PaymentGateway>
            });

        if gateway.is_none() {
            tracing::warn!("Stripe not configured - purchases will not be available");
        }

        // Create the enrichment client if configured
        let search: Option<Arc<dyn SearchBackend>> = config.enrich_api_url.as_ref().map(|url| {
            tracing::info!(enrich_url = %url, "Enrichment backend enabled");
            Arc::new(EnrichClient::new(url, config.enrich_api_key.clone()))
                as Arc<dyn SearchBackend>
        });

        if search.is_none() {
            tracing::warn!("Enrichment backend not configured - searches will not be available");
        }

        Self {
            store,
            config,
            gateway,
            search,
        }
    }

    /// Check if the payment gateway is configured.
    #[must_use]
    pub fn has_gateway(&self) -> bool {
        self.gateway.is_some()
    }

    /// Check if the search backend is configured.
    #[must_use]
    pub fn has_search(&self) -> bool {
        self.search.is_some()
    }
}
