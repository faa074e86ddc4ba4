//! Service configuration.

use serde::Deserialize;
use std::path::Path;

use scout_billing_core::{PackCatalog, SearchOperation};

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/scout-billing").
    pub data_dir: String,

    /// Expected JWT audience (default: "scout-billing").
    pub auth_audience: String,

    /// HS256 secret for validating identity-service tokens. When unset the
    /// service accepts `test-token:<email>` bearer tokens (dev/test only).
    pub auth_hs256_secret: Option<String>,

    /// Admin API key for operator endpoints (grant/reset). Endpoints reject
    /// all requests when unset.
    pub admin_api_key: Option<String>,

    /// Stripe API key (optional; purchases unavailable without it).
    pub stripe_api_key: Option<String>,

    /// Charge currency (default: "usd").
    pub currency: String,

    /// Enrichment API URL (optional; searches unavailable without it).
    pub enrich_api_url: Option<String>,

    /// Enrichment API key (optional).
    pub enrich_api_key: Option<String>,

    /// Credit cost per search operation.
    pub search_costs: SearchCosts,

    /// The purchasable pack catalog.
    pub packs: PackCatalog,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Credit cost per search operation. One credit per search by default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchCosts {
    /// Cost of one email verification.
    pub email_verification: i64,
    /// Cost of one domain search.
    pub domain_search: i64,
    /// Cost of one person enrichment.
    pub person_enrichment: i64,
}

impl SearchCosts {
    /// The credit cost of the given operation.
    #[must_use]
    pub const fn cost(&self, operation: SearchOperation) -> i64 {
        match operation {
            SearchOperation::EmailVerification => self.email_verification,
            SearchOperation::DomainSearch => self.domain_search,
            SearchOperation::PersonEnrichment => self.person_enrichment,
        }
    }
}

impl Default for SearchCosts {
    fn default() -> Self {
        Self {
            email_verification: 1,
            domain_search: 1,
            person_enrichment: 1,
        }
    }
}

/// Stripe secrets file structure.
#[derive(Debug, Deserialize)]
struct StripeSecrets {
    api_key: String,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        // Try to load Stripe secrets from file first, then fall back to env vars
        let stripe_api_key = load_stripe_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/scout-billing".into()),
            auth_audience: std::env::var("AUTH_AUDIENCE")
                .unwrap_or_else(|_| "scout-billing".into()),
            auth_hs256_secret: std::env::var("AUTH_HS256_SECRET").ok(),
            admin_api_key: std::env::var("ADMIN_API_KEY").ok(),
            stripe_api_key,
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "usd".into()),
            enrich_api_url: std::env::var("ENRICH_API_URL").ok(),
            enrich_api_key: std::env::var("ENRICH_API_KEY").ok(),
            search_costs: load_search_costs(),
            packs: load_pack_catalog(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

/// Load the Stripe API key from a secrets file or the environment.
fn load_stripe_secrets() -> Option<String> {
    let secret_paths = [
        ".secrets/stripe.json",
        "scout-billing/.secrets/stripe.json",
        "../.secrets/stripe.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_json_file::<StripeSecrets>(path) {
            tracing::info!(path = %path, "Loaded Stripe secrets from file");
            return Some(secrets.api_key);
        }
    }

    tracing::debug!("Stripe secrets file not found, using environment variables");
    std::env::var("STRIPE_API_KEY").ok()
}

/// Load the pack catalog from `PACK_CATALOG_FILE`, falling back to the
/// built-in default catalog.
fn load_pack_catalog() -> PackCatalog {
    if let Ok(path) = std::env::var("PACK_CATALOG_FILE") {
        match load_json_file::<PackCatalog>(&path) {
            Ok(catalog) => {
                tracing::info!(path = %path, packs = catalog.packs().len(), "Loaded pack catalog");
                return catalog;
            }
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "Failed to load pack catalog, using default");
            }
        }
    }

    PackCatalog::default()
}

/// Load per-operation search costs from `SEARCH_COSTS` (JSON), falling back
/// to one credit per search.
fn load_search_costs() -> SearchCosts {
    match std::env::var("SEARCH_COSTS") {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(costs) => costs,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to parse SEARCH_COSTS, using defaults");
                SearchCosts::default()
            }
        },
        Err(_) => SearchCosts::default(),
    }
}

/// Load a JSON file into a deserializable value.
fn load_json_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/scout-billing".into(),
            auth_audience: "scout-billing".into(),
            auth_hs256_secret: None,
            admin_api_key: None,
            stripe_api_key: None,
            currency: "usd".into(),
            enrich_api_url: None,
            enrich_api_key: None,
            search_costs: SearchCosts::default(),
            packs: PackCatalog::default(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
