//! Enrichment API client implementation.

use reqwest::Client;
use std::time::Duration;

use async_trait::async_trait;

use scout_billing_core::{SearchOperation, SearchQuery};

use super::SearchBackend;

/// Error type for enrichment backend operations.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The enrichment API returned an error.
    #[error("enrichment API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message or body text.
        message: String,
    },
}

/// HTTP client for the external enrichment API.
#[derive(Debug, Clone)]
pub struct EnrichClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl EnrichClient {
    /// Create a new enrichment client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    const fn path_for(operation: SearchOperation) -> &'static str {
        match operation {
            SearchOperation::EmailVerification => "/v1/verify",
            SearchOperation::DomainSearch => "/v1/domain-search",
            SearchOperation::PersonEnrichment => "/v1/person",
        }
    }
}

#[async_trait]
impl SearchBackend for EnrichClient {
    async fn execute(&self, query: &SearchQuery) -> Result<serde_json::Value, EnrichError> {
        let url = format!("{}{}", self.base_url, Self::path_for(query.operation));

        let mut request = self.client.post(&url).json(&query.params);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response.text().await.unwrap_or_default();
        Err(EnrichError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query() -> SearchQuery {
        SearchQuery {
            operation: SearchOperation::EmailVerification,
            params: json!({"email": "target@example.org"}),
        }
    }

    #[tokio::test]
    async fn execute_returns_raw_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "deliverable": true,
                "score": 97
            })))
            .mount(&server)
            .await;

        let client = EnrichClient::new(server.uri(), Some("key".into()));
        let raw = client.execute(&query()).await.unwrap();
        assert_eq!(raw["deliverable"], true);
    }

    #[tokio::test]
    async fn execute_surfaces_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/verify"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let client = EnrichClient::new(server.uri(), None);
        let err = client.execute(&query()).await.unwrap_err();
        assert!(matches!(err, EnrichError::Api { status: 500, .. }));
    }
}
