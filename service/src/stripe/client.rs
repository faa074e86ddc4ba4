//! Stripe API client implementation.

use reqwest::Client;
use std::time::Duration;

use async_trait::async_trait;

use scout_billing_core::Email;

use super::types::{
    Customer, PaymentIntent, PaymentMethod, StripeErrorResponse, StripeList,
};
use crate::gateway::{
    ChargeConfirmation, CustomerRef, GatewayError, PaymentGateway, PaymentMethodRef,
};

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error: {error_type} - {message}")]
    Api {
        /// Error type (e.g. `card_error`).
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
        /// Decline code for card errors.
        decline_code: Option<String>,
    },
}

impl From<StripeError> for GatewayError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::Http(e) => Self::Unreachable(e.to_string()),
            StripeError::Api {
                error_type,
                message,
                code,
                decline_code,
            } => {
                if error_type == "card_error" {
                    Self::Declined {
                        reason: decline_code.unwrap_or(message),
                    }
                } else {
                    Self::Api { message, code }
                }
            }
        }
    }
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    api_key: String,
    base_url: String,
    currency: String,
}

impl StripeClient {
    /// Stripe API base URL.
    const BASE_URL: &'static str = "https://api.stripe.com/v1";

    /// Create a new Stripe client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Stripe secret API key (`sk_test_...` or `sk_live_...`)
    /// * `currency` - Charge currency (e.g. "usd")
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, currency: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            base_url: Self::BASE_URL.to_string(),
            currency: currency.into(),
        }
    }

    /// Override the API base URL (for tests against a local mock).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Find an existing customer by email.
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, StripeError> {
        let response = self
            .client
            .get(format!("{}/customers", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .query(&[("email", email), ("limit", "1")])
            .send()
            .await?;

        let list: StripeList<Customer> = self.handle_response(response).await?;
        Ok(list.data.into_iter().next())
    }

    /// Create a new customer for an email.
    async fn create_customer(&self, email: &str) -> Result<Customer, StripeError> {
        let response = self
            .client
            .post(format!("{}/customers", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&[("email", email)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Create and synchronously confirm a payment intent.
    async fn create_payment_intent(
        &self,
        customer_id: &str,
        payment_method_id: &str,
        amount_minor: i64,
        description: &str,
        idempotency_key: &str,
    ) -> Result<PaymentIntent, StripeError> {
        let params = [
            ("amount", amount_minor.to_string()),
            ("currency", self.currency.clone()),
            ("customer", customer_id.to_string()),
            ("payment_method", payment_method_id.to_string()),
            ("confirm", "true".to_string()),
            ("off_session", "true".to_string()),
            ("description", description.to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/payment_intents", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .header("Idempotency-Key", idempotency_key)
            .form(&params)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse error response
        let error_body: Result<StripeErrorResponse, _> = response.json().await;

        match error_body {
            Ok(stripe_error) => Err(StripeError::Api {
                error_type: stripe_error.error.error_type,
                message: stripe_error
                    .error
                    .message
                    .unwrap_or_else(|| format!("HTTP {status}")),
                code: stripe_error.error.code,
                decline_code: stripe_error.error.decline_code,
            }),
            Err(_) => Err(StripeError::Api {
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
                decline_code: None,
            }),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn ensure_customer(&self, email: &Email) -> Result<CustomerRef, GatewayError> {
        let customer = match self.find_customer_by_email(email.as_str()).await? {
            Some(existing) => existing,
            None => {
                tracing::info!(email = %email, "Creating Stripe customer");
                self.create_customer(email.as_str()).await?
            }
        };

        Ok(CustomerRef {
            id: customer.id,
            default_payment_method: customer.invoice_settings.default_payment_method,
        })
    }

    async fn list_payment_methods(
        &self,
        customer: &CustomerRef,
    ) -> Result<Vec<PaymentMethodRef>, GatewayError> {
        let response = self
            .client
            .get(format!("{}/payment_methods", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .query(&[("customer", customer.id.as_str()), ("type", "card")])
            .send()
            .await
            .map_err(StripeError::Http)?;

        let list: StripeList<PaymentMethod> = self.handle_response(response).await?;

        Ok(list
            .data
            .into_iter()
            .map(|method| {
                let card = method.card.unwrap_or_else(|| super::types::Card {
                    brand: String::new(),
                    last4: String::new(),
                    exp_month: 0,
                    exp_year: 0,
                });
                PaymentMethodRef {
                    is_default: customer.default_payment_method.as_deref()
                        == Some(method.id.as_str()),
                    id: method.id,
                    brand: card.brand,
                    last4: card.last4,
                    exp_month: card.exp_month,
                    exp_year: card.exp_year,
                }
            })
            .collect())
    }

    async fn set_default_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(format!("{}/customers/{}", self.base_url, customer_id))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&[("invoice_settings[default_payment_method]", payment_method_id)])
            .send()
            .await
            .map_err(StripeError::Http)?;

        let _: Customer = self.handle_response(response).await?;
        Ok(())
    }

    async fn detach_payment_method(&self, payment_method_id: &str) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(format!(
                "{}/payment_methods/{}/detach",
                self.base_url, payment_method_id
            ))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .send()
            .await
            .map_err(StripeError::Http)?;

        let _: PaymentMethod = self.handle_response(response).await?;
        Ok(())
    }

    async fn charge(
        &self,
        customer_id: &str,
        payment_method_id: &str,
        amount_minor: i64,
        description: &str,
        idempotency_key: &str,
    ) -> Result<ChargeConfirmation, GatewayError> {
        let intent = self
            .create_payment_intent(
                customer_id,
                payment_method_id,
                amount_minor,
                description,
                idempotency_key,
            )
            .await?;

        if intent.status == "succeeded" {
            return Ok(ChargeConfirmation {
                charge_id: intent.id,
                amount_minor: intent.amount,
            });
        }

        // Anything short of synchronous confirmation (requires_action,
        // requires_payment_method, ...) counts as a failed payment.
        let reason = intent
            .last_payment_error
            .and_then(|err| err.decline_code.or(err.message))
            .unwrap_or_else(|| format!("payment not confirmed (status: {})", intent.status));

        Err(GatewayError::Declined { reason })
    }
}
