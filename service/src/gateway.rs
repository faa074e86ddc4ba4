//! The payment gateway boundary.
//!
//! The purchase orchestrator and the payment-method handlers speak to the
//! processor only through the `PaymentGateway` trait, so the whole purchase
//! flow is testable against an in-process fake with no network dependency.
//! `stripe::StripeClient` is the production implementation.

use async_trait::async_trait;
use serde::Serialize;

use scout_billing_core::Email;

/// Errors surfaced by a payment gateway implementation.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The processor rejected the charge (declined card, expired method).
    #[error("{reason}")]
    Declined {
        /// Processor reason string, safe to show to the user.
        reason: String,
    },

    /// A processor API call failed.
    #[error("processor API error: {message}")]
    Api {
        /// Error message from the processor.
        message: String,
        /// Processor error code, when available.
        code: Option<String>,
    },

    /// The processor could not be reached (network error, timeout).
    /// For a charge this is classified as a payment failure: the outcome is
    /// undetermined and no credit is granted.
    #[error("processor unreachable: {0}")]
    Unreachable(String),

    /// The gateway is not configured correctly.
    #[error("gateway configuration error: {0}")]
    Configuration(String),
}

/// A reference to the processor-side customer object for an account.
#[derive(Debug, Clone)]
pub struct CustomerRef {
    /// Processor customer ID.
    pub id: String,
    /// The customer's default payment method, if one is set.
    pub default_payment_method: Option<String>,
}

/// Display metadata for a stored payment method.
///
/// The service never persists card data; only this reference is ever held,
/// and only transiently.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentMethodRef {
    /// Processor payment method ID.
    pub id: String,
    /// Card brand (e.g. "visa").
    pub brand: String,
    /// Last four digits.
    pub last4: String,
    /// Expiration month (1-12).
    pub exp_month: i64,
    /// Expiration year (four digits).
    pub exp_year: i64,
    /// Whether this is the customer's default method.
    pub is_default: bool,
}

/// A synchronously confirmed charge.
#[derive(Debug, Clone)]
pub struct ChargeConfirmation {
    /// The processor's unique transaction ID. Used as the idempotency key
    /// for the ledger credit.
    pub charge_id: String,
    /// Amount charged, in the currency's smallest unit.
    pub amount_minor: i64,
}

/// The payment-processor boundary.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Resolve or create the processor customer for an email.
    async fn ensure_customer(&self, email: &Email) -> Result<CustomerRef, GatewayError>;

    /// List the customer's stored payment methods.
    async fn list_payment_methods(
        &self,
        customer: &CustomerRef,
    ) -> Result<Vec<PaymentMethodRef>, GatewayError>;

    /// Mark a payment method as the customer's default.
    async fn set_default_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<(), GatewayError>;

    /// Detach a payment method from its customer.
    async fn detach_payment_method(&self, payment_method_id: &str) -> Result<(), GatewayError>;

    /// Submit a charge with synchronous confirmation (no client action).
    ///
    /// `idempotency_key` makes a re-submitted purchase intent yield the
    /// same processor transaction rather than a second charge.
    async fn charge(
        &self,
        customer_id: &str,
        payment_method_id: &str,
        amount_minor: i64,
        description: &str,
        idempotency_key: &str,
    ) -> Result<ChargeConfirmation, GatewayError>;
}
