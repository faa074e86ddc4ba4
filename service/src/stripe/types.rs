//! Stripe API types.

use serde::Deserialize;

/// Stripe customer object.
#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    /// Stripe customer ID.
    pub id: String,
    /// Customer email.
    #[serde(default)]
    pub email: Option<String>,
    /// Invoice settings, carrying the default payment method.
    #[serde(default)]
    pub invoice_settings: InvoiceSettings,
    /// Created timestamp (Unix).
    #[serde(default)]
    pub created: i64,
}

/// Customer invoice settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceSettings {
    /// The default payment method ID, if set.
    #[serde(default)]
    pub default_payment_method: Option<String>,
}

/// Stripe payment method object.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMethod {
    /// Payment method ID.
    pub id: String,
    /// Card details (present for card-type methods).
    #[serde(default)]
    pub card: Option<Card>,
}

/// Card details of a payment method.
#[derive(Debug, Clone, Deserialize)]
pub struct Card {
    /// Card brand (e.g. "visa").
    #[serde(default)]
    pub brand: String,
    /// Last four digits.
    #[serde(default)]
    pub last4: String,
    /// Expiration month (1-12).
    #[serde(default)]
    pub exp_month: i64,
    /// Expiration year (four digits).
    #[serde(default)]
    pub exp_year: i64,
}

/// Stripe `PaymentIntent` object.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    /// Payment intent ID.
    pub id: String,
    /// Amount in the currency's smallest unit.
    #[serde(default)]
    pub amount: i64,
    /// Currency (e.g. "usd").
    #[serde(default)]
    pub currency: String,
    /// Status (succeeded, requires_action, ...).
    #[serde(default)]
    pub status: String,
    /// Customer ID.
    #[serde(default)]
    pub customer: Option<String>,
    /// The most recent payment error, if any.
    #[serde(default)]
    pub last_payment_error: Option<PaymentError>,
}

/// A payment error attached to a `PaymentIntent`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentError {
    /// Error message.
    #[serde(default)]
    pub message: Option<String>,
    /// Decline code, when the card was declined.
    #[serde(default)]
    pub decline_code: Option<String>,
}

/// Stripe list response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeList<T> {
    /// Data items.
    pub data: Vec<T>,
    /// Whether there are more items.
    #[serde(default)]
    pub has_more: bool,
}

/// Stripe API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    /// Error details.
    pub error: StripeErrorDetail,
}

/// Stripe error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    #[serde(default)]
    pub message: Option<String>,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Decline code for card errors.
    #[serde(default)]
    pub decline_code: Option<String>,
}
