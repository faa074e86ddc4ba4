//! API error types and responses.
//!
//! The variants mirror the service's error taxonomy: client-correctable
//! failures carry a stable machine code and a human-readable message;
//! internal failures are logged with context and return an opaque message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid input - malformed or missing request data, rejected before
    /// any side effect.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The account's balance cannot cover the requested debit.
    #[error("purchase required: balance={balance}, required={required}")]
    PurchaseRequired {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// The customer has no chargeable payment method on file.
    #[error("no payment method on file")]
    NoPaymentMethod,

    /// The requested pack is not in the catalog.
    #[error("unknown pack: {0}")]
    UnknownPack(String),

    /// The processor declined the charge or was unreachable.
    #[error("payment failed: {0}")]
    PaymentFailed(String),

    /// A processor API call failed for reasons unrelated to a charge.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Internal server error (storage or other infrastructure).
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_input", msg.clone(), None)
            }
            Self::PurchaseRequired { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "purchase_required",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::NoPaymentMethod => (
                StatusCode::PAYMENT_REQUIRED,
                "no_payment_method",
                self.to_string(),
                None,
            ),
            Self::UnknownPack(id) => (
                StatusCode::NOT_FOUND,
                "unknown_pack",
                format!("unknown pack: {id}"),
                None,
            ),
            Self::PaymentFailed(reason) => (
                StatusCode::PAYMENT_REQUIRED,
                "payment_failed",
                reason.clone(),
                None,
            ),
            Self::Gateway(msg) => (StatusCode::BAD_GATEWAY, "gateway_error", msg.clone(), None),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<scout_billing_store::StoreError> for ApiError {
    fn from(err: scout_billing_store::StoreError) -> Self {
        match err {
            scout_billing_store::StoreError::NotFound => Self::NotFound("record not found".into()),
            scout_billing_store::StoreError::InvalidAmount(amount) => {
                Self::InvalidInput(format!("amount must be positive, got {amount}"))
            }
            scout_billing_store::StoreError::InsufficientCredits { balance, required } => {
                Self::PurchaseRequired { balance, required }
            }
            scout_billing_store::StoreError::Database(msg)
            | scout_billing_store::StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<scout_billing_core::IdError> for ApiError {
    fn from(err: scout_billing_core::IdError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
