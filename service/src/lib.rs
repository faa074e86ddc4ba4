//! Scout-Billing HTTP API Service.
//!
//! This crate provides the HTTP API for the scout billing service,
//! including:
//!
//! - Credit balance queries and the search-debit flow
//! - Credit pack purchases through the payment gateway
//! - Payment method management
//! - Purchase and search history
//!
//! # Authentication
//!
//! End-user requests carry a bearer token from the upstream identity
//! service; the verified email in the token is the account key. Operator
//! endpoints use a separate admin API key.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Some handlers need async for extractor consistency

pub mod auth;
pub mod config;
pub mod crypto;
pub mod enrichment;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod purchase;
pub mod routes;
pub mod state;
pub mod stripe;

pub use config::{SearchCosts, ServiceConfig};
pub use error::ApiError;
pub use gateway::{ChargeConfirmation, CustomerRef, GatewayError, PaymentGateway, PaymentMethodRef};
pub use purchase::{PurchaseArgs, PurchaseError, PurchaseOrchestrator, PurchaseResult};
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{StripeClient, StripeError};
