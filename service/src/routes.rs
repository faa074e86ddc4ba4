//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, credits, health, payments, search};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Credits & searches (identity-service bearer token)
/// - `GET /v1/credits/balance` - Get current balance
/// - `POST /v1/searches` - Run a search (debits one credit)
/// - `GET /v1/searches` - Search history
///
/// ## Purchases & payment methods (identity-service bearer token)
/// - `POST /v1/purchases` - Purchase a credit pack
/// - `GET /v1/purchases` - Purchase history
/// - `GET /v1/payment-methods` - List stored payment methods
/// - `POST /v1/payment-methods/default` - Set the default method
/// - `DELETE /v1/payment-methods/:id` - Detach a method
///
/// ## Admin (admin API key)
/// - `POST /v1/admin/credits` - Grant credits
/// - `POST /v1/admin/reset` - Reset a balance to 0
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Credits
        .route("/v1/credits/balance", get(credits::get_balance))
        // Searches
        .route("/v1/searches", post(search::use_search))
        .route("/v1/searches", get(search::list_searches))
        // Purchases
        .route("/v1/purchases", post(payments::purchase_pack))
        .route("/v1/purchases", get(payments::list_purchases))
        // Payment methods
        .route("/v1/payment-methods", get(payments::list_payment_methods))
        .route(
            "/v1/payment-methods/default",
            post(payments::set_default_payment_method),
        )
        .route(
            "/v1/payment-methods/:id",
            delete(payments::delete_payment_method),
        )
        // Admin
        .route("/v1/admin/credits", post(admin::grant_credits))
        .route("/v1/admin/reset", post(admin::reset_balance))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
