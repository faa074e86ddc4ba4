//! Authentication extractors.
//!
//! This module provides extractors for:
//! - `AuthUser` - end-user authentication via identity-service bearer token
//! - `AdminAuth` - operator authentication via admin API key
//!
//! The identity service verifies the user's email before issuing a token;
//! the extractors trust the verified value and never re-derive identity.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use scout_billing_core::Email;

use crate::crypto::constant_time_eq;
use crate::error::ApiError;
use crate::state::AppState;

/// An authenticated user extracted from an identity-service bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The verified account email.
    pub email: Email,
    /// The raw subject claim from the token.
    pub subject: String,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let auth_header = parts
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::Unauthorized)?;

            let token = auth_header
                .strip_prefix("Bearer ")
                .ok_or(ApiError::Unauthorized)?;

            if let Some(secret) = &state.config.auth_hs256_secret {
                return decode_jwt(token, secret, &state.config.auth_audience);
            }

            // No signing secret configured: dev/test mode. Accept tokens of
            // the form `test-token:<email>`.
            if let Some(email_str) = token.strip_prefix("test-token:") {
                let email = email_str
                    .parse::<Email>()
                    .map_err(|_| ApiError::Unauthorized)?;

                return Ok(AuthUser {
                    subject: email_str.to_string(),
                    email,
                });
            }

            Err(ApiError::Unauthorized)
        })
    }
}

/// Decode and validate an HS256 token from the identity service.
fn decode_jwt(token: &str, secret: &str, audience: &str) -> Result<AuthUser, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[audience]);

    let data = jsonwebtoken::decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "Token validation failed");
        ApiError::Unauthorized
    })?;

    // The verified email lives in the `email` claim; some issuers put it in
    // `sub` instead.
    let email_claim = data.claims.email.as_deref().unwrap_or(&data.claims.sub);
    let email = email_claim
        .parse::<Email>()
        .map_err(|_| ApiError::Unauthorized)?;

    Ok(AuthUser {
        email,
        subject: data.claims.sub,
    })
}

/// Operator authentication via the admin API key.
///
/// Used for the grant/reset endpoints. All requests are rejected when no
/// admin key is configured.
#[derive(Debug, Clone)]
pub struct AdminAuth;

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let provided = parts
                .headers
                .get("x-admin-key")
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::Unauthorized)?;

            let expected = state
                .config
                .admin_api_key
                .as_ref()
                .ok_or(ApiError::Unauthorized)?;

            if !constant_time_eq(provided, expected) {
                return Err(ApiError::Unauthorized);
            }

            Ok(AdminAuth)
        })
    }
}

/// JWT claims structure for identity-service tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user identifier at the issuer).
    pub sub: String,
    /// Verified email address, when present as its own claim.
    #[serde(default)]
    pub email: Option<String>,
    /// Audience.
    pub aud: String,
    /// Expiration time.
    pub exp: i64,
    /// Issued at.
    #[serde(default)]
    pub iat: i64,
}
