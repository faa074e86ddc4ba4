//! Stripe integration for payments and customer management.
//!
//! Stripe handles:
//! - Customer records (one per account email)
//! - Stored payment methods and the default-method flag
//! - Synchronous card charges for credit packs

pub mod client;
pub mod types;

pub use client::StripeClient;
pub use client::StripeError;
pub use types::*;
