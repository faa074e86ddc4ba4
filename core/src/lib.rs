//! Core types and utilities for scout-billing.
//!
//! This crate provides the foundational types used throughout the scout
//! billing platform:
//!
//! - **Identifiers**: `Email`, `PurchaseId`, `RequestId`
//! - **Accounts**: `Account`
//! - **Packs**: `CreditPack`, `PackCatalog`
//! - **Purchases**: `PurchaseRecord`, `PurchaseOutcome`
//! - **Search history**: `SearchRecord`, `SearchQuery`, `SearchStatus`
//!
//! # Credit Unit
//!
//! **1 credit = 1 contact search**
//!
//! - User buys the `growth` pack → gets 200 credits
//! - One email-verification search → deducts 1 credit
//! - Stored as `i64` to keep ledger arithmetic in plain integers
//!
//! The account key is the user's email address as verified by the upstream
//! identity service; this crate never derives identity itself.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod history;
pub mod ids;
pub mod packs;
pub mod purchase;

pub use account::Account;
pub use history::{SearchOperation, SearchQuery, SearchRecord, SearchStatus};
pub use ids::{Email, IdError, PurchaseId, RequestId};
pub use packs::{CreditPack, PackCatalog};
pub use purchase::{PurchaseOutcome, PurchaseRecord};
