//! `RocksDB` storage layer for scout-billing.
//!
//! This crate provides persistent storage for the credit ledger, purchase
//! records, and search history using `RocksDB` with column families for
//! indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `accounts`: ledger accounts, keyed by normalized email
//! - `purchases`: purchase records, keyed by `purchase_id` (ULID)
//! - `purchases_by_email`: index for listing purchases per account
//! - `purchases_by_charge`: idempotency index, charge ID → purchase ID
//! - `searches`: search history records, keyed by `request_id` (ULID)
//! - `searches_by_email`: index for listing searches per account
//!
//! # Ledger semantics
//!
//! `debit`, `credit`, and `reset` on the same email are serialized against
//! each other: the check-then-act in `debit` is indivisible, so a debit can
//! never drive a balance negative, and two concurrent debits against one
//! remaining credit resolve to exactly one success. Operations on different
//! accounts proceed in parallel.
//!
//! # Example
//!
//! ```no_run
//! use scout_billing_store::{RocksStore, Store};
//! use scout_billing_core::Email;
//!
//! let store = RocksStore::open("/tmp/scout-billing-db").unwrap();
//! let email: Email = "user@example.com".parse().unwrap();
//!
//! let balance = store.credit(&email, 50).unwrap();
//! assert_eq!(balance, 50);
//! assert_eq!(store.balance(&email).unwrap(), 50);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use scout_billing_core::{Account, Email, PurchaseId, PurchaseRecord, RequestId, SearchRecord};

/// The storage trait defining ledger and history operations.
///
/// This trait abstracts the storage layer so the service and the purchase
/// orchestrator are testable against the same interface.
pub trait Store: Send + Sync {
    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Get an account record by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, email: &Email) -> Result<Option<Account>>;

    /// Read the current balance. A missing account reads as 0.
    ///
    /// Never mutates state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn balance(&self, email: &Email) -> Result<i64>;

    /// Atomically deduct `amount` credits and return the new balance.
    ///
    /// The balance check and the decrement are one indivisible step,
    /// serialized per account.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if `amount <= 0`.
    /// - `StoreError::InsufficientCredits` if the balance is too low; the
    ///   balance is left unchanged.
    fn debit(&self, email: &Email, amount: i64) -> Result<i64>;

    /// Atomically add `amount` credits and return the new balance.
    ///
    /// Creates the account at `amount` if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidAmount` if `amount <= 0`.
    fn credit(&self, email: &Email, amount: i64) -> Result<i64>;

    /// Unconditionally set the balance to 0 (operator tooling only).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn reset(&self, email: &Email) -> Result<i64>;

    /// Remember the payment-processor customer ID for an account,
    /// creating the account if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn link_processor_customer(&self, email: &Email, customer_id: &str) -> Result<()>;

    // =========================================================================
    // Purchase Records
    // =========================================================================

    /// Append a purchase record and maintain its indexes.
    ///
    /// Succeeded records are additionally indexed by their charge ID for
    /// the idempotency lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_purchase(&self, record: &PurchaseRecord) -> Result<()>;

    /// Get a purchase record by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_purchase(&self, purchase_id: &PurchaseId) -> Result<Option<PurchaseRecord>>;

    /// Find the succeeded purchase record for a processor charge ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_purchase_by_charge(&self, charge_id: &str) -> Result<Option<PurchaseRecord>>;

    /// List purchase records for an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_purchases_by_email(
        &self,
        email: &Email,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PurchaseRecord>>;

    // =========================================================================
    // Search History
    // =========================================================================

    /// Append a search history record and maintain its index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_search(&self, record: &SearchRecord) -> Result<()>;

    /// Get a search history record by request ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_search(&self, request_id: &RequestId) -> Result<Option<SearchRecord>>;

    /// List search history records for an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_searches_by_email(
        &self,
        email: &Email,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchRecord>>;
}
