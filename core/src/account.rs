//! Account types for scout-billing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Email;

/// A credit ledger account for a user.
///
/// One record per email address. The balance is the single authoritative
/// count of remaining searches; it never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// The account key: the user's verified email address.
    pub email: Email,

    /// Current credit balance. Invariant: `credits >= 0`.
    pub credits: i64,

    /// Payment-processor customer ID, once one has been created.
    pub processor_customer_id: Option<String>,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with zero balance.
    #[must_use]
    pub fn new(email: Email) -> Self {
        let now = Utc::now();
        Self {
            email,
            credits: 0,
            processor_customer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the account has sufficient credits for a debit.
    #[must_use]
    pub fn has_sufficient_credits(&self, amount: i64) -> bool {
        self.credits >= amount
    }
}
