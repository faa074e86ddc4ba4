//! Database schema definitions and column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Ledger accounts, keyed by normalized email.
    pub const ACCOUNTS: &str = "accounts";

    /// Purchase records, keyed by `purchase_id` (ULID).
    pub const PURCHASES: &str = "purchases";

    /// Index: purchases by account, keyed by `email || 0x00 || purchase_id`.
    /// Value is empty (index only).
    pub const PURCHASES_BY_EMAIL: &str = "purchases_by_email";

    /// Index: succeeded purchases by processor charge ID, keyed by the
    /// charge ID. Value is the `purchase_id` bytes. This is the idempotency
    /// lookup for the credit step.
    pub const PURCHASES_BY_CHARGE: &str = "purchases_by_charge";

    /// Search history records, keyed by `request_id` (ULID).
    pub const SEARCHES: &str = "searches";

    /// Index: searches by account, keyed by `email || 0x00 || request_id`.
    /// Value is empty (index only).
    pub const SEARCHES_BY_EMAIL: &str = "searches_by_email";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::PURCHASES,
        cf::PURCHASES_BY_EMAIL,
        cf::PURCHASES_BY_CHARGE,
        cf::SEARCHES,
        cf::SEARCHES_BY_EMAIL,
    ]
}
