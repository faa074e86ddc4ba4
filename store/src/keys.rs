//! Key encoding utilities for `RocksDB`.
//!
//! Account keys are the normalized email bytes. Per-account index keys are
//! `email || 0x00 || ulid`; the NUL separator cannot occur in a normalized
//! email, and ULIDs are time-ordered, so index entries for one account sort
//! chronologically.

use scout_billing_core::{Email, PurchaseId, RequestId};

/// Separator between the email prefix and the ULID suffix in index keys.
const SEP: u8 = 0x00;

/// Length of a ULID in bytes.
const ULID_LEN: usize = 16;

/// Create an account key from an email.
#[must_use]
pub fn account_key(email: &Email) -> Vec<u8> {
    email.as_bytes().to_vec()
}

/// Create a purchase key from a purchase ID.
#[must_use]
pub fn purchase_key(purchase_id: &PurchaseId) -> Vec<u8> {
    purchase_id.to_bytes().to_vec()
}

/// Create an email-purchase index key.
#[must_use]
pub fn email_purchase_key(email: &Email, purchase_id: &PurchaseId) -> Vec<u8> {
    index_key(email, purchase_id.to_bytes())
}

/// Create a prefix for iterating all purchases for an account.
#[must_use]
pub fn email_purchases_prefix(email: &Email) -> Vec<u8> {
    index_prefix(email)
}

/// Extract the purchase ID from an email-purchase index key.
///
/// # Panics
///
/// Panics if the key does not end in 16 ULID bytes.
#[must_use]
pub fn extract_purchase_id(key: &[u8]) -> PurchaseId {
    PurchaseId::from_bytes(ulid_suffix(key)).expect("valid ULID bytes")
}

/// Create a charge-index key from a processor charge ID.
#[must_use]
pub fn charge_key(charge_id: &str) -> Vec<u8> {
    charge_id.as_bytes().to_vec()
}

/// Create a search key from a request ID.
#[must_use]
pub fn search_key(request_id: &RequestId) -> Vec<u8> {
    request_id.to_bytes().to_vec()
}

/// Create an email-search index key.
#[must_use]
pub fn email_search_key(email: &Email, request_id: &RequestId) -> Vec<u8> {
    index_key(email, request_id.to_bytes())
}

/// Create a prefix for iterating all searches for an account.
#[must_use]
pub fn email_searches_prefix(email: &Email) -> Vec<u8> {
    index_prefix(email)
}

/// Extract the request ID from an email-search index key.
///
/// # Panics
///
/// Panics if the key does not end in 16 ULID bytes.
#[must_use]
pub fn extract_request_id(key: &[u8]) -> RequestId {
    RequestId::from_bytes(ulid_suffix(key)).expect("valid ULID bytes")
}

fn index_key(email: &Email, ulid_bytes: [u8; 16]) -> Vec<u8> {
    let mut key = Vec::with_capacity(email.as_bytes().len() + 1 + ULID_LEN);
    key.extend_from_slice(email.as_bytes());
    key.push(SEP);
    key.extend_from_slice(&ulid_bytes);
    key
}

fn index_prefix(email: &Email) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(email.as_bytes().len() + 1);
    prefix.extend_from_slice(email.as_bytes());
    prefix.push(SEP);
    prefix
}

fn ulid_suffix(key: &[u8]) -> [u8; 16] {
    assert!(key.len() > ULID_LEN, "index key too short");
    let mut bytes = [0u8; ULID_LEN];
    bytes.copy_from_slice(&key[key.len() - ULID_LEN..]);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> Email {
        "user@example.com".parse().unwrap()
    }

    #[test]
    fn account_key_is_email_bytes() {
        assert_eq!(account_key(&email()), b"user@example.com".to_vec());
    }

    #[test]
    fn purchase_index_key_format() {
        let id = PurchaseId::generate();
        let key = email_purchase_key(&email(), &id);

        assert!(key.starts_with(&email_purchases_prefix(&email())));
        assert_eq!(&key[key.len() - 16..], id.to_bytes());
    }

    #[test]
    fn extract_purchase_id_roundtrip() {
        let id = PurchaseId::generate();
        let key = email_purchase_key(&email(), &id);
        assert_eq!(extract_purchase_id(&key), id);
    }

    #[test]
    fn extract_request_id_roundtrip() {
        let id = RequestId::generate();
        let key = email_search_key(&email(), &id);
        assert_eq!(extract_request_id(&key), id);
    }

    #[test]
    fn prefixes_for_distinct_emails_do_not_collide() {
        let a: Email = "ann@example.com".parse().unwrap();
        let ab: Email = "ann@example.com.au".parse().unwrap();
        let id = RequestId::generate();

        let key = email_search_key(&ab, &id);
        assert!(!key.starts_with(&email_searches_prefix(&a)));
    }
}
