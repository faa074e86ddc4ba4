//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store`
//! trait. Ledger updates take a per-account stripe lock around the
//! read-modify-write so debit/credit/reset on one email are linearizable;
//! nothing slow (and certainly no network call) ever runs under that lock.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use scout_billing_core::{Account, Email, PurchaseId, PurchaseRecord, RequestId, SearchRecord};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// Number of account lock stripes. Collisions only cost unnecessary
/// serialization between unrelated accounts, never correctness.
const LOCK_STRIPES: usize = 64;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    account_locks: Vec<Mutex<()>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path.as_ref(), cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(path = %path.as_ref().display(), "Opened RocksDB store");

        let account_locks = (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect();

        Ok(Self {
            db: Arc::new(db),
            account_locks,
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Acquire the lock stripe serializing updates to this account.
    fn account_lock(&self, email: &Email) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        email.as_bytes().hash(&mut hasher);
        #[allow(clippy::cast_possible_truncation)]
        let stripe = (hasher.finish() as usize) % self.account_locks.len();

        // A poisoned stripe only means another thread panicked mid-update;
        // the guarded data lives in RocksDB, so the lock itself is still valid.
        match self.account_locks[stripe].lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Write an account record. Callers must hold the account lock.
    fn put_account_locked(&self, account: &Account) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(&account.email);
        let value = Self::serialize(account)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    /// Iterate an email-prefixed index newest-first and load records.
    fn list_index<T, F, G>(
        &self,
        index_cf: &str,
        prefix: &[u8],
        limit: usize,
        offset: usize,
        extract: F,
        fetch: G,
    ) -> Result<Vec<T>>
    where
        F: Fn(&[u8]) -> Vec<u8>,
        G: Fn(&[u8]) -> Result<Option<T>>,
    {
        let cf_index = self.cf(index_cf)?;

        let iter = self.db.iterator_cf(
            &cf_index,
            IteratorMode::From(prefix, rocksdb::Direction::Forward),
        );

        // ULID suffixes sort oldest-first; collect matching keys, then walk
        // them in reverse for newest-first ordering.
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            all_keys.push(key.to_vec());
        }

        let mut records = Vec::new();
        for key in all_keys.iter().rev().skip(offset) {
            if records.len() >= limit {
                break;
            }
            if let Some(record) = fetch(&extract(key))? {
                records.push(record);
            }
        }

        Ok(records)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Ledger Operations
    // =========================================================================

    fn get_account(&self, email: &Email) -> Result<Option<Account>> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(email);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn balance(&self, email: &Email) -> Result<i64> {
        Ok(self.get_account(email)?.map_or(0, |account| account.credits))
    }

    fn debit(&self, email: &Email, amount: i64) -> Result<i64> {
        if amount <= 0 {
            return Err(StoreError::InvalidAmount(amount));
        }

        let _guard = self.account_lock(email);

        let mut account = self
            .get_account(email)?
            .unwrap_or_else(|| Account::new(email.clone()));

        if account.credits < amount {
            return Err(StoreError::InsufficientCredits {
                balance: account.credits,
                required: amount,
            });
        }

        account.credits -= amount;
        account.updated_at = chrono::Utc::now();
        self.put_account_locked(&account)?;

        Ok(account.credits)
    }

    fn credit(&self, email: &Email, amount: i64) -> Result<i64> {
        if amount <= 0 {
            return Err(StoreError::InvalidAmount(amount));
        }

        let _guard = self.account_lock(email);

        let mut account = self
            .get_account(email)?
            .unwrap_or_else(|| Account::new(email.clone()));

        account.credits += amount;
        account.updated_at = chrono::Utc::now();
        self.put_account_locked(&account)?;

        Ok(account.credits)
    }

    fn reset(&self, email: &Email) -> Result<i64> {
        let _guard = self.account_lock(email);

        let mut account = self
            .get_account(email)?
            .unwrap_or_else(|| Account::new(email.clone()));

        account.credits = 0;
        account.updated_at = chrono::Utc::now();
        self.put_account_locked(&account)?;

        Ok(0)
    }

    fn link_processor_customer(&self, email: &Email, customer_id: &str) -> Result<()> {
        let _guard = self.account_lock(email);

        let mut account = self
            .get_account(email)?
            .unwrap_or_else(|| Account::new(email.clone()));

        if account.processor_customer_id.as_deref() == Some(customer_id) {
            return Ok(());
        }

        account.processor_customer_id = Some(customer_id.to_string());
        account.updated_at = chrono::Utc::now();
        self.put_account_locked(&account)
    }

    // =========================================================================
    // Purchase Records
    // =========================================================================

    fn put_purchase(&self, record: &PurchaseRecord) -> Result<()> {
        let cf_purchases = self.cf(cf::PURCHASES)?;
        let cf_by_email = self.cf(cf::PURCHASES_BY_EMAIL)?;
        let cf_by_charge = self.cf(cf::PURCHASES_BY_CHARGE)?;

        let purchase_key = keys::purchase_key(&record.id);
        let email_key = keys::email_purchase_key(&record.email, &record.id);
        let value = Self::serialize(record)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_purchases, &purchase_key, &value);
        batch.put_cf(&cf_by_email, &email_key, []);

        // Only succeeded purchases enter the charge index: the index answers
        // "have the credits for this charge already been granted?".
        if record.outcome.is_succeeded() {
            if let Some(charge_id) = &record.charge_id {
                batch.put_cf(&cf_by_charge, keys::charge_key(charge_id), &purchase_key);
            }
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_purchase(&self, purchase_id: &PurchaseId) -> Result<Option<PurchaseRecord>> {
        let cf = self.cf(cf::PURCHASES)?;
        let key = keys::purchase_key(purchase_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn find_purchase_by_charge(&self, charge_id: &str) -> Result<Option<PurchaseRecord>> {
        let cf_by_charge = self.cf(cf::PURCHASES_BY_CHARGE)?;
        let cf_purchases = self.cf(cf::PURCHASES)?;

        let Some(purchase_key) = self
            .db
            .get_cf(&cf_by_charge, keys::charge_key(charge_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        self.db
            .get_cf(&cf_purchases, purchase_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_purchases_by_email(
        &self,
        email: &Email,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PurchaseRecord>> {
        let prefix = keys::email_purchases_prefix(email);
        self.list_index(
            cf::PURCHASES_BY_EMAIL,
            &prefix,
            limit,
            offset,
            |key| keys::extract_purchase_id(key).to_bytes().to_vec(),
            |key_bytes| {
                let cf = self.cf(cf::PURCHASES)?;
                self.db
                    .get_cf(&cf, key_bytes)
                    .map_err(|e| StoreError::Database(e.to_string()))?
                    .map(|data| Self::deserialize(&data))
                    .transpose()
            },
        )
    }

    // =========================================================================
    // Search History
    // =========================================================================

    fn put_search(&self, record: &SearchRecord) -> Result<()> {
        let cf_searches = self.cf(cf::SEARCHES)?;
        let cf_by_email = self.cf(cf::SEARCHES_BY_EMAIL)?;

        let search_key = keys::search_key(&record.request_id);
        let email_key = keys::email_search_key(&record.email, &record.request_id);
        let value = Self::serialize(record)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_searches, &search_key, &value);
        batch.put_cf(&cf_by_email, &email_key, []);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_search(&self, request_id: &RequestId) -> Result<Option<SearchRecord>> {
        let cf = self.cf(cf::SEARCHES)?;
        let key = keys::search_key(request_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_searches_by_email(
        &self,
        email: &Email,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchRecord>> {
        let prefix = keys::email_searches_prefix(email);
        self.list_index(
            cf::SEARCHES_BY_EMAIL,
            &prefix,
            limit,
            offset,
            |key| keys::extract_request_id(key).to_bytes().to_vec(),
            |key_bytes| {
                let cf = self.cf(cf::SEARCHES)?;
                self.db
                    .get_cf(&cf, key_bytes)
                    .map_err(|e| StoreError::Database(e.to_string()))?
                    .map(|data| Self::deserialize(&data))
                    .transpose()
            },
        )
    }
}
