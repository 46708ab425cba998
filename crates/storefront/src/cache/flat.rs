use serde::Serialize;
use serde::de::DeserializeOwned;

use autosouq_core::{Account, Listing, Record};

use super::{KeyValueStore, KvError, keys};

/// Typed record arrays stored under the fixed flat-cache keys.
///
/// Every mutation is a read-modify-write of the whole array. Two writers on
/// the same backing store can interleave and lose an update; there is no
/// conflict detection.
#[derive(Clone, Debug)]
pub struct FlatCache<K> {
    store: K,
}

impl<K: KeyValueStore> FlatCache<K> {
    #[must_use]
    pub const fn new(store: K) -> Self {
        Self { store }
    }

    /// The underlying key-value store.
    #[must_use]
    pub const fn store(&self) -> &K {
        &self.store
    }

    /// All cached accounts (empty when the key is absent).
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the store cannot be read or the array is corrupt.
    pub async fn load_accounts(&self) -> Result<Vec<Account>, KvError> {
        self.load(keys::ACCOUNTS).await
    }

    /// Replace the cached accounts array.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the array cannot be written.
    pub async fn replace_accounts(&self, accounts: &[Account]) -> Result<(), KvError> {
        self.replace(keys::ACCOUNTS, accounts).await
    }

    /// Insert an account, or overwrite the cached one with the same id.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the array cannot be read or written.
    pub async fn upsert_account(&self, account: &Account) -> Result<(), KvError> {
        self.upsert(keys::ACCOUNTS, account).await
    }

    /// All cached listings (empty when the key is absent).
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the store cannot be read or the array is corrupt.
    pub async fn load_listings(&self) -> Result<Vec<Listing>, KvError> {
        self.load(keys::LISTINGS).await
    }

    /// Replace the cached listings array.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the array cannot be written.
    pub async fn replace_listings(&self, listings: &[Listing]) -> Result<(), KvError> {
        self.replace(keys::LISTINGS, listings).await
    }

    /// Insert a listing, or overwrite the cached one with the same id.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the array cannot be read or written.
    pub async fn upsert_listing(&self, listing: &Listing) -> Result<(), KvError> {
        self.upsert(keys::LISTINGS, listing).await
    }

    /// Drop every flat-cache key, the session included.
    ///
    /// # Errors
    ///
    /// Returns the first `KvError` hit; later keys are still attempted.
    pub async fn clear(&self) -> Result<(), KvError> {
        let mut first_error = None;
        for key in [keys::ACCOUNTS, keys::LISTINGS, keys::CURRENT_USER] {
            if let Err(e) = self.store.remove(key).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, KvError> {
        match self.store.get(key).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn replace<T: Serialize + Sync>(&self, key: &str, records: &[T]) -> Result<(), KvError> {
        let raw = serde_json::to_string(records)?;
        self.store.set(key, raw).await
    }

    async fn upsert<T>(&self, key: &str, record: &T) -> Result<(), KvError>
    where
        T: Record + Serialize + DeserializeOwned + Clone + Send + Sync,
    {
        let mut records: Vec<T> = self.load(key).await?;
        match records
            .iter_mut()
            .find(|existing| existing.record_key() == record.record_key())
        {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.replace(key, &records).await
    }
}
