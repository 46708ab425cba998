//! Dual-store synchronizer.
//!
//! Writes go through to both local stores: the flat cache first, then the
//! embedded store. Reads prefer the embedded store and fall back to the flat
//! cache. No operation returns an error; every result carries a
//! [`SyncStatus`] saying which stores took part, and every swallowed failure
//! is logged.
//!
//! There is no locking, retry or timeout. A store that fails is simply
//! skipped for that call and tried again on the next one.
//!
//! See [`reconcile`] for how rows held by both stores are merged. A cached
//! account whose email the embedded store already assigns to another id is
//! dropped rather than repaired.

pub mod reconcile;
mod stored;

use std::collections::HashSet;

use tracing::{debug, instrument, warn};

use autosouq_core::{Account, AccountId, Email, Listing, ListingId, SyncOutcome, SyncStatus};

use crate::cache::{FlatCache, KeyValueStore};
use crate::db::{EmbeddedStore, RepositoryError};
use reconcile::reconcile;
use stored::Stored;

/// The flat cache plus an optional embedded store.
///
/// `embedded` is `None` where no embedded store can be opened; every
/// operation then runs against the flat cache alone.
#[derive(Clone, Debug)]
pub struct DualStore<K, E> {
    cache: FlatCache<K>,
    embedded: Option<E>,
}

impl<K: KeyValueStore, E: EmbeddedStore> DualStore<K, E> {
    #[must_use]
    pub const fn new(kv: K, embedded: Option<E>) -> Self {
        Self {
            cache: FlatCache::new(kv),
            embedded,
        }
    }

    /// A synchronizer without an embedded store.
    #[must_use]
    pub const fn cache_only(kv: K) -> Self {
        Self::new(kv, None)
    }

    #[must_use]
    pub const fn cache(&self) -> &FlatCache<K> {
        &self.cache
    }

    #[must_use]
    pub const fn embedded(&self) -> Option<&E> {
        self.embedded.as_ref()
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Write an account to the flat cache, then to the embedded store.
    ///
    /// The account is durable when the returned status
    /// [`is_durable`](SyncStatus::is_durable).
    #[instrument(skip(self, account), fields(account_id = %account.id))]
    pub async fn save_account(&self, account: &Account) -> SyncStatus {
        self.save(account).await
    }

    /// All accounts, oldest first.
    #[instrument(skip(self))]
    pub async fn load_accounts(&self) -> SyncOutcome<Vec<Account>> {
        self.load_all().await
    }

    /// Account by email through the unique index, then the flat cache.
    ///
    /// An account found only in the flat cache is written back into the
    /// embedded store.
    #[instrument(skip(self, email))]
    pub async fn find_account_by_email(&self, email: &Email) -> SyncOutcome<Option<Account>> {
        let indexed = match &self.embedded {
            Some(db) => Some(db.account_by_email(email).await),
            None => None,
        };
        self.lookup(indexed, |account| &account.email == email).await
    }

    /// Account by id, same policy as [`find_account_by_email`](Self::find_account_by_email).
    #[instrument(skip(self), fields(account_id = %id))]
    pub async fn find_account(&self, id: &AccountId) -> SyncOutcome<Option<Account>> {
        let indexed = match &self.embedded {
            Some(db) => Some(db.account_by_id(id).await),
            None => None,
        };
        self.lookup(indexed, |account| &account.id == id).await
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Write a listing to the flat cache, then to the embedded store.
    #[instrument(skip(self, listing), fields(listing_id = %listing.id))]
    pub async fn save_listing(&self, listing: &Listing) -> SyncStatus {
        self.save(listing).await
    }

    /// All listings, newest first.
    #[instrument(skip(self))]
    pub async fn load_listings(&self) -> SyncOutcome<Vec<Listing>> {
        self.load_all().await
    }

    /// Listing by id.
    #[instrument(skip(self), fields(listing_id = %id))]
    pub async fn find_listing(&self, id: &ListingId) -> SyncOutcome<Option<Listing>> {
        let indexed = match &self.embedded {
            Some(db) => Some(db.listing_by_id(id).await),
            None => None,
        };
        self.lookup(indexed, |listing| &listing.id == id).await
    }

    /// Listings of one owner, newest first.
    ///
    /// Uses the owner index when the embedded store is present, otherwise
    /// filters [`load_listings`](Self::load_listings). Both paths return the
    /// same rows.
    #[instrument(skip(self), fields(owner_id = %owner_id))]
    pub async fn listings_by_owner(&self, owner_id: &AccountId) -> SyncOutcome<Vec<Listing>> {
        let Some(db) = &self.embedded else {
            return self
                .load_listings()
                .await
                .map(|all| all.into_iter().filter(|l| &l.owner_id == owner_id).collect());
        };

        let mut rows = match db.listings_by_owner(owner_id).await {
            Ok(rows) => rows,
            Err(e) => {
                embedded_failed(Listing::KIND, "listings_by_owner", &e);
                return self
                    .cached_rows::<Listing>()
                    .await
                    .map(|all| all.into_iter().filter(|l| &l.owner_id == owner_id).collect());
            }
        };

        let cached = match self.cache.load_listings().await {
            Ok(cached) => Some(cached),
            Err(e) => {
                warn!(store = "flat_cache", op = "listings_by_owner", error = %e, "Flat cache read failed");
                None
            }
        };
        let cache_ok = cached.is_some();

        for listing in cached
            .unwrap_or_default()
            .into_iter()
            .filter(|l| &l.owner_id == owner_id)
        {
            if rows.iter().any(|r| r.id == listing.id) {
                continue;
            }
            // A cached row the index did not return is either missing from the
            // embedded store or owned by someone else there.
            match db.listing_by_id(&listing.id).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    if self.repair(db, &listing).await != Repair::Rejected {
                        rows.push(listing);
                    }
                }
                Err(e) => {
                    embedded_failed(Listing::KIND, "listing_by_id", &e);
                    rows.push(listing);
                }
            }
        }

        Listing::sort(&mut rows);
        SyncOutcome::new(rows, SyncStatus::from_parts(cache_ok, true))
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Wipe every account, listing and the session from both stores.
    #[instrument(skip(self))]
    pub async fn clear_local(&self) -> SyncStatus {
        let cache_ok = match self.cache.clear().await {
            Ok(()) => true,
            Err(e) => {
                warn!(store = "flat_cache", op = "clear", error = %e, "Flat cache clear failed");
                false
            }
        };

        let embedded_ok = match &self.embedded {
            Some(db) => match db.clear().await {
                Ok(()) => true,
                Err(e) => {
                    embedded_failed("all", "clear", &e);
                    false
                }
            },
            None => false,
        };

        SyncStatus::from_parts(cache_ok, embedded_ok)
    }

    // =========================================================================
    // Policy
    // =========================================================================

    async fn save<T: Stored>(&self, record: &T) -> SyncStatus {
        let cache_ok = match T::upsert_cached(&self.cache, record).await {
            Ok(()) => true,
            Err(e) => {
                warn!(store = "flat_cache", kind = T::KIND, op = "save", error = %e, "Flat cache write failed");
                false
            }
        };

        let embedded_ok = match &self.embedded {
            Some(db) => match T::put(db, record).await {
                Ok(()) => true,
                Err(e) => {
                    embedded_failed(T::KIND, "save", &e);
                    false
                }
            },
            None => false,
        };

        let status = SyncStatus::from_parts(cache_ok, embedded_ok);
        if status.is_degraded() {
            debug!(kind = T::KIND, %status, "Saved with degraded status");
        }
        status
    }

    async fn load_all<T: Stored>(&self) -> SyncOutcome<Vec<T>> {
        let Some(db) = &self.embedded else {
            return self.cached_rows().await;
        };

        let embedded = match T::load_all(db).await {
            Ok(rows) => rows,
            Err(e) => {
                embedded_failed(T::KIND, "load", &e);
                return self.cached_rows().await;
            }
        };

        let cached = match T::load_cached(&self.cache).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(store = "flat_cache", kind = T::KIND, op = "load", error = %e, "Flat cache read failed, rewriting it");
                Vec::new()
            }
        };

        let reconciled = reconcile(embedded, cached);
        let mut rejected = HashSet::new();
        for record in &reconciled.cache_only {
            if self.repair(db, record).await == Repair::Rejected {
                rejected.insert(record.record_key().to_owned());
            }
        }

        let mut rows = reconciled.merged;
        rows.retain(|row| !rejected.contains(row.record_key()));
        T::sort(&mut rows);

        let cache_ok = match T::replace_cached(&self.cache, &rows).await {
            Ok(()) => true,
            Err(e) => {
                warn!(store = "flat_cache", kind = T::KIND, op = "load", error = %e, "Flat cache write-back failed");
                false
            }
        };

        SyncOutcome::new(rows, SyncStatus::from_parts(cache_ok, true))
    }

    /// Serve a lookup from the embedded result, falling back to the flat cache.
    ///
    /// `indexed` is `None` when there is no embedded store.
    async fn lookup<T: Stored>(
        &self,
        indexed: Option<Result<Option<T>, RepositoryError>>,
        matches: impl Fn(&T) -> bool + Send,
    ) -> SyncOutcome<Option<T>> {
        let embedded_ok = match indexed {
            Some(Ok(Some(found))) => return SyncOutcome::new(Some(found), SyncStatus::Synced),
            Some(Ok(None)) => true,
            Some(Err(e)) => {
                embedded_failed(T::KIND, "lookup", &e);
                false
            }
            None => false,
        };

        let cached = match T::load_cached(&self.cache).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(store = "flat_cache", kind = T::KIND, op = "lookup", error = %e, "Flat cache read failed");
                let status = SyncStatus::from_parts(false, embedded_ok);
                return SyncOutcome::new(None, status);
            }
        };

        let Some(found) = cached.into_iter().find(|record| matches(record)) else {
            return SyncOutcome::new(None, SyncStatus::from_parts(true, embedded_ok));
        };

        let db = match (&self.embedded, embedded_ok) {
            (Some(db), true) => db,
            _ => return SyncOutcome::new(Some(found), SyncStatus::from_parts(true, false)),
        };

        // The index missed, but the embedded store may still hold this key
        // with different contents. Its copy wins and the cached row is stale.
        match T::stored_copy(db, &found).await {
            Ok(Some(_)) => {
                debug!(kind = T::KIND, key = found.record_key(), "Cached row superseded by embedded store");
                return SyncOutcome::new(None, SyncStatus::Synced);
            }
            Ok(None) => {}
            Err(e) => {
                embedded_failed(T::KIND, "lookup", &e);
                return SyncOutcome::new(Some(found), SyncStatus::CachedOnly);
            }
        }

        // Found only in the flat cache: repair the embedded store.
        match self.repair(db, &found).await {
            Repair::Written => SyncOutcome::new(Some(found), SyncStatus::Synced),
            Repair::Rejected => SyncOutcome::new(None, SyncStatus::Synced),
            Repair::Failed => SyncOutcome::new(Some(found), SyncStatus::CachedOnly),
        }
    }

    async fn cached_rows<T: Stored>(&self) -> SyncOutcome<Vec<T>> {
        match T::load_cached(&self.cache).await {
            Ok(mut rows) => {
                T::sort(&mut rows);
                debug!(kind = T::KIND, count = rows.len(), "Served from flat cache only");
                SyncOutcome::new(rows, SyncStatus::CachedOnly)
            }
            Err(e) => {
                warn!(store = "flat_cache", kind = T::KIND, op = "load", error = %e, "Both stores failed");
                SyncOutcome::failed()
            }
        }
    }

    /// Write a cache-only record into the embedded store.
    async fn repair<T: Stored>(&self, db: &E, record: &T) -> Repair {
        match T::put(db, record).await {
            Ok(()) => {
                debug!(kind = T::KIND, key = record.record_key(), "Repaired embedded store from flat cache");
                Repair::Written
            }
            Err(e @ RepositoryError::Conflict(_)) => {
                warn!(kind = T::KIND, key = record.record_key(), error = %e, "Cached row conflicts with embedded store, dropping it");
                Repair::Rejected
            }
            Err(e) => {
                embedded_failed(T::KIND, "repair", &e);
                Repair::Failed
            }
        }
    }
}

/// Result of writing a cache-only row back into the embedded store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repair {
    Written,
    /// A unique index rejected the row; the embedded store holds the
    /// authoritative owner of that value.
    Rejected,
    Failed,
}

fn embedded_failed(kind: &str, op: &str, error: &RepositoryError) {
    warn!(store = "embedded", kind, op, error = %error, "Embedded store operation failed");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{Duration, TimeZone, Utc};

    use autosouq_core::Price;

    use super::*;
    use crate::cache::{FileKeyValueStore, MemoryKeyValueStore, keys};
    use crate::db::{SqliteEmbeddedStore, create_memory_pool};

    /// Embedded store that fails every call.
    #[derive(Default)]
    struct FailingEmbedded {
        calls: AtomicUsize,
    }

    impl FailingEmbedded {
        fn fail<T>(&self) -> Result<T, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    impl EmbeddedStore for FailingEmbedded {
        async fn put_account(&self, _: &Account) -> Result<(), RepositoryError> {
            self.fail()
        }
        async fn all_accounts(&self) -> Result<Vec<Account>, RepositoryError> {
            self.fail()
        }
        async fn account_by_id(&self, _: &AccountId) -> Result<Option<Account>, RepositoryError> {
            self.fail()
        }
        async fn account_by_email(&self, _: &Email) -> Result<Option<Account>, RepositoryError> {
            self.fail()
        }
        async fn put_listing(&self, _: &Listing) -> Result<(), RepositoryError> {
            self.fail()
        }
        async fn all_listings(&self) -> Result<Vec<Listing>, RepositoryError> {
            self.fail()
        }
        async fn listing_by_id(&self, _: &ListingId) -> Result<Option<Listing>, RepositoryError> {
            self.fail()
        }
        async fn listings_by_owner(&self, _: &AccountId) -> Result<Vec<Listing>, RepositoryError> {
            self.fail()
        }
        async fn clear(&self) -> Result<(), RepositoryError> {
            self.fail()
        }
    }

    async fn sqlite() -> SqliteEmbeddedStore {
        let store = SqliteEmbeddedStore::new(create_memory_pool().await.unwrap());
        store.migrate().await.unwrap();
        store
    }

    fn account(id: &str, email: &str) -> Account {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Account {
            id: AccountId::new(id),
            name: format!("Seller {id}"),
            email: Email::parse(email).unwrap(),
            password_hash: "$argon2id$stub".to_string(),
            phone: None,
            location: Some("Dubai".to_string()),
            created_at: at,
            updated_at: at,
        }
    }

    fn listing(id: &str, owner: &str, price: i64, age_days: i64) -> Listing {
        Listing {
            id: ListingId::new(id),
            title: format!("Listing {id}"),
            make: "Mercedes-Benz".to_string(),
            model: "S-Class".to_string(),
            year: 2019,
            price: Price::whole(price),
            mileage: 45_000,
            location: "Dubai".to_string(),
            description: String::new(),
            image_url: None,
            owner_id: AccountId::new(owner),
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
                - Duration::days(age_days),
        }
    }

    #[tokio::test]
    async fn test_write_through_and_indexed_reads() {
        let store = DualStore::new(MemoryKeyValueStore::new(), Some(sqlite().await));

        let status = store.save_account(&account("u1", "a@x.com")).await;
        assert_eq!(status, SyncStatus::Synced);
        let status = store.save_listing(&listing("l1", "u1", 1000, 0)).await;
        assert_eq!(status, SyncStatus::Synced);

        let found = store
            .find_account_by_email(&Email::parse("a@x.com").unwrap())
            .await;
        assert_eq!(found.value.unwrap().id.as_str(), "u1");
        assert_eq!(found.status, SyncStatus::Synced);

        let mine = store.listings_by_owner(&AccountId::new("u1")).await;
        assert_eq!(mine.value.len(), 1);
        assert_eq!(mine.value[0].price, Price::whole(1000));

        let cached = store.cache().load_listings().await.unwrap();
        assert_eq!(cached.len(), 1);
    }

    #[tokio::test]
    async fn test_save_survives_embedded_failure() {
        let store = DualStore::new(MemoryKeyValueStore::new(), Some(FailingEmbedded::default()));

        let status = store.save_account(&account("u1", "a@x.com")).await;
        assert_eq!(status, SyncStatus::CachedOnly);
        assert!(status.is_durable());

        let loaded = store.load_accounts().await;
        assert_eq!(loaded.status, SyncStatus::CachedOnly);
        assert_eq!(loaded.value.len(), 1);

        let found = store
            .find_account_by_email(&Email::parse("a@x.com").unwrap())
            .await;
        assert_eq!(found.value.unwrap().id.as_str(), "u1");
        assert_eq!(found.status, SyncStatus::CachedOnly);
    }

    #[tokio::test]
    async fn test_both_stores_failing_yields_empty_failed() {
        let kv = MemoryKeyValueStore::new();
        kv.set(keys::LISTINGS, "garbage".to_string()).await.unwrap();
        let store = DualStore::new(kv, Some(FailingEmbedded::default()));

        let loaded = store.load_listings().await;
        assert!(loaded.value.is_empty());
        assert_eq!(loaded.status, SyncStatus::Failed);

        let mine = store.listings_by_owner(&AccountId::new("u1")).await;
        assert!(mine.value.is_empty());
        assert_eq!(mine.status, SyncStatus::Failed);
    }

    #[tokio::test]
    async fn test_load_overwrites_cache_with_embedded_rows() {
        let db = sqlite().await;
        db.put_listing(&listing("l1", "u1", 1000, 0)).await.unwrap();

        let kv = MemoryKeyValueStore::new();
        let cache = FlatCache::new(kv.clone());
        cache
            .replace_listings(&[listing("l1", "u1", 9999, 0)])
            .await
            .unwrap();

        let store = DualStore::new(kv, Some(db));
        let loaded = store.load_listings().await;
        assert_eq!(loaded.status, SyncStatus::Synced);
        assert_eq!(loaded.value.len(), 1);
        assert_eq!(loaded.value[0].price, Price::whole(1000));

        let cached = cache.load_listings().await.unwrap();
        assert_eq!(cached[0].price, Price::whole(1000));
    }

    #[tokio::test]
    async fn test_cache_only_rows_are_kept_and_repaired() {
        let db = sqlite().await;
        db.put_listing(&listing("l1", "u1", 1000, 1)).await.unwrap();

        let kv = MemoryKeyValueStore::new();
        FlatCache::new(kv.clone())
            .replace_listings(&[listing("l2", "u1", 2000, 0)])
            .await
            .unwrap();

        let store = DualStore::new(kv, Some(db));
        let loaded = store.load_listings().await;
        let ids: Vec<_> = loaded.value.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["l2", "l1"]);

        let repaired = store
            .embedded()
            .unwrap()
            .listing_by_id(&ListingId::new("l2"))
            .await
            .unwrap();
        assert!(repaired.is_some());
    }

    #[tokio::test]
    async fn test_find_by_email_repairs_drift() {
        let kv = MemoryKeyValueStore::new();
        FlatCache::new(kv.clone())
            .upsert_account(&account("u1", "a@x.com"))
            .await
            .unwrap();

        let store = DualStore::new(kv, Some(sqlite().await));
        let found = store
            .find_account_by_email(&Email::parse("a@x.com").unwrap())
            .await;
        assert_eq!(found.status, SyncStatus::Synced);
        assert_eq!(found.value.unwrap().id.as_str(), "u1");

        let indexed = store
            .embedded()
            .unwrap()
            .account_by_email(&Email::parse("a@x.com").unwrap())
            .await
            .unwrap();
        assert!(indexed.is_some());
    }

    #[tokio::test]
    async fn test_missing_account_is_none_not_error() {
        let store = DualStore::new(MemoryKeyValueStore::new(), Some(sqlite().await));
        let found = store.find_account(&AccountId::new("nobody")).await;
        assert!(found.value.is_none());
        assert_eq!(found.status, SyncStatus::Synced);
    }

    #[tokio::test]
    async fn test_owner_query_paths_agree() {
        let rows = [
            listing("l1", "u1", 1000, 3),
            listing("l2", "u2", 2000, 2),
            listing("l3", "u1", 3000, 1),
        ];

        let indexed_kv = MemoryKeyValueStore::new();
        let indexed = DualStore::new(indexed_kv.clone(), Some(sqlite().await));
        let scanned: DualStore<_, SqliteEmbeddedStore> =
            DualStore::cache_only(MemoryKeyValueStore::new());
        for row in &rows {
            indexed.save_listing(row).await;
            scanned.save_listing(row).await;
        }
        // A row that only reached the flat cache.
        let stray = listing("l4", "u1", 4000, 0);
        FlatCache::new(indexed_kv).upsert_listing(&stray).await.unwrap();
        scanned.save_listing(&stray).await;

        let owner = AccountId::new("u1");
        let via_index = indexed.listings_by_owner(&owner).await.into_value();
        let via_scan = scanned.listings_by_owner(&owner).await.into_value();

        assert_eq!(via_index, via_scan);
        let ids: Vec<_> = via_index.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["l4", "l3", "l1"]);
    }

    #[tokio::test]
    async fn test_owner_query_respects_embedded_owner() {
        let db = sqlite().await;
        db.put_listing(&listing("l1", "u2", 1000, 0)).await.unwrap();

        let kv = MemoryKeyValueStore::new();
        FlatCache::new(kv.clone())
            .upsert_listing(&listing("l1", "u1", 1000, 0))
            .await
            .unwrap();

        let store = DualStore::new(kv, Some(db));
        let mine = store.listings_by_owner(&AccountId::new("u1")).await;
        assert!(mine.value.is_empty());
        let theirs = store.listings_by_owner(&AccountId::new("u2")).await;
        assert_eq!(theirs.value.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_cached_account_does_not_overwrite_embedded() {
        let db = sqlite().await;
        db.put_account(&account("u1", "b@x.com")).await.unwrap();

        let kv = MemoryKeyValueStore::new();
        FlatCache::new(kv.clone())
            .upsert_account(&account("u1", "a@x.com"))
            .await
            .unwrap();

        let store = DualStore::new(kv, Some(db));
        let stale = store
            .find_account_by_email(&Email::parse("a@x.com").unwrap())
            .await;
        assert!(stale.value.is_none());
        assert_eq!(stale.status, SyncStatus::Synced);

        let current = store
            .find_account_by_email(&Email::parse("b@x.com").unwrap())
            .await;
        assert_eq!(current.value.unwrap().id.as_str(), "u1");

        let stored = store
            .embedded()
            .unwrap()
            .account_by_id(&AccountId::new("u1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.email.as_str(), "b@x.com");
    }

    #[tokio::test]
    async fn test_cached_account_with_taken_email_is_dropped() {
        let db = sqlite().await;
        db.put_account(&account("u1", "a@x.com")).await.unwrap();

        let kv = MemoryKeyValueStore::new();
        FlatCache::new(kv.clone())
            .replace_accounts(&[account("u2", "a@x.com"), account("u3", "c@x.com")])
            .await
            .unwrap();

        let store = DualStore::new(kv, Some(db));
        let loaded = store.load_accounts().await;
        assert_eq!(loaded.status, SyncStatus::Synced);
        let ids: Vec<_> = loaded.value.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["u1", "u3"]);

        let cached = store.cache().load_accounts().await.unwrap();
        assert_eq!(cached.len(), 2);
        assert!(cached.iter().all(|a| a.id.as_str() != "u2"));

        let orphan = store.find_account(&AccountId::new("u2")).await;
        assert!(orphan.value.is_none());
    }

    #[tokio::test]
    async fn test_distinct_saves_and_resave_with_both_stores() {
        let store = DualStore::new(MemoryKeyValueStore::new(), Some(sqlite().await));

        for (id, age) in [("l1", 2), ("l2", 1), ("l3", 0)] {
            let status = store.save_listing(&listing(id, "u1", 1000, age)).await;
            assert_eq!(status, SyncStatus::Synced);
        }
        assert_eq!(
            store.save_listing(&listing("l2", "u1", 5000, 1)).await,
            SyncStatus::Synced
        );

        let loaded = store.load_listings().await;
        assert_eq!(loaded.status, SyncStatus::Synced);
        assert_eq!(loaded.value.len(), 3);
        let resaved = loaded.value.iter().find(|l| l.id.as_str() == "l2").unwrap();
        assert_eq!(resaved.price, Price::whole(5000));

        let embedded = store.embedded().unwrap().all_listings().await.unwrap();
        assert_eq!(embedded.len(), 3);
        assert_eq!(store.cache().load_listings().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_corrupt_cache_file_is_rewritten_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        tokio::fs::write(&path, b"not json").await.unwrap();
        let store = DualStore::new(FileKeyValueStore::new(&path), Some(sqlite().await));

        assert_eq!(
            store.save_account(&account("u1", "a@x.com")).await,
            SyncStatus::EmbeddedOnly
        );

        let loaded = store.load_accounts().await;
        assert_eq!(loaded.status, SyncStatus::Synced);
        assert_eq!(loaded.value.len(), 1);
        assert_eq!(store.cache().load_accounts().await.unwrap().len(), 1);

        assert_eq!(
            store.save_listing(&listing("l1", "u1", 1000, 0)).await,
            SyncStatus::Synced
        );
    }

    #[tokio::test]
    async fn test_clear_local_replaces_corrupt_cache_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        tokio::fs::write(&path, b"not json").await.unwrap();
        let store = DualStore::new(FileKeyValueStore::new(&path), Some(sqlite().await));

        assert_eq!(store.clear_local().await, SyncStatus::Synced);
        assert!(store.cache().load_listings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_only_mode() {
        let store: DualStore<_, SqliteEmbeddedStore> =
            DualStore::cache_only(MemoryKeyValueStore::new());

        assert_eq!(
            store.save_account(&account("u1", "a@x.com")).await,
            SyncStatus::CachedOnly
        );
        let loaded = store.load_accounts().await;
        assert_eq!(loaded.status, SyncStatus::CachedOnly);
        assert_eq!(loaded.value.len(), 1);
        assert!(store.embedded().is_none());
    }

    #[tokio::test]
    async fn test_clear_local_wipes_both_stores() {
        let store = DualStore::new(MemoryKeyValueStore::new(), Some(sqlite().await));
        store.save_account(&account("u1", "a@x.com")).await;
        store.save_listing(&listing("l1", "u1", 1000, 0)).await;

        assert_eq!(store.clear_local().await, SyncStatus::Synced);
        assert!(store.load_accounts().await.value.is_empty());
        assert!(store.load_listings().await.value.is_empty());
    }
}
