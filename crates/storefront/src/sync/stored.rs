//! Per-collection store access, so the synchronizer's policy is written once.

use std::future::Future;

use autosouq_core::{Account, Listing, Record};

use super::reconcile::{sort_accounts, sort_listings};
use crate::cache::{FlatCache, KeyValueStore, KvError};
use crate::db::{EmbeddedStore, RepositoryError};

/// A record kept in both local stores.
pub trait Stored: Record + Clone + Send + Sync + 'static {
    /// Collection name for logs.
    const KIND: &'static str;

    /// Canonical result order.
    fn sort(rows: &mut [Self]);

    fn put<E: EmbeddedStore>(
        db: &E,
        record: &Self,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn load_all<E: EmbeddedStore>(
        db: &E,
    ) -> impl Future<Output = Result<Vec<Self>, RepositoryError>> + Send;

    /// The embedded row with the same primary key as `record`.
    fn stored_copy<E: EmbeddedStore>(
        db: &E,
        record: &Self,
    ) -> impl Future<Output = Result<Option<Self>, RepositoryError>> + Send;

    fn load_cached<K: KeyValueStore>(
        cache: &FlatCache<K>,
    ) -> impl Future<Output = Result<Vec<Self>, KvError>> + Send;

    fn replace_cached<K: KeyValueStore>(
        cache: &FlatCache<K>,
        rows: &[Self],
    ) -> impl Future<Output = Result<(), KvError>> + Send;

    fn upsert_cached<K: KeyValueStore>(
        cache: &FlatCache<K>,
        record: &Self,
    ) -> impl Future<Output = Result<(), KvError>> + Send;
}

impl Stored for Account {
    const KIND: &'static str = "account";

    fn sort(rows: &mut [Self]) {
        sort_accounts(rows);
    }

    fn put<E: EmbeddedStore>(
        db: &E,
        record: &Self,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        db.put_account(record)
    }

    fn load_all<E: EmbeddedStore>(
        db: &E,
    ) -> impl Future<Output = Result<Vec<Self>, RepositoryError>> + Send {
        db.all_accounts()
    }

    fn stored_copy<E: EmbeddedStore>(
        db: &E,
        record: &Self,
    ) -> impl Future<Output = Result<Option<Self>, RepositoryError>> + Send {
        db.account_by_id(&record.id)
    }

    fn load_cached<K: KeyValueStore>(
        cache: &FlatCache<K>,
    ) -> impl Future<Output = Result<Vec<Self>, KvError>> + Send {
        cache.load_accounts()
    }

    fn replace_cached<K: KeyValueStore>(
        cache: &FlatCache<K>,
        rows: &[Self],
    ) -> impl Future<Output = Result<(), KvError>> + Send {
        cache.replace_accounts(rows)
    }

    fn upsert_cached<K: KeyValueStore>(
        cache: &FlatCache<K>,
        record: &Self,
    ) -> impl Future<Output = Result<(), KvError>> + Send {
        cache.upsert_account(record)
    }
}

impl Stored for Listing {
    const KIND: &'static str = "listing";

    fn sort(rows: &mut [Self]) {
        sort_listings(rows);
    }

    fn put<E: EmbeddedStore>(
        db: &E,
        record: &Self,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        db.put_listing(record)
    }

    fn load_all<E: EmbeddedStore>(
        db: &E,
    ) -> impl Future<Output = Result<Vec<Self>, RepositoryError>> + Send {
        db.all_listings()
    }

    fn stored_copy<E: EmbeddedStore>(
        db: &E,
        record: &Self,
    ) -> impl Future<Output = Result<Option<Self>, RepositoryError>> + Send {
        db.listing_by_id(&record.id)
    }

    fn load_cached<K: KeyValueStore>(
        cache: &FlatCache<K>,
    ) -> impl Future<Output = Result<Vec<Self>, KvError>> + Send {
        cache.load_listings()
    }

    fn replace_cached<K: KeyValueStore>(
        cache: &FlatCache<K>,
        rows: &[Self],
    ) -> impl Future<Output = Result<(), KvError>> + Send {
        cache.replace_listings(rows)
    }

    fn upsert_cached<K: KeyValueStore>(
        cache: &FlatCache<K>,
        record: &Self,
    ) -> impl Future<Output = Result<(), KvError>> + Send {
        cache.upsert_listing(record)
    }
}
