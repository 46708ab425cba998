//! Embedded transactional store.
//!
//! Two keyed record collections with secondary indexes, the local analogue of
//! a browser object store. [`SqliteEmbeddedStore`] is the production
//! implementation; the [`EmbeddedStore`] trait lets the synchronizer run
//! against fakes.

use std::future::Future;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use tracing::{debug, instrument};

use autosouq_core::{Account, AccountId, Email, Listing, ListingId};

use super::RepositoryError;

/// Schema of the embedded store. Idempotent.
const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS accounts (
        id         TEXT PRIMARY KEY NOT NULL,
        email      TEXT NOT NULL,
        created_at TEXT NOT NULL,
        body       TEXT NOT NULL
    )
    ",
    "CREATE UNIQUE INDEX IF NOT EXISTS accounts_email_idx ON accounts (email)",
    r"
    CREATE TABLE IF NOT EXISTS listings (
        id         TEXT PRIMARY KEY NOT NULL,
        owner_id   TEXT NOT NULL,
        created_at TEXT NOT NULL,
        body       TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS listings_owner_idx ON listings (owner_id)",
];

/// Keyed account and listing collections with secondary indexes.
///
/// Each method is one transaction. Lookups that find nothing return
/// `Ok(None)` or an empty vector, not an error.
pub trait EmbeddedStore: Send + Sync {
    /// Insert or replace an account by id.
    ///
    /// Fails with `RepositoryError::Conflict` when another account holds the email.
    fn put_account(
        &self,
        account: &Account,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// All accounts.
    fn all_accounts(&self) -> impl Future<Output = Result<Vec<Account>, RepositoryError>> + Send;

    /// Primary-key lookup.
    fn account_by_id(
        &self,
        id: &AccountId,
    ) -> impl Future<Output = Result<Option<Account>, RepositoryError>> + Send;

    /// Unique email index lookup.
    fn account_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<Account>, RepositoryError>> + Send;

    /// Insert or replace a listing by id.
    fn put_listing(
        &self,
        listing: &Listing,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// All listings.
    fn all_listings(&self) -> impl Future<Output = Result<Vec<Listing>, RepositoryError>> + Send;

    /// Primary-key lookup.
    fn listing_by_id(
        &self,
        id: &ListingId,
    ) -> impl Future<Output = Result<Option<Listing>, RepositoryError>> + Send;

    /// Owner index lookup.
    fn listings_by_owner(
        &self,
        owner_id: &AccountId,
    ) -> impl Future<Output = Result<Vec<Listing>, RepositoryError>> + Send;

    /// Delete every account and listing.
    fn clear(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// `SQLite`-backed [`EmbeddedStore`].
#[derive(Clone, Debug)]
pub struct SqliteEmbeddedStore {
    pool: SqlitePool,
}

impl SqliteEmbeddedStore {
    /// Wrap an open pool. Call [`migrate`](Self::migrate) before first use.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        debug!("Embedded store schema ready");
        Ok(())
    }
}

impl EmbeddedStore for SqliteEmbeddedStore {
    #[instrument(skip(self, account), fields(account_id = %account.id))]
    async fn put_account(&self, account: &Account) -> Result<(), RepositoryError> {
        let body = encode(account)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO accounts (id, email, created_at, body)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
               SET email = excluded.email,
                   created_at = excluded.created_at,
                   body = excluded.body
            ",
        )
        .bind(account.id.as_str())
        .bind(account.email.as_str())
        .bind(timestamp(account.created_at))
        .bind(body)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "account email"))?;

        tx.commit().await?;
        Ok(())
    }

    async fn all_accounts(&self) -> Result<Vec<Account>, RepositoryError> {
        let bodies: Vec<String> =
            sqlx::query_scalar("SELECT body FROM accounts ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await?;
        bodies.iter().map(|b| decode(b)).collect()
    }

    async fn account_by_id(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        let body: Option<String> = sqlx::query_scalar("SELECT body FROM accounts WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        body.as_deref().map(decode).transpose()
    }

    async fn account_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM accounts WHERE email = $1")
                .bind(email.as_str())
                .fetch_optional(&self.pool)
                .await?;
        body.as_deref().map(decode).transpose()
    }

    #[instrument(skip(self, listing), fields(listing_id = %listing.id))]
    async fn put_listing(&self, listing: &Listing) -> Result<(), RepositoryError> {
        let body = encode(listing)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO listings (id, owner_id, created_at, body)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
               SET owner_id = excluded.owner_id,
                   created_at = excluded.created_at,
                   body = excluded.body
            ",
        )
        .bind(listing.id.as_str())
        .bind(listing.owner_id.as_str())
        .bind(timestamp(listing.created_at))
        .bind(body)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "listing"))?;

        tx.commit().await?;
        Ok(())
    }

    async fn all_listings(&self) -> Result<Vec<Listing>, RepositoryError> {
        let bodies: Vec<String> =
            sqlx::query_scalar("SELECT body FROM listings ORDER BY created_at DESC, id")
                .fetch_all(&self.pool)
                .await?;
        bodies.iter().map(|b| decode(b)).collect()
    }

    async fn listing_by_id(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        let body: Option<String> = sqlx::query_scalar("SELECT body FROM listings WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        body.as_deref().map(decode).transpose()
    }

    async fn listings_by_owner(&self, owner_id: &AccountId) -> Result<Vec<Listing>, RepositoryError> {
        let bodies: Vec<String> = sqlx::query_scalar(
            "SELECT body FROM listings WHERE owner_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(owner_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        bodies.iter().map(|b| decode(b)).collect()
    }

    async fn clear(&self) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM listings").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM accounts").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Fixed-width UTC timestamp so text ordering is chronological.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn encode<T: serde::Serialize>(record: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(record)
        .map_err(|e| RepositoryError::DataCorruption(format!("failed to serialize record: {e}")))
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(body)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid record body: {e}")))
}
