//! SQL-backed stores.
//!
//! # Embedded store (`SQLite`)
//!
//! The local transactional store, one file per installation:
//!
//! - `accounts` - keyed by `id`, unique index on `email`
//! - `listings` - keyed by `id`, non-unique index on `owner_id`
//!
//! Each row keeps the full record as JSON in `body`; the key and index
//! columns are copies of fields inside it. See [`embedded`].
//!
//! # Hosted catalog (`PostgreSQL`)
//!
//! The remote backend the featured listings come from:
//!
//! - `car_listings` - listings with a `user_id` foreign key
//! - `profiles` - seller display data (`id`, `name`, `phone`, ...)
//!
//! See [`remote`].
//!
//! The embedded schema is created whenever the store is opened. The hosted
//! schema is only created by `autosouq migrate remote`.

pub mod embedded;
pub mod remote;

use std::path::Path;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{PgPool, SqlitePool};
use thiserror::Error;

pub use embedded::{EmbeddedStore, SqliteEmbeddedStore};
pub use remote::PgCatalogSource;

/// Errors from SQL-backed repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique-constraint violations to `Conflict`, everything else to `Database`.
    pub(crate) fn from_write(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool for the hosted catalog.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Open (creating if needed) the embedded `SQLite` database file.
///
/// # Errors
///
/// Returns `sqlx::Error` if the file cannot be opened.
pub async fn create_local_pool(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(4)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Open a private in-memory `SQLite` database.
///
/// Limited to a single connection: every `SQLite` memory connection is a
/// separate database.
///
/// # Errors
///
/// Returns `sqlx::Error` if the database cannot be opened.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}
