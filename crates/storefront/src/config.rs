//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `AUTOSOUQ_DATA_DIR` - Directory of the local stores (default: .autosouq)
//! - `AUTOSOUQ_CACHE_FILE` - Flat cache file (default: `<data_dir>/local_storage.json`)
//! - `AUTOSOUQ_EMBEDDED_DB` - Embedded `SQLite` file (default: `<data_dir>/embedded.sqlite`),
//!   or `off` to run on the flat cache alone
//! - `AUTOSOUQ_REMOTE_DATABASE_URL` - Hosted catalog `PostgreSQL` URL (fallback: `DATABASE_URL`)
//! - `AUTOSOUQ_UNKNOWN_SELLER` - Seller name shown when a profile is missing (default: Unknown)
//! - `AUTOSOUQ_FEATURED_LIMIT` - Number of featured listings (default: 6)
//! - `AUTOSOUQ_CATALOG_CACHE_TTL_SECS` - Lifetime of cached catalog results (default: 1800)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_DATA_DIR: &str = ".autosouq";
const CACHE_FILE_NAME: &str = "local_storage.json";
const EMBEDDED_DB_NAME: &str = "embedded.sqlite";
const EMBEDDED_DISABLED: &str = "off";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
///
/// Implements `Debug` manually to redact the remote database URL.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Directory holding the local stores
    pub data_dir: PathBuf,
    /// Flat cache file
    pub cache_file: PathBuf,
    /// Embedded store file, `None` when disabled
    pub embedded_db: Option<PathBuf>,
    /// Hosted catalog connection URL (contains password)
    pub remote_database_url: Option<SecretString>,
    /// Placeholder seller name
    pub unknown_seller: String,
    /// Featured listings page size
    pub featured_limit: u32,
    /// Lifetime of cached catalog results
    pub catalog_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("data_dir", &self.data_dir)
            .field("cache_file", &self.cache_file)
            .field("embedded_db", &self.embedded_db)
            .field(
                "remote_database_url",
                &self.remote_database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("unknown_seller", &self.unknown_seller)
            .field("featured_limit", &self.featured_limit)
            .field("catalog_cache_ttl", &self.catalog_cache_ttl)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for unparseable numbers.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = PathBuf::from(
            get("AUTOSOUQ_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        );
        let cache_file = get("AUTOSOUQ_CACHE_FILE")
            .map_or_else(|| data_dir.join(CACHE_FILE_NAME), PathBuf::from);
        let embedded_db = match get("AUTOSOUQ_EMBEDDED_DB") {
            Some(value) if value.eq_ignore_ascii_case(EMBEDDED_DISABLED) => None,
            Some(value) => Some(PathBuf::from(value)),
            None => Some(data_dir.join(EMBEDDED_DB_NAME)),
        };

        // Fallback to generic DATABASE_URL
        let remote_database_url = get("AUTOSOUQ_REMOTE_DATABASE_URL")
            .or_else(|| get("DATABASE_URL"))
            .map(SecretString::from);

        let unknown_seller =
            get("AUTOSOUQ_UNKNOWN_SELLER").unwrap_or_else(|| "Unknown".to_string());
        let featured_limit: u32 = parse_or(get("AUTOSOUQ_FEATURED_LIMIT"), "AUTOSOUQ_FEATURED_LIMIT", 6)?;
        if featured_limit == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "AUTOSOUQ_FEATURED_LIMIT".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let ttl_secs: u64 = parse_or(
            get("AUTOSOUQ_CATALOG_CACHE_TTL_SECS"),
            "AUTOSOUQ_CATALOG_CACHE_TTL_SECS",
            1800,
        )?;

        Ok(Self {
            data_dir,
            cache_file,
            embedded_db,
            remote_database_url,
            unknown_seller,
            featured_limit,
            catalog_cache_ttl: Duration::from_secs(ttl_secs),
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional value, falling back to `default` when absent.
fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.map_or(Ok(default), |v| {
        v.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
