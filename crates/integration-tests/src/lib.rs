//! Integration tests for AutoSouq.
//!
//! # Running Tests
//!
//! ```bash
//! # Local store and catalog scenarios (no services needed)
//! cargo test -p autosouq-integration-tests
//!
//! # Include the hosted catalog tests
//! AUTOSOUQ_TEST_DATABASE_URL=postgres://localhost/autosouq_test \
//!     cargo test -p autosouq-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `local_store` - accounts, sessions and listings across restarts
//! - `seed` - the sample data file
//! - `catalog` - the remote join against [`MemoryCatalog`] and `PostgreSQL`
//!
//! Helpers here panic on setup failures; they are only used from tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use tempfile::TempDir;
use tokio::sync::Mutex;

use autosouq_core::{AccountId, ListingId};
use autosouq_storefront::catalog::{
    CatalogFetcher, CatalogSource, ListingRow, NewListingRow, ProfileRow, ProfileUpdate,
    RemoteError,
};
use autosouq_storefront::config::StorefrontConfig;
use autosouq_storefront::db::RepositoryError;
use autosouq_storefront::seed::SeedFile;
use autosouq_storefront::state::AppState;

/// The sample data shipped with the CLI.
pub const SAMPLE_CARS: &str = include_str!("../../cli/seed/sample_cars.yaml");

/// Password of every seller in [`SAMPLE_CARS`].
pub const SAMPLE_PASSWORD: &str = "showroom-2024";

/// Parse [`SAMPLE_CARS`].
///
/// # Panics
///
/// Panics if the sample file does not parse.
#[must_use]
pub fn sample_cars() -> SeedFile {
    serde_yaml::from_str(SAMPLE_CARS).expect("sample_cars.yaml should parse")
}

/// Storefront configuration rooted at `dir`.
///
/// # Panics
///
/// Panics if the configuration is rejected.
#[must_use]
pub fn config(dir: &Path, embedded: bool) -> StorefrontConfig {
    let data_dir = dir.to_string_lossy().into_owned();
    StorefrontConfig::from_lookup(|key| match key {
        "AUTOSOUQ_DATA_DIR" => Some(data_dir.clone()),
        "AUTOSOUQ_EMBEDDED_DB" if !embedded => Some("off".to_string()),
        _ => None,
    })
    .expect("test configuration should load")
}

/// Application state over a temporary data directory.
///
/// Keep the context alive for the duration of the test; dropping it deletes
/// the directory.
pub struct TestContext {
    pub dir: TempDir,
    pub state: AppState,
}

impl TestContext {
    /// Flat cache plus embedded store.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory or the stores cannot be created.
    pub async fn new() -> Self {
        Self::open(true).await
    }

    /// Flat cache only.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory or the cache cannot be created.
    pub async fn cache_only() -> Self {
        Self::open(false).await
    }

    async fn open(embedded: bool) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let state = AppState::open(config(dir.path(), embedded))
            .await
            .expect("failed to open app state");
        Self { dir, state }
    }

    /// A fresh state over the same files, as after a restart.
    ///
    /// # Panics
    ///
    /// Panics if the stores cannot be reopened.
    pub async fn reopen(&self, embedded: bool) -> AppState {
        AppState::open(config(self.dir.path(), embedded))
            .await
            .expect("failed to reopen app state")
    }
}

/// In-memory hosted catalog.
#[derive(Default)]
pub struct MemoryCatalog {
    rows: Mutex<Vec<ListingRow>>,
    profiles: Mutex<HashMap<AccountId, ProfileRow>>,
    fail_primary: AtomicBool,
    fail_owners: AtomicBool,
    primary_calls: AtomicUsize,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make listing queries fail.
    pub fn fail_primary(&self, fail: bool) {
        self.fail_primary.store(fail, Ordering::SeqCst);
    }

    /// Make profile lookups fail.
    pub fn fail_owners(&self, fail: bool) {
        self.fail_owners.store(fail, Ordering::SeqCst);
    }

    /// Number of listing queries served so far.
    pub fn primary_calls(&self) -> usize {
        self.primary_calls.load(Ordering::SeqCst)
    }

    /// Remove a profile, leaving its listings orphaned.
    pub async fn drop_profile(&self, id: &AccountId) {
        self.profiles.lock().await.remove(id);
    }

    fn unavailable() -> RemoteError {
        RemoteError::Query(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }
}

impl CatalogSource for MemoryCatalog {
    async fn fetch_primary(&self, limit: Option<u32>) -> Result<Vec<ListingRow>, RemoteError> {
        self.primary_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_primary.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        let mut rows = self.rows.lock().await.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn resolve_owners(&self, ids: &[AccountId]) -> Result<Vec<ProfileRow>, RemoteError> {
        if self.fail_owners.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        let profiles = self.profiles.lock().await;
        Ok(ids.iter().filter_map(|id| profiles.get(id).cloned()).collect())
    }

    async fn fetch_listing(&self, id: &ListingId) -> Result<Option<ListingRow>, RemoteError> {
        if self.fail_primary.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(self.rows.lock().await.iter().find(|r| &r.id == id).cloned())
    }

    async fn fetch_by_owner(&self, owner_id: &AccountId) -> Result<Vec<ListingRow>, RemoteError> {
        if self.fail_primary.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .await
            .iter()
            .filter(|r| &r.user_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert_listing(&self, listing: &NewListingRow) -> Result<ListingRow, RemoteError> {
        let row = ListingRow {
            id: ListingId::generate(),
            title: listing.title.clone(),
            make: listing.make.clone(),
            model: listing.model.clone(),
            year: listing.year,
            price: listing.price,
            mileage: listing.mileage,
            location: listing.location.clone(),
            description: listing.description.clone(),
            image_url: listing.image_url.clone(),
            user_id: listing.user_id.clone(),
            created_at: Utc::now(),
        };
        self.rows.lock().await.push(row.clone());
        Ok(row)
    }

    async fn fetch_profile(&self, id: &AccountId) -> Result<Option<ProfileRow>, RemoteError> {
        Ok(self.profiles.lock().await.get(id).cloned())
    }

    async fn insert_profile(&self, profile: &ProfileRow) -> Result<ProfileRow, RemoteError> {
        self.profiles
            .lock()
            .await
            .insert(profile.id.clone(), profile.clone());
        Ok(profile.clone())
    }

    async fn update_profile(
        &self,
        id: &AccountId,
        update: &ProfileUpdate,
    ) -> Result<ProfileRow, RemoteError> {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .get_mut(id)
            .ok_or_else(|| RemoteError::NotFound(format!("profile {id}")))?;
        if let Some(name) = &update.name {
            profile.name.clone_from(name);
        }
        if let Some(phone) = &update.phone {
            profile.phone = Some(phone.clone());
        }
        if let Some(location) = &update.location {
            profile.location = Some(location.clone());
        }
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }
}

/// Fetcher over a [`MemoryCatalog`] with the default placeholder and a long
/// cache lifetime.
#[must_use]
pub fn memory_fetcher() -> CatalogFetcher<MemoryCatalog> {
    CatalogFetcher::new(MemoryCatalog::new(), "Unknown", Duration::from_secs(1800))
}
