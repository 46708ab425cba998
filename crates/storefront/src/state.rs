//! Application state shared across commands.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::cache::{FileKeyValueStore, KvError, SessionStore};
use crate::catalog::{CatalogFetcher, RemoteError};
use crate::config::StorefrontConfig;
use crate::db::{PgCatalogSource, RepositoryError, SqliteEmbeddedStore, create_local_pool, create_pool};
use crate::error::AppError;
use crate::services::{AuthService, ListingService};
use crate::sync::DualStore;

/// The production local store pair.
pub type LocalStore = DualStore<FileKeyValueStore, SqliteEmbeddedStore>;

/// Application state shared across all commands.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// local stores, the session record and the remote catalog.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: LocalStore,
    sessions: SessionStore<FileKeyValueStore>,
    catalog: OnceCell<CatalogFetcher<PgCatalogSource>>,
}

impl AppState {
    /// Open the local stores described by `config`.
    ///
    /// An embedded store that cannot be opened is logged and skipped; the
    /// state then runs on the flat cache alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub async fn open(config: StorefrontConfig) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(&config.data_dir)
            .await
            .map_err(KvError::from)?;

        let kv = FileKeyValueStore::new(&config.cache_file);
        let embedded = match &config.embedded_db {
            Some(path) => open_embedded(path).await,
            None => {
                info!("Embedded store disabled, using flat cache only");
                None
            }
        };

        Ok(Self {
            inner: Arc::new(AppStateInner {
                store: DualStore::new(kv.clone(), embedded),
                sessions: SessionStore::new(kv),
                catalog: OnceCell::new(),
                config,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the dual-store synchronizer.
    #[must_use]
    pub fn store(&self) -> &LocalStore {
        &self.inner.store
    }

    /// Get a reference to the session record store.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore<FileKeyValueStore> {
        &self.inner.sessions
    }

    /// Authentication service over the local stores.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_, FileKeyValueStore, SqliteEmbeddedStore> {
        AuthService::new(&self.inner.store, &self.inner.sessions)
    }

    /// Listing service over the local stores.
    #[must_use]
    pub fn listings(&self) -> ListingService<'_, FileKeyValueStore, SqliteEmbeddedStore> {
        ListingService::new(&self.inner.store, &self.inner.sessions)
    }

    /// The remote catalog, connecting on first use.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::NotConfigured` without a remote database URL, or
    /// the connection error.
    pub async fn catalog(&self) -> Result<&CatalogFetcher<PgCatalogSource>, AppError> {
        let config = &self.inner.config;
        let fetcher = self
            .inner
            .catalog
            .get_or_try_init(|| async {
                let url = config
                    .remote_database_url
                    .as_ref()
                    .ok_or(RemoteError::NotConfigured)?;
                let pool = create_pool(url).await.map_err(RepositoryError::from)?;
                Ok::<_, AppError>(CatalogFetcher::new(
                    PgCatalogSource::new(pool),
                    config.unknown_seller.clone(),
                    config.catalog_cache_ttl,
                ))
            })
            .await?;
        Ok(fetcher)
    }
}

async fn open_embedded(path: &Path) -> Option<SqliteEmbeddedStore> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = tokio::fs::create_dir_all(parent).await
    {
        warn!(error = %e, path = %path.display(), "Embedded store unavailable, using flat cache only");
        return None;
    }

    let pool = match create_local_pool(path).await {
        Ok(pool) => pool,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Embedded store unavailable, using flat cache only");
            return None;
        }
    };

    let store = SqliteEmbeddedStore::new(pool);
    if let Err(e) = store.migrate().await {
        warn!(error = %e, "Embedded store schema could not be created, using flat cache only");
        return None;
    }
    Some(store)
}
