use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use moka::future::Cache;
use tracing::{debug, info, instrument, warn};

use autosouq_core::{AccountId, Email, ListingId};

use super::cache::{CacheKey, CacheValue};
use super::{
    CatalogSource, ListingRow, ListingView, NewListingRow, ProfileRow, ProfileUpdate, RemoteError,
    distinct_owners, project,
};

/// Joins remote listings with seller profiles, caching the results.
///
/// Cheap to clone; clones share the source and the cache.
pub struct CatalogFetcher<S> {
    inner: Arc<CatalogFetcherInner<S>>,
}

struct CatalogFetcherInner<S> {
    source: S,
    placeholder: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl<S> Clone for CatalogFetcher<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: CatalogSource> CatalogFetcher<S> {
    /// Create a fetcher over `source`.
    ///
    /// `placeholder` is the seller name used when an owner cannot be
    /// resolved. Joined results live for `ttl`.
    #[must_use]
    pub fn new(source: S, placeholder: impl Into<String>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(256)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Arc::new(CatalogFetcherInner {
                source,
                placeholder: placeholder.into(),
                cache,
            }),
        }
    }

    /// The underlying source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.inner.source
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Newest listings with their sellers, at most `limit` when given.
    ///
    /// # Errors
    ///
    /// Returns an error only if the primary listing query fails. Owner lookup
    /// failures degrade to placeholder seller names.
    #[instrument(skip(self))]
    pub async fn recent_listings(&self, limit: Option<u32>) -> Result<Vec<ListingView>, RemoteError> {
        let cache_key = CacheKey::Recent { limit };

        if let Some(CacheValue::Listings(views)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for recent listings");
            return Ok(views.as_ref().clone());
        }

        let rows = self.inner.source.fetch_primary(limit).await?;
        let views = self.join(rows).await;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Listings(Arc::new(views.clone())))
            .await;

        Ok(views)
    }

    /// One listing with its seller.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing query fails.
    #[instrument(skip(self), fields(listing_id = %id))]
    pub async fn listing_detail(&self, id: &ListingId) -> Result<Option<ListingView>, RemoteError> {
        let cache_key = CacheKey::Listing(id.clone());

        if let Some(CacheValue::Listing(view)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for listing");
            return Ok(Some(*view));
        }

        let Some(row) = self.inner.source.fetch_listing(id).await? else {
            return Ok(None);
        };
        let Some(view) = self.join(vec![row]).await.pop() else {
            return Ok(None);
        };

        self.inner
            .cache
            .insert(cache_key, CacheValue::Listing(Box::new(view.clone())))
            .await;

        Ok(Some(view))
    }

    /// Listings of one seller, newest first. Not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing query fails.
    #[instrument(skip(self), fields(owner_id = %owner_id))]
    pub async fn seller_listings(&self, owner_id: &AccountId) -> Result<Vec<ListingView>, RemoteError> {
        let rows = self.inner.source.fetch_by_owner(owner_id).await?;
        Ok(self.join(rows).await)
    }

    /// Insert a listing and return it joined with its seller.
    ///
    /// Drops every cached result so the new listing shows up immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    #[instrument(skip(self, listing), fields(owner_id = %listing.user_id))]
    pub async fn publish(&self, listing: &NewListingRow) -> Result<ListingView, RemoteError> {
        let row = self.inner.source.insert_listing(listing).await?;
        info!(listing_id = %row.id, "Listing published");
        self.invalidate().await;

        let id = row.id.clone();
        self.join(vec![row])
            .await
            .pop()
            .ok_or_else(|| RemoteError::NotFound(format!("listing {id}")))
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// The profile of `id`, created with defaults when missing.
    ///
    /// A default profile is named `name` if given, else after the local part
    /// of `email`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup or the insert fails.
    #[instrument(skip(self, email, name), fields(account_id = %id))]
    pub async fn profile(
        &self,
        id: &AccountId,
        email: &Email,
        name: Option<&str>,
    ) -> Result<ProfileRow, RemoteError> {
        if let Some(profile) = self.inner.source.fetch_profile(id).await? {
            return Ok(profile);
        }

        info!("No profile found, creating one");
        let now = Utc::now();
        let profile = ProfileRow {
            id: id.clone(),
            name: name.map_or_else(|| email.local_part().to_string(), str::to_string),
            email: email.as_str().to_string(),
            phone: None,
            location: None,
            created_at: now,
            updated_at: now,
        };
        self.inner.source.insert_profile(&profile).await
    }

    /// Update a profile. Cached listings are dropped since they embed seller
    /// names.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::NotFound` if the profile does not exist, or the
    /// query error.
    #[instrument(skip(self, update), fields(account_id = %id))]
    pub async fn update_profile(
        &self,
        id: &AccountId,
        update: &ProfileUpdate,
    ) -> Result<ProfileRow, RemoteError> {
        let profile = self.inner.source.update_profile(id, update).await?;
        self.invalidate().await;
        Ok(profile)
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate all cached results.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    /// Resolve owners and project. Never fails: an owner lookup error leaves
    /// every seller as the placeholder.
    async fn join(&self, rows: Vec<ListingRow>) -> Vec<ListingView> {
        if rows.is_empty() {
            return Vec::new();
        }

        let owners = distinct_owners(&rows);
        let profiles: HashMap<AccountId, ProfileRow> =
            match self.inner.source.resolve_owners(&owners).await {
                Ok(profiles) => profiles.into_iter().map(|p| (p.id.clone(), p)).collect(),
                Err(e) => {
                    warn!(error = %e, owners = owners.len(), "Failed to resolve listing owners");
                    HashMap::new()
                }
            };

        project(rows, &profiles, &self.inner.placeholder)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Duration as ChronoDuration;
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::RepositoryError;

    #[derive(Default)]
    struct FakeSource {
        rows: Mutex<Vec<ListingRow>>,
        profiles: Mutex<Vec<ProfileRow>>,
        fail_primary: bool,
        fail_owners: bool,
        primary_calls: AtomicUsize,
        resolve_calls: AtomicUsize,
    }

    fn unavailable() -> RemoteError {
        RemoteError::Query(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }

    impl CatalogSource for FakeSource {
        async fn fetch_primary(&self, limit: Option<u32>) -> Result<Vec<ListingRow>, RemoteError> {
            self.primary_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_primary {
                return Err(unavailable());
            }
            let mut rows = self.rows.lock().unwrap().clone();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            if let Some(limit) = limit {
                rows.truncate(limit as usize);
            }
            Ok(rows)
        }

        async fn resolve_owners(&self, ids: &[AccountId]) -> Result<Vec<ProfileRow>, RemoteError> {
            self.resolve_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_owners {
                return Err(unavailable());
            }
            Ok(self
                .profiles
                .lock()
                .unwrap()
                .iter()
                .filter(|p| ids.contains(&p.id))
                .cloned()
                .collect())
        }

        async fn fetch_listing(&self, id: &ListingId) -> Result<Option<ListingRow>, RemoteError> {
            Ok(self.rows.lock().unwrap().iter().find(|r| &r.id == id).cloned())
        }

        async fn fetch_by_owner(&self, owner_id: &AccountId) -> Result<Vec<ListingRow>, RemoteError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| &r.user_id == owner_id)
                .cloned()
                .collect())
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
            self.rows.lock().unwrap().push(row.clone());
            Ok(row)
        }

        async fn fetch_profile(&self, id: &AccountId) -> Result<Option<ProfileRow>, RemoteError> {
            Ok(self.profiles.lock().unwrap().iter().find(|p| &p.id == id).cloned())
        }

        async fn insert_profile(&self, profile: &ProfileRow) -> Result<ProfileRow, RemoteError> {
            self.profiles.lock().unwrap().push(profile.clone());
            Ok(profile.clone())
        }

        async fn update_profile(
            &self,
            id: &AccountId,
            update: &ProfileUpdate,
        ) -> Result<ProfileRow, RemoteError> {
            let mut profiles = self.profiles.lock().unwrap();
            let profile = profiles
                .iter_mut()
                .find(|p| &p.id == id)
                .ok_or_else(|| RemoteError::NotFound(format!("profile {id}")))?;
            if let Some(name) = &update.name {
                profile.name.clone_from(name);
            }
            Ok(profile.clone())
        }
    }

    fn row(id: &str, owner: &str, age_minutes: i64) -> ListingRow {
        ListingRow {
            id: ListingId::new(id),
            title: format!("Listing {id}"),
            make: "BMW".to_string(),
            model: "X5".to_string(),
            year: 2021,
            price: Decimal::from(310_000),
            mileage: 32_000,
            location: "Abu Dhabi".to_string(),
            description: String::new(),
            image_url: Some("https://img.example/x5.jpg".to_string()),
            user_id: AccountId::new(owner),
            created_at: Utc::now() - ChronoDuration::minutes(age_minutes),
        }
    }

    fn profile(id: &str, name: &str) -> ProfileRow {
        let now = Utc::now();
        ProfileRow {
            id: AccountId::new(id),
            name: name.to_string(),
            email: format!("{id}@x.com"),
            phone: Some("+971 50 111 2222".to_string()),
            location: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn fetcher(source: FakeSource) -> CatalogFetcher<FakeSource> {
        CatalogFetcher::new(source, "Unknown", Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_zero_rows_skips_owner_query() {
        let fetcher = fetcher(FakeSource::default());

        let views = fetcher.recent_listings(Some(6)).await.unwrap();
        assert!(views.is_empty());
        assert_eq!(fetcher.source().resolve_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_join_uses_placeholder_for_missing_owner() {
        let source = FakeSource {
            rows: Mutex::new(vec![row("l1", "u1", 5), row("l2", "u2", 1), row("l3", "u1", 3)]),
            profiles: Mutex::new(vec![profile("u1", "Dubai Luxury Motors")]),
            ..FakeSource::default()
        };
        let fetcher = fetcher(source);

        let views = fetcher.recent_listings(None).await.unwrap();
        let ids: Vec<_> = views.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["l2", "l3", "l1"]);
        assert_eq!(views[0].seller.name, "Unknown");
        assert_eq!(views[1].seller.name, "Dubai Luxury Motors");
        assert_eq!(fetcher.source().resolve_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_owner_failure_degrades_to_placeholders() {
        let source = FakeSource {
            rows: Mutex::new(vec![row("l1", "u1", 0)]),
            profiles: Mutex::new(vec![profile("u1", "Dubai Luxury Motors")]),
            fail_owners: true,
            ..FakeSource::default()
        };
        let views = fetcher(source).recent_listings(Some(6)).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].seller.name, "Unknown");
        assert!(views[0].seller.phone.is_none());
    }

    #[tokio::test]
    async fn test_primary_failure_is_an_error() {
        let source = FakeSource {
            fail_primary: true,
            ..FakeSource::default()
        };
        let fetcher = fetcher(source);
        assert!(fetcher.recent_listings(Some(6)).await.is_err());
        assert_eq!(fetcher.source().resolve_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_results_cached_until_invalidated() {
        let source = FakeSource {
            rows: Mutex::new(vec![row("l1", "u1", 0)]),
            ..FakeSource::default()
        };
        let fetcher = fetcher(source);

        fetcher.recent_listings(Some(6)).await.unwrap();
        fetcher.recent_listings(Some(6)).await.unwrap();
        assert_eq!(fetcher.source().primary_calls.load(Ordering::SeqCst), 1);

        fetcher.invalidate().await;
        fetcher.recent_listings(Some(6)).await.unwrap();
        assert_eq!(fetcher.source().primary_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_publish_shows_up_in_recent() {
        let source = FakeSource {
            profiles: Mutex::new(vec![profile("u1", "Seller")]),
            ..FakeSource::default()
        };
        let fetcher = fetcher(source);
        assert!(fetcher.recent_listings(Some(6)).await.unwrap().is_empty());

        let new = NewListingRow {
            title: "2020 Audi A6 45 TFSI".to_string(),
            make: "Audi".to_string(),
            model: "A6".to_string(),
            year: 2020,
            price: Decimal::from(175_000),
            mileage: 58_000,
            location: "Sharjah".to_string(),
            description: String::new(),
            image_url: None,
            user_id: AccountId::new("u1"),
        };
        let view = fetcher.publish(&new).await.unwrap();
        assert_eq!(view.seller.name, "Seller");

        let recent = fetcher.recent_listings(Some(6)).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, view.id);
    }

    #[tokio::test]
    async fn test_profile_created_from_email_when_missing() {
        let fetcher = fetcher(FakeSource::default());
        let email = Email::parse("omar@autosouq.ae").unwrap();

        let created = fetcher
            .profile(&AccountId::new("u1"), &email, None)
            .await
            .unwrap();
        assert_eq!(created.name, "omar");
        assert_eq!(created.email, "omar@autosouq.ae");

        let again = fetcher
            .profile(&AccountId::new("u1"), &email, Some("Ignored"))
            .await
            .unwrap();
        assert_eq!(again, created);
    }

    #[tokio::test]
    async fn test_update_missing_profile_is_not_found() {
        let fetcher = fetcher(FakeSource::default());
        let update = ProfileUpdate {
            name: Some("New".to_string()),
            ..ProfileUpdate::default()
        };
        let err = fetcher
            .update_profile(&AccountId::new("u1"), &update)
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::NotFound(_)));
    }
}
