//! Remote catalog: listings joined with their sellers.
//!
//! # Architecture
//!
//! The hosted backend has no declared relation between `car_listings` and
//! `profiles`, so the join happens here in three stages:
//!
//! 1. **fetch** - primary listing rows, newest first ([`CatalogSource::fetch_primary`])
//! 2. **resolve** - profiles of the distinct owners ([`CatalogSource::resolve_owners`])
//! 3. **project** - pure merge into [`ListingView`]s ([`project`])
//!
//! A failed owner lookup degrades to placeholder seller names; only a failed
//! primary query is an error. [`CatalogFetcher`] caches results in memory
//! using `moka`.
//!
//! # Example
//!
//! ```rust,ignore
//! use autosouq_storefront::catalog::CatalogFetcher;
//! use autosouq_storefront::db::PgCatalogSource;
//!
//! let fetcher = CatalogFetcher::new(PgCatalogSource::new(pool), "Unknown", ttl);
//! let featured = fetcher.recent_listings(Some(6)).await?;
//! ```

mod cache;
mod fetcher;
mod project;
mod types;

pub use fetcher::CatalogFetcher;
pub use project::{distinct_owners, project};
pub use types::{ListingRow, ListingView, NewListingRow, ProfileRow, ProfileUpdate, SellerView};

use std::future::Future;

use thiserror::Error;

use autosouq_core::{AccountId, ListingId};

use crate::db::RepositoryError;

/// Errors from the remote catalog.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The backend query failed.
    #[error("remote query failed: {0}")]
    Query(#[from] RepositoryError),

    /// Row not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// No remote database is configured.
    #[error("remote catalog is not configured")]
    NotConfigured,
}

/// Query surface of the hosted backend.
///
/// Implemented by [`PgCatalogSource`](crate::db::PgCatalogSource) and by test
/// fakes.
pub trait CatalogSource: Send + Sync + 'static {
    /// Listing rows ordered newest first, at most `limit` when given.
    fn fetch_primary(
        &self,
        limit: Option<u32>,
    ) -> impl Future<Output = Result<Vec<ListingRow>, RemoteError>> + Send;

    /// Profiles for the given ids. Ids without a profile are simply absent.
    fn resolve_owners(
        &self,
        ids: &[AccountId],
    ) -> impl Future<Output = Result<Vec<ProfileRow>, RemoteError>> + Send;

    /// One listing row by id.
    fn fetch_listing(
        &self,
        id: &ListingId,
    ) -> impl Future<Output = Result<Option<ListingRow>, RemoteError>> + Send;

    /// Listing rows of one owner, newest first.
    fn fetch_by_owner(
        &self,
        owner_id: &AccountId,
    ) -> impl Future<Output = Result<Vec<ListingRow>, RemoteError>> + Send;

    /// Insert a listing; the backend assigns id and timestamp.
    fn insert_listing(
        &self,
        listing: &NewListingRow,
    ) -> impl Future<Output = Result<ListingRow, RemoteError>> + Send;

    /// One profile by id.
    fn fetch_profile(
        &self,
        id: &AccountId,
    ) -> impl Future<Output = Result<Option<ProfileRow>, RemoteError>> + Send;

    /// Insert a profile.
    fn insert_profile(
        &self,
        profile: &ProfileRow,
    ) -> impl Future<Output = Result<ProfileRow, RemoteError>> + Send;

    /// Apply a partial update and bump `updated_at`.
    ///
    /// Fails with `RemoteError::NotFound` when the profile does not exist.
    fn update_profile(
        &self,
        id: &AccountId,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<ProfileRow, RemoteError>> + Send;
}
