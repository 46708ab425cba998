//! Listing management on the local stores.

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, instrument};

use autosouq_core::{
    AccountId, CurrencyCode, Listing, ListingId, Price, Session, SyncOutcome, SyncStatus,
};

use crate::cache::{KeyValueStore, SessionStore};
use crate::catalog::NewListingRow;
use crate::db::EmbeddedStore;
use crate::error::add_breadcrumb;
use crate::search::{ListingQuery, locations};
use crate::sync::DualStore;

/// Oldest model year accepted.
const MIN_YEAR: i32 = 1900;

/// Errors from listing operations.
#[derive(Debug, Error)]
pub enum ListingError {
    /// Creating a listing requires a session.
    #[error("not logged in")]
    NotLoggedIn,

    /// A field failed validation.
    #[error("invalid listing: {0}")]
    Invalid(String),

    /// Neither local store accepted the listing.
    #[error("listing could not be stored ({0})")]
    Storage(SyncStatus),
}

/// Seller input for a new listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewListing {
    pub title: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: Decimal,
    pub mileage: i32,
    pub location: String,
    pub description: String,
    pub image_url: Option<String>,
}

impl NewListing {
    /// Check every field, against `current_year` for the model year.
    ///
    /// # Errors
    ///
    /// Returns `ListingError::Invalid` naming the first bad field.
    pub fn validate(&self, current_year: i32) -> Result<(), ListingError> {
        for (field, value) in [
            ("title", &self.title),
            ("make", &self.make),
            ("model", &self.model),
            ("location", &self.location),
        ] {
            if value.trim().is_empty() {
                return Err(ListingError::Invalid(format!("{field} is required")));
            }
        }

        if !(MIN_YEAR..=current_year + 1).contains(&self.year) {
            return Err(ListingError::Invalid(format!(
                "year must be between {MIN_YEAR} and {}",
                current_year + 1
            )));
        }
        if self.price <= Decimal::ZERO {
            return Err(ListingError::Invalid("price must be positive".to_string()));
        }
        if self.mileage < 0 {
            return Err(ListingError::Invalid(
                "mileage cannot be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Row for the hosted catalog, owned by `owner`.
    #[must_use]
    pub fn to_remote_row(&self, owner: &AccountId) -> NewListingRow {
        NewListingRow {
            title: self.title.trim().to_string(),
            make: self.make.trim().to_string(),
            model: self.model.trim().to_string(),
            year: self.year,
            price: self.price,
            mileage: self.mileage,
            location: self.location.trim().to_string(),
            description: self.description.clone(),
            image_url: self.image_url.clone(),
            user_id: owner.clone(),
        }
    }
}

/// Listing operations for the logged-in seller and for browsing.
pub struct ListingService<'a, K, E> {
    store: &'a DualStore<K, E>,
    sessions: &'a SessionStore<K>,
}

impl<'a, K: KeyValueStore, E: EmbeddedStore> ListingService<'a, K, E> {
    #[must_use]
    pub const fn new(store: &'a DualStore<K, E>, sessions: &'a SessionStore<K>) -> Self {
        Self { store, sessions }
    }

    /// Create a listing owned by the logged-in account.
    ///
    /// # Errors
    ///
    /// Returns `ListingError::NotLoggedIn` without a session,
    /// `ListingError::Invalid` for bad input, or `ListingError::Storage` if
    /// neither store accepted it.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, input: &NewListing) -> Result<Listing, ListingError> {
        let session = self
            .sessions
            .current()
            .await
            .ok_or(ListingError::NotLoggedIn)?;

        let now = Utc::now();
        input.validate(now.year())?;

        let listing = Listing {
            id: ListingId::generate(),
            title: input.title.trim().to_string(),
            make: input.make.trim().to_string(),
            model: input.model.trim().to_string(),
            year: input.year,
            price: Price::new(input.price, CurrencyCode::AED),
            mileage: input.mileage,
            location: input.location.trim().to_string(),
            description: input.description.clone(),
            image_url: input.image_url.clone(),
            owner_id: session.id,
            created_at: now,
        };

        let status = self.store.save_listing(&listing).await;
        if !status.is_durable() {
            return Err(ListingError::Storage(status));
        }

        add_breadcrumb(
            "listing",
            "Listing created",
            Some(&[("listing_id", listing.id.as_str())]),
        );
        info!(listing_id = %listing.id, %status, "Listing created");
        Ok(listing)
    }

    /// Listings matching `query`, newest first.
    pub async fn browse(&self, query: &ListingQuery) -> SyncOutcome<Vec<Listing>> {
        self.store
            .load_listings()
            .await
            .map(|listings| query.apply(listings))
    }

    /// Distinct locations of every listing, for the location filter.
    pub async fn locations(&self) -> SyncOutcome<Vec<String>> {
        self.store
            .load_listings()
            .await
            .map(|listings| locations(&listings))
    }

    /// One listing.
    pub async fn detail(&self, id: &ListingId) -> SyncOutcome<Option<Listing>> {
        self.store.find_listing(id).await
    }

    /// Listings of `session`'s account, newest first.
    pub async fn mine(&self, session: &Session) -> SyncOutcome<Vec<Listing>> {
        self.store.listings_by_owner(&session.id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use autosouq_core::Email;

    use super::*;
    use crate::cache::MemoryKeyValueStore;
    use crate::db::SqliteEmbeddedStore;

    fn input() -> NewListing {
        NewListing {
            title: "2020 Audi A6 45 TFSI".to_string(),
            make: "Audi".to_string(),
            model: "A6".to_string(),
            year: 2020,
            price: Decimal::from(175_000),
            mileage: 58_000,
            location: "Sharjah".to_string(),
            description: "Full service history".to_string(),
            image_url: None,
        }
    }

    fn session() -> Session {
        Session {
            id: AccountId::new("u1"),
            name: "Seller".to_string(),
            email: Email::parse("a@x.com").unwrap(),
            phone: None,
            location: None,
        }
    }

    #[test]
    fn test_validate() {
        assert!(input().validate(2025).is_ok());

        let mut bad = input();
        bad.year = 1899;
        assert!(matches!(bad.validate(2025), Err(ListingError::Invalid(_))));

        let mut bad = input();
        bad.year = 2027;
        assert!(bad.validate(2025).is_err());
        assert!(bad.validate(2026).is_ok());

        let mut bad = input();
        bad.price = Decimal::ZERO;
        assert!(bad.validate(2025).is_err());

        let mut bad = input();
        bad.mileage = -1;
        assert!(bad.validate(2025).is_err());

        let mut bad = input();
        bad.make = "  ".to_string();
        assert!(bad.validate(2025).is_err());
    }

    #[tokio::test]
    async fn test_create_requires_session() {
        let kv = MemoryKeyValueStore::new();
        let store: DualStore<_, SqliteEmbeddedStore> = DualStore::cache_only(kv.clone());
        let sessions = SessionStore::new(kv);
        let listings = ListingService::new(&store, &sessions);

        assert!(matches!(
            listings.create(&input()).await,
            Err(ListingError::NotLoggedIn)
        ));
    }

    #[tokio::test]
    async fn test_create_then_browse_and_mine() {
        let kv = MemoryKeyValueStore::new();
        let store: DualStore<_, SqliteEmbeddedStore> = DualStore::cache_only(kv.clone());
        let sessions = SessionStore::new(kv);
        sessions.set(Some(&session())).await.unwrap();
        let listings = ListingService::new(&store, &sessions);

        let created = listings.create(&input()).await.unwrap();
        assert_eq!(created.owner_id.as_str(), "u1");
        assert_eq!(created.price.to_string(), "AED 175000");

        let query = ListingQuery {
            search: Some("audi".to_string()),
            ..ListingQuery::default()
        };
        assert_eq!(listings.browse(&query).await.value.len(), 1);
        assert_eq!(listings.mine(&session()).await.value, vec![created.clone()]);
        assert_eq!(
            listings.detail(&created.id).await.value,
            Some(created)
        );
        assert_eq!(listings.locations().await.value, ["Sharjah"]);
    }
}
