//! Sample data loading.
//!
//! A seed file lists sellers and their listings with fixed ids, so loading it
//! twice upserts instead of duplicating.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use autosouq_core::{
    Account, AccountId, CurrencyCode, Email, EmailError, Listing, ListingId, Price, SyncStatus,
};

use crate::cache::KeyValueStore;
use crate::catalog::{CatalogFetcher, CatalogSource, NewListingRow, ProfileRow, RemoteError};
use crate::db::EmbeddedStore;
use crate::services::auth::{AuthError, hash_password};
use crate::sync::DualStore;

/// Parsed seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedFile {
    pub sellers: Vec<SeedSeller>,
    pub listings: Vec<SeedListing>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedSeller {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Login password for the seeded account.
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedListing {
    pub id: String,
    pub title: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: Decimal,
    pub mileage: i32,
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Seller id.
    pub seller: String,
    /// Age of the listing, so seeded data has a stable order.
    #[serde(default)]
    pub listed_days_ago: i64,
}

/// Errors from loading a seed file.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("seller {0}: {1}")]
    InvalidEmail(String, EmailError),

    #[error("listing {0} references unknown seller {1}")]
    UnknownSeller(String, String),

    #[error("seller {0}: {1}")]
    Auth(String, AuthError),

    #[error("listing {0}: listed_days_ago {1} is out of range")]
    InvalidAge(String, i64),
}

/// What a seed run wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub accounts: usize,
    pub listings: usize,
    /// Records held by only one local store.
    pub degraded: usize,
    /// Records neither local store accepted.
    pub failed: usize,
}

impl SeedFile {
    /// Check that every listing references a declared seller.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::UnknownSeller` for the first dangling reference.
    pub fn validate(&self) -> Result<(), SeedError> {
        for listing in &self.listings {
            if !self.sellers.iter().any(|s| s.id == listing.seller) {
                return Err(SeedError::UnknownSeller(
                    listing.id.clone(),
                    listing.seller.clone(),
                ));
            }
        }
        Ok(())
    }

    /// Write every seller and listing to the local stores.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid input. Storage failures are counted in
    /// the report, not returned.
    #[instrument(skip_all, fields(sellers = self.sellers.len(), listings = self.listings.len()))]
    pub async fn apply_local<K: KeyValueStore, E: EmbeddedStore>(
        &self,
        store: &DualStore<K, E>,
    ) -> Result<SeedReport, SeedError> {
        self.validate()?;
        let mut report = SeedReport::default();
        let now = Utc::now();

        for seller in &self.sellers {
            let id = AccountId::new(&seller.id);
            let email = Email::parse(&seller.email)
                .map_err(|e| SeedError::InvalidEmail(seller.id.clone(), e))?;

            // Re-seeding keeps the stored hash and creation time.
            let (password_hash, created_at) = match store.find_account(&id).await.value {
                Some(existing) => (existing.password_hash, existing.created_at),
                None => {
                    let hash = hash_password(&seller.password)
                        .map_err(|e| SeedError::Auth(seller.id.clone(), e))?;
                    (hash, now)
                }
            };

            let account = Account {
                id,
                name: seller.name.clone(),
                email,
                password_hash,
                phone: seller.phone.clone(),
                location: seller.location.clone(),
                created_at,
                updated_at: now,
            };
            report.record(store.save_account(&account).await);
            report.accounts += 1;
        }

        for seed in &self.listings {
            let created_at = Duration::try_days(seed.listed_days_ago)
                .and_then(|age| now.checked_sub_signed(age))
                .ok_or_else(|| SeedError::InvalidAge(seed.id.clone(), seed.listed_days_ago))?;
            let listing = Listing {
                id: ListingId::new(&seed.id),
                title: seed.title.clone(),
                make: seed.make.clone(),
                model: seed.model.clone(),
                year: seed.year,
                price: Price::new(seed.price, CurrencyCode::AED),
                mileage: seed.mileage,
                location: seed.location.clone(),
                description: seed.description.clone(),
                image_url: seed.image_url.clone(),
                owner_id: AccountId::new(&seed.seller),
                created_at,
            };
            report.record(store.save_listing(&listing).await);
            report.listings += 1;
        }

        info!(?report, "Seeded local stores");
        Ok(report)
    }

    /// Insert every seller profile and listing into the remote catalog.
    ///
    /// Existing profiles are left alone. Listings are always inserted, so
    /// running this twice duplicates them.
    ///
    /// # Errors
    ///
    /// Returns the first remote query failure.
    #[instrument(skip_all)]
    pub async fn apply_remote<S: CatalogSource>(
        &self,
        catalog: &CatalogFetcher<S>,
    ) -> Result<SeedReport, RemoteError> {
        let mut report = SeedReport::default();
        let source = catalog.source();
        let now = Utc::now();

        for seller in &self.sellers {
            let id = AccountId::new(&seller.id);
            if source.fetch_profile(&id).await?.is_some() {
                warn!(seller = %id, "Profile exists, skipping");
                continue;
            }
            let profile = ProfileRow {
                id,
                name: seller.name.clone(),
                email: seller.email.clone(),
                phone: seller.phone.clone(),
                location: seller.location.clone(),
                created_at: now,
                updated_at: now,
            };
            source.insert_profile(&profile).await?;
            report.accounts += 1;
        }

        for seed in &self.listings {
            let row = NewListingRow {
                title: seed.title.clone(),
                make: seed.make.clone(),
                model: seed.model.clone(),
                year: seed.year,
                price: seed.price,
                mileage: seed.mileage,
                location: seed.location.clone(),
                description: seed.description.clone(),
                image_url: seed.image_url.clone(),
                user_id: AccountId::new(&seed.seller),
            };
            source.insert_listing(&row).await?;
            report.listings += 1;
        }

        catalog.invalidate().await;
        info!(?report, "Seeded remote catalog");
        Ok(report)
    }
}

impl SeedReport {
    fn record(&mut self, status: SyncStatus) {
        if !status.is_durable() {
            self.failed += 1;
        } else if status.is_degraded() {
            self.degraded += 1;
        }
    }
}
