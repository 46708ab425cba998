//! Hosted catalog queries (`PostgreSQL`).
//!
//! Runtime-checked queries: the schema lives in a database this crate does not
//! own, so there is nothing to verify against at compile time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use autosouq_core::{AccountId, ListingId};

use super::RepositoryError;
use crate::catalog::{
    CatalogSource, ListingRow, NewListingRow, ProfileRow, ProfileUpdate, RemoteError,
};

/// Schema of the hosted catalog. Idempotent.
const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS profiles (
        id         TEXT PRIMARY KEY,
        name       TEXT NOT NULL,
        email      TEXT NOT NULL DEFAULT '',
        phone      TEXT,
        location   TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS car_listings (
        id          TEXT PRIMARY KEY DEFAULT gen_random_uuid()::text,
        title       TEXT NOT NULL,
        make        TEXT NOT NULL,
        model       TEXT NOT NULL,
        year        INTEGER NOT NULL,
        price       NUMERIC(12, 2) NOT NULL CHECK (price > 0),
        mileage     INTEGER NOT NULL CHECK (mileage >= 0),
        location    TEXT NOT NULL,
        description TEXT,
        image_url   TEXT,
        user_id     TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    ",
    "CREATE INDEX IF NOT EXISTS car_listings_created_at_idx ON car_listings (created_at DESC)",
    "CREATE INDEX IF NOT EXISTS car_listings_user_id_idx ON car_listings (user_id)",
];

const LISTING_COLUMNS: &str = "id::text AS id, title, make, model, year, price, mileage, \
     location, COALESCE(description, '') AS description, image_url, \
     user_id::text AS user_id, created_at";

const PROFILE_COLUMNS: &str =
    "id::text AS id, name, email, phone, location, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ListingRecord {
    id: String,
    title: String,
    make: String,
    model: String,
    year: i32,
    price: Decimal,
    mileage: i32,
    location: String,
    description: String,
    image_url: Option<String>,
    user_id: String,
    created_at: DateTime<Utc>,
}

impl From<ListingRecord> for ListingRow {
    fn from(r: ListingRecord) -> Self {
        Self {
            id: ListingId::new(r.id),
            title: r.title,
            make: r.make,
            model: r.model,
            year: r.year,
            price: r.price,
            mileage: r.mileage,
            location: r.location,
            description: r.description,
            image_url: r.image_url,
            user_id: AccountId::new(r.user_id),
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRecord {
    id: String,
    name: String,
    email: String,
    phone: Option<String>,
    location: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRecord> for ProfileRow {
    fn from(r: ProfileRecord) -> Self {
        Self {
            id: AccountId::new(r.id),
            name: r.name,
            email: r.email,
            phone: r.phone,
            location: r.location,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// [`CatalogSource`] over the hosted `car_listings` and `profiles` tables.
#[derive(Clone, Debug)]
pub struct PgCatalogSource {
    pool: PgPool,
}

impl PgCatalogSource {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the catalog tables if they do not exist.
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
        debug!("Remote catalog schema ready");
        Ok(())
    }
}

impl CatalogSource for PgCatalogSource {
    #[instrument(skip(self))]
    async fn fetch_primary(&self, limit: Option<u32>) -> Result<Vec<ListingRow>, RemoteError> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM car_listings ORDER BY created_at DESC, id LIMIT $1"
        );
        let rows: Vec<ListingRecord> = sqlx::query_as(&sql)
            .bind(limit.map(i64::from))
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(rows.into_iter().map(ListingRow::from).collect())
    }

    #[instrument(skip(self, ids), fields(owners = ids.len()))]
    async fn resolve_owners(&self, ids: &[AccountId]) -> Result<Vec<ProfileRow>, RemoteError> {
        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ANY($1)");
        let rows: Vec<ProfileRecord> = sqlx::query_as(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(rows.into_iter().map(ProfileRow::from).collect())
    }

    async fn fetch_listing(&self, id: &ListingId) -> Result<Option<ListingRow>, RemoteError> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM car_listings WHERE id = $1");
        let row: Option<ListingRecord> = sqlx::query_as(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(row.map(ListingRow::from))
    }

    async fn fetch_by_owner(&self, owner_id: &AccountId) -> Result<Vec<ListingRow>, RemoteError> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM car_listings WHERE user_id = $1 \
             ORDER BY created_at DESC, id"
        );
        let rows: Vec<ListingRecord> = sqlx::query_as(&sql)
            .bind(owner_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(rows.into_iter().map(ListingRow::from).collect())
    }

    #[instrument(skip(self, listing), fields(owner_id = %listing.user_id))]
    async fn insert_listing(&self, listing: &NewListingRow) -> Result<ListingRow, RemoteError> {
        let sql = format!(
            r"
            INSERT INTO car_listings
                (title, make, model, year, price, mileage, location, description, image_url, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {LISTING_COLUMNS}
            "
        );
        let row: ListingRecord = sqlx::query_as(&sql)
            .bind(&listing.title)
            .bind(&listing.make)
            .bind(&listing.model)
            .bind(listing.year)
            .bind(listing.price)
            .bind(listing.mileage)
            .bind(&listing.location)
            .bind(&listing.description)
            .bind(listing.image_url.as_deref())
            .bind(listing.user_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "listing"))?;
        Ok(row.into())
    }

    async fn fetch_profile(&self, id: &AccountId) -> Result<Option<ProfileRow>, RemoteError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1");
        let row: Option<ProfileRecord> = sqlx::query_as(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(row.map(ProfileRow::from))
    }

    #[instrument(skip(self, profile), fields(account_id = %profile.id))]
    async fn insert_profile(&self, profile: &ProfileRow) -> Result<ProfileRow, RemoteError> {
        let sql = format!(
            r"
            INSERT INTO profiles (id, name, email, phone, location, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PROFILE_COLUMNS}
            "
        );
        let row: ProfileRecord = sqlx::query_as(&sql)
            .bind(profile.id.as_str())
            .bind(&profile.name)
            .bind(&profile.email)
            .bind(profile.phone.as_deref())
            .bind(profile.location.as_deref())
            .bind(profile.created_at)
            .bind(profile.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "profile"))?;
        Ok(row.into())
    }

    #[instrument(skip(self, update), fields(account_id = %id))]
    async fn update_profile(
        &self,
        id: &AccountId,
        update: &ProfileUpdate,
    ) -> Result<ProfileRow, RemoteError> {
        let sql = format!(
            r"
            UPDATE profiles
               SET name = COALESCE($2, name),
                   phone = COALESCE($3, phone),
                   location = COALESCE($4, location),
                   updated_at = now()
             WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "
        );
        let row: Option<ProfileRecord> = sqlx::query_as(&sql)
            .bind(id.as_str())
            .bind(update.name.as_deref())
            .bind(update.phone.as_deref())
            .bind(update.location.as_deref())
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        row.map(ProfileRow::from)
            .ok_or_else(|| RemoteError::NotFound(format!("profile {id}")))
    }
}
