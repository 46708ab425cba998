//! Remote row shapes and the joined view.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use autosouq_core::{AccountId, ListingId, Price};

/// A `car_listings` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub id: ListingId,
    pub title: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: Decimal,
    pub mileage: i32,
    pub location: String,
    pub description: String,
    pub image_url: Option<String>,
    /// Owner reference; `profiles.id` by convention only.
    pub user_id: AccountId,
    pub created_at: DateTime<Utc>,
}

/// Values for a new `car_listings` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewListingRow {
    pub title: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: Decimal,
    pub mileage: i32,
    pub location: String,
    pub description: String,
    pub image_url: Option<String>,
    pub user_id: AccountId,
}

/// A `profiles` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

impl ProfileUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.location.is_none()
    }
}

/// Seller summary attached to a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerView {
    pub id: AccountId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A listing joined with its seller, as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    pub id: ListingId,
    pub title: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: Price,
    pub mileage: i32,
    pub location: String,
    pub description: String,
    /// Empty when the listing has no image.
    pub image_url: String,
    pub seller: SellerView,
    pub created_at: DateTime<Utc>,
}
