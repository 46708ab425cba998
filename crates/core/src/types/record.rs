//! Account and listing records.
//!
//! These are the rows both local stores hold. Field names serialize in
//! camelCase, the shape the flat cache has always used.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Email, ListingId, Price};

/// A record addressable by a unique string key.
pub trait Record {
    /// Primary key of the record.
    fn record_key(&self) -> &str;
}

/// A registered user/seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Unique across accounts.
    pub email: Email,
    /// Argon2id PHC string. Never a plaintext password.
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Account {
    fn record_key(&self) -> &str {
        self.id.as_str()
    }
}

/// A car for sale, owned by an [`Account`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: Price,
    pub mileage: i32,
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub owner_id: AccountId,
    pub created_at: DateTime<Utc>,
}

impl Record for Listing {
    fn record_key(&self) -> &str {
        self.id.as_str()
    }
}

/// Snapshot of the logged-in account, cached for fast reads.
///
/// Non-authoritative: the account stores remain the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: AccountId,
    pub name: String,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl From<&Account> for Session {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            phone: account.phone.clone(),
            location: account.location.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn account() -> Account {
        let now = Utc::now();
        Account {
            id: AccountId::new("u1"),
            name: "Dubai Luxury Motors".to_string(),
            email: Email::parse("a@x.com").unwrap(),
            password_hash: "$argon2id$stub".to_string(),
            phone: Some("+971 50 000 0000".to_string()),
            location: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_session_has_no_password_hash() {
        let session = Session::from(&account());
        let json = serde_json::to_string(&session).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"id\":\"u1\""));
        assert!(!json.contains("location"));
    }

    #[test]
    fn test_listing_uses_camel_case_keys() {
        let listing = Listing {
            id: ListingId::new("l1"),
            title: "2019 Mercedes-Benz S-Class S 450".to_string(),
            make: "Mercedes-Benz".to_string(),
            model: "S-Class".to_string(),
            year: 2019,
            price: Price::whole(259_000),
            mileage: 45_000,
            location: "Dubai".to_string(),
            description: String::new(),
            image_url: None,
            owner_id: AccountId::new("u1"),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["ownerId"], "u1");
        assert!(json.get("createdAt").is_some());
        assert_eq!(listing.record_key(), "l1");
    }
}
