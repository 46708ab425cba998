//! Line formatting for command output.

use std::fmt::Display;

use tracing::warn;

use autosouq_core::{Listing, Session, SyncStatus};
use autosouq_storefront::catalog::{ListingView, ProfileRow};

/// Print one record.
#[allow(clippy::print_stdout)]
pub fn line(value: impl Display) {
    println!("{value}");
}

/// Print a failure message for the user.
#[allow(clippy::print_stderr)]
pub fn failure(message: &str) {
    eprintln!("error: {message}");
}

/// Warn when a result came from a degraded store.
pub fn note_status(status: SyncStatus) {
    if status.is_degraded() || !status.is_durable() {
        warn!(%status, "Result served from a degraded local store");
    }
}

pub fn listing(listing: &Listing) -> String {
    format!(
        "{}  {}  {}  {} km  {}",
        listing.id, listing.title, listing.price, listing.mileage, listing.location
    )
}

pub fn listing_view(view: &ListingView) -> String {
    let mut out = format!(
        "{}  {}  {}  {} km  {}  seller: {}",
        view.id, view.title, view.price, view.mileage, view.location, view.seller.name
    );
    if let Some(phone) = &view.seller.phone {
        out.push_str(" (");
        out.push_str(phone);
        out.push(')');
    }
    out
}

pub fn session(session: &Session) -> String {
    contact(
        session.id.as_str(),
        &session.name,
        session.email.as_str(),
        session.phone.as_deref(),
        session.location.as_deref(),
    )
}

pub fn profile(profile: &ProfileRow) -> String {
    contact(
        profile.id.as_str(),
        &profile.name,
        &profile.email,
        profile.phone.as_deref(),
        profile.location.as_deref(),
    )
}

fn contact(id: &str, name: &str, email: &str, phone: Option<&str>, location: Option<&str>) -> String {
    format!(
        "{id}  {name} <{email}>  phone: {}  location: {}",
        phone.unwrap_or("-"),
        location.unwrap_or("-")
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use autosouq_core::{AccountId, Email, ListingId, Price};
    use autosouq_storefront::catalog::SellerView;

    use super::*;

    #[test]
    fn test_listing_line() {
        let listing = Listing {
            id: ListingId::new("3"),
            title: "2020 Audi A6 45 TFSI".to_string(),
            make: "Audi".to_string(),
            model: "A6".to_string(),
            year: 2020,
            price: Price::whole(175_000),
            mileage: 58_000,
            location: "Sharjah".to_string(),
            description: String::new(),
            image_url: None,
            owner_id: AccountId::new("u3"),
            created_at: Utc::now(),
        };
        assert_eq!(
            super::listing(&listing),
            "3  2020 Audi A6 45 TFSI  AED 175000  58000 km  Sharjah"
        );
    }

    #[test]
    fn test_listing_view_line_includes_seller() {
        let view = ListingView {
            id: ListingId::new("5"),
            title: "2018 Lexus ES 350".to_string(),
            make: "Lexus".to_string(),
            model: "ES".to_string(),
            year: 2018,
            price: Price::whole(120_000),
            mileage: 65_000,
            location: "Al Ain".to_string(),
            description: String::new(),
            image_url: String::new(),
            seller: SellerView {
                id: AccountId::new("u5"),
                name: "Al Ain Motors".to_string(),
                phone: Some("+971 3 555 0100".to_string()),
            },
            created_at: Utc::now(),
        };
        assert_eq!(
            listing_view(&view),
            "5  2018 Lexus ES 350  AED 120000  65000 km  Al Ain  seller: Al Ain Motors (+971 3 555 0100)"
        );
    }

    #[test]
    fn test_session_line_marks_missing_fields() {
        let session = Session {
            id: AccountId::new("u1"),
            name: "Amal".to_string(),
            email: Email::parse("amal@example.ae").unwrap(),
            phone: None,
            location: Some("Dubai".to_string()),
        };
        assert_eq!(
            super::session(&session),
            "u1  Amal <amal@example.ae>  phone: -  location: Dubai"
        );
    }
}
