//! Listing search for the browse view.
//!
//! In-memory filtering over the listings the local stores hold: a title
//! substring, an inclusive price range and an exact location.

use rust_decimal::Decimal;

use autosouq_core::Listing;

/// Upper end of the default price range (AED).
pub const DEFAULT_MAX_PRICE: i64 = 500_000;

/// Location value that matches every listing.
pub const ANY_LOCATION: &str = "all";

/// Browse filters. The default matches every listing priced up to
/// [`DEFAULT_MAX_PRICE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    /// Case-insensitive substring of the title. Blank matches everything.
    pub search: Option<String>,
    /// Inclusive lower price bound.
    pub min_price: Decimal,
    /// Inclusive upper price bound.
    pub max_price: Decimal,
    /// Exact location, or `None` / [`ANY_LOCATION`] for any.
    pub location: Option<String>,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            search: None,
            min_price: Decimal::ZERO,
            max_price: Decimal::from(DEFAULT_MAX_PRICE),
            location: None,
        }
    }
}

impl ListingQuery {
    /// Whether `listing` passes every filter.
    #[must_use]
    pub fn matches(&self, listing: &Listing) -> bool {
        let title_ok = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .is_none_or(|term| {
                listing
                    .title
                    .to_lowercase()
                    .contains(&term.to_lowercase())
            });

        let amount = listing.price.amount;
        let price_ok = amount >= self.min_price && amount <= self.max_price;

        let location_ok = self
            .location
            .as_deref()
            .filter(|location| *location != ANY_LOCATION)
            .is_none_or(|location| listing.location == location);

        title_ok && price_ok && location_ok
    }

    /// Listings passing every filter, order preserved.
    #[must_use]
    pub fn apply(&self, listings: Vec<Listing>) -> Vec<Listing> {
        listings.into_iter().filter(|l| self.matches(l)).collect()
    }
}

/// Distinct listing locations, sorted.
#[must_use]
pub fn locations(listings: &[Listing]) -> Vec<String> {
    let mut locations: Vec<String> = listings.iter().map(|l| l.location.clone()).collect();
    locations.sort();
    locations.dedup();
    locations
}
