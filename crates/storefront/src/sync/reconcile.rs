//! Merge policy between the embedded store and the flat cache.
//!
//! - a row present in both stores: the embedded copy wins;
//! - a row present only in the flat cache: kept, and reported so it can be
//!   written back into the embedded store;
//! - a row present only in the embedded store: kept.

use std::collections::HashSet;

use autosouq_core::{Account, Listing, Record};

/// Outcome of [`reconcile`].
#[derive(Debug)]
pub struct Reconciled<T> {
    /// Every row, embedded rows first.
    pub merged: Vec<T>,
    /// Rows found only in the flat cache.
    pub cache_only: Vec<T>,
}

/// Merge `embedded` (authoritative) with `cached`.
#[must_use]
pub fn reconcile<T: Record + Clone>(embedded: Vec<T>, cached: Vec<T>) -> Reconciled<T> {
    let cache_only: Vec<T> = {
        let mut seen: HashSet<String> = embedded
            .iter()
            .map(|row| row.record_key().to_owned())
            .collect();
        cached
            .into_iter()
            .filter(|row| seen.insert(row.record_key().to_owned()))
            .collect()
    };

    let mut merged = embedded;
    merged.extend(cache_only.iter().cloned());
    Reconciled { merged, cache_only }
}

/// Accounts in creation order, ties by id.
pub fn sort_accounts(accounts: &mut [Account]) {
    accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

/// Listings newest first, ties by id.
pub fn sort_listings(listings: &mut [Listing]) {
    listings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use autosouq_core::{AccountId, ListingId, Price};

    use super::*;

    fn listing(id: &str, price: i64, age_days: i64) -> Listing {
        Listing {
            id: ListingId::new(id),
            title: format!("Listing {id}"),
            make: "Audi".to_string(),
            model: "A6".to_string(),
            year: 2020,
            price: Price::whole(price),
            mileage: 10_000,
            location: "Dubai".to_string(),
            description: String::new(),
            image_url: None,
            owner_id: AccountId::new("u1"),
            created_at: Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap() - Duration::days(age_days),
        }
    }

    #[test]
    fn test_embedded_wins_on_shared_id() {
        let result = reconcile(
            vec![listing("l1", 1000, 0)],
            vec![listing("l1", 9999, 0), listing("l2", 2000, 1)],
        );

        assert_eq!(result.merged.len(), 2);
        assert_eq!(result.merged[0].price, Price::whole(1000));
        assert_eq!(result.cache_only.len(), 1);
        assert_eq!(result.cache_only[0].id.as_str(), "l2");
    }

    #[test]
    fn test_duplicate_cache_rows_collapse() {
        let result = reconcile(Vec::new(), vec![listing("l1", 1, 0), listing("l1", 2, 0)]);
        assert_eq!(result.merged.len(), 1);
        assert_eq!(result.cache_only.len(), 1);
    }

    #[test]
    fn test_sort_listings_newest_first_then_id() {
        let mut rows = vec![listing("b", 1, 2), listing("c", 1, 0), listing("a", 1, 0)];
        sort_listings(&mut rows);
        let ids: Vec<_> = rows.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["a", "c", "b"]);
    }
}
