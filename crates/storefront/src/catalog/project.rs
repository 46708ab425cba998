use std::collections::{HashMap, HashSet};

use autosouq_core::{AccountId, CurrencyCode, Price};

use super::{ListingRow, ListingView, ProfileRow, SellerView};

/// Distinct owner ids of `rows`, in first-seen order.
#[must_use]
pub fn distinct_owners(rows: &[ListingRow]) -> Vec<AccountId> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.iter()
        .filter(|row| seen.insert(&row.user_id))
        .map(|row| row.user_id.clone())
        .collect()
}

/// Join listing rows with resolved profiles.
///
/// Preserves row order. An owner missing from `profiles` gets `placeholder`
/// as name and no phone.
#[must_use]
pub fn project(
    rows: Vec<ListingRow>,
    profiles: &HashMap<AccountId, ProfileRow>,
    placeholder: &str,
) -> Vec<ListingView> {
    rows.into_iter()
        .map(|row| {
            let seller = profiles.get(&row.user_id).map_or_else(
                || SellerView {
                    id: row.user_id.clone(),
                    name: placeholder.to_string(),
                    phone: None,
                },
                |profile| SellerView {
                    id: row.user_id.clone(),
                    name: profile.name.clone(),
                    phone: profile.phone.clone(),
                },
            );

            ListingView {
                id: row.id,
                title: row.title,
                make: row.make,
                model: row.model,
                year: row.year,
                price: Price::new(row.price, CurrencyCode::AED),
                mileage: row.mileage,
                location: row.location,
                description: row.description,
                image_url: row.image_url.unwrap_or_default(),
                seller,
                created_at: row.created_at,
            }
        })
        .collect()
}
