//! Hosted catalog commands.
//!
//! These need `AUTOSOUQ_REMOTE_DATABASE_URL`. Listings come back joined with
//! their seller profiles.

use tracing::info;

use autosouq_core::{AccountId, ListingId};
use autosouq_storefront::catalog::ProfileUpdate;
use autosouq_storefront::error::AppError;
use autosouq_storefront::services::ProfileChanges;
use autosouq_storefront::state::AppState;

use crate::output;

/// The newest `limit` listings, or the configured featured count.
///
/// # Errors
///
/// Returns an error if the catalog is unreachable or the listing query fails.
pub async fn featured(state: &AppState, limit: Option<u32>) -> Result<(), AppError> {
    let limit = limit.unwrap_or(state.config().featured_limit);
    let views = state.catalog().await?.recent_listings(Some(limit)).await?;
    for view in &views {
        output::line(output::listing_view(view));
    }
    Ok(())
}

/// # Errors
///
/// Returns `RemoteError::NotFound` if the catalog has no such listing.
pub async fn show(state: &AppState, id: &str) -> Result<(), AppError> {
    let view = state
        .catalog()
        .await?
        .listing_detail(&ListingId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("listing {id}")))?;

    output::line(output::listing_view(&view));
    if !view.description.is_empty() {
        output::line(&view.description);
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the catalog is unreachable.
pub async fn seller(state: &AppState, id: &str) -> Result<(), AppError> {
    let views = state
        .catalog()
        .await?
        .seller_listings(&AccountId::new(id))
        .await?;
    for view in &views {
        output::line(output::listing_view(view));
    }
    Ok(())
}

/// Show the logged-in account's hosted profile, creating it on first use and
/// applying `changes` if there are any.
///
/// # Errors
///
/// Returns an error without a session or if the catalog query fails.
pub async fn profile(state: &AppState, changes: ProfileChanges) -> Result<(), AppError> {
    let session = state.auth().require_session().await?;
    let catalog = state.catalog().await?;

    let mut profile = catalog
        .profile(&session.id, &session.email, Some(&session.name))
        .await?;

    let update = ProfileUpdate {
        name: changes.name,
        phone: changes.phone,
        location: changes.location,
    };
    if !update.is_empty() {
        profile = catalog.update_profile(&session.id, &update).await?;
        info!(account_id = %session.id, "Hosted profile updated");
    }

    output::line(output::profile(&profile));
    Ok(())
}
