//! Listing commands on the local stores.

use clap::Args;
use rust_decimal::Decimal;
use tracing::info;

use autosouq_core::ListingId;
use autosouq_storefront::error::AppError;
use autosouq_storefront::search::ListingQuery;
use autosouq_storefront::services::NewListing;
use autosouq_storefront::state::AppState;

use crate::output;

/// Fields of a new listing.
#[derive(Debug, Args)]
pub struct SellArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub make: String,

    #[arg(long)]
    pub model: String,

    #[arg(long)]
    pub year: i32,

    /// Asking price in AED
    #[arg(long)]
    pub price: Decimal,

    /// Odometer reading in km
    #[arg(long)]
    pub mileage: i32,

    #[arg(long)]
    pub location: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long)]
    pub image_url: Option<String>,

    /// Also publish to the hosted catalog
    #[arg(long)]
    pub publish: bool,
}

impl From<SellArgs> for NewListing {
    fn from(args: SellArgs) -> Self {
        Self {
            title: args.title,
            make: args.make,
            model: args.model,
            year: args.year,
            price: args.price,
            mileage: args.mileage,
            location: args.location,
            description: args.description,
            image_url: args.image_url,
        }
    }
}

/// Build the browse query from command-line filters.
fn query(
    search: Option<String>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    location: Option<String>,
) -> ListingQuery {
    let defaults = ListingQuery::default();
    ListingQuery {
        search,
        min_price: min_price.unwrap_or(defaults.min_price),
        max_price: max_price.unwrap_or(defaults.max_price),
        location,
    }
}

pub async fn browse(
    state: &AppState,
    search: Option<String>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    location: Option<String>,
) {
    let outcome = state
        .listings()
        .browse(&query(search, min_price, max_price, location))
        .await;
    output::note_status(outcome.status);
    for listing in &outcome.value {
        output::line(output::listing(listing));
    }
}

pub async fn locations(state: &AppState) {
    let outcome = state.listings().locations().await;
    output::note_status(outcome.status);
    for location in &outcome.value {
        output::line(location);
    }
}

/// # Errors
///
/// Returns `AppError::NotFound` if no local store holds the listing.
pub async fn show(state: &AppState, id: &str) -> Result<(), AppError> {
    let outcome = state.listings().detail(&ListingId::new(id)).await;
    output::note_status(outcome.status);
    let listing = outcome
        .value
        .ok_or_else(|| AppError::NotFound(format!("listing {id}")))?;

    output::line(output::listing(&listing));
    if !listing.description.is_empty() {
        output::line(&listing.description);
    }
    Ok(())
}

/// Create a listing for the logged-in seller, optionally publishing it.
///
/// # Errors
///
/// Returns an error without a session, for invalid fields, if neither local
/// store accepted the listing, or if publishing fails.
pub async fn sell(state: &AppState, args: SellArgs) -> Result<(), AppError> {
    let publish = args.publish;
    let input = NewListing::from(args);

    let listing = state.listings().create(&input).await?;
    output::line(output::listing(&listing));

    if publish {
        let catalog = state.catalog().await?;
        let view = catalog
            .publish(&input.to_remote_row(&listing.owner_id))
            .await?;
        info!(local_id = %listing.id, remote_id = %view.id, "Listing published");
        output::line(output::listing_view(&view));
    }
    Ok(())
}

/// # Errors
///
/// Returns `AuthError::NotLoggedIn` without a session.
pub async fn mine(state: &AppState) -> Result<(), AppError> {
    let session = state.auth().require_session().await?;
    let outcome = state.listings().mine(&session).await;
    output::note_status(outcome.status);
    for listing in &outcome.value {
        output::line(output::listing(listing));
    }
    Ok(())
}
