//! Schema creation commands.
//!
//! # Usage
//!
//! ```bash
//! # Embedded store only
//! autosouq migrate local
//!
//! # Hosted catalog (needs AUTOSOUQ_REMOTE_DATABASE_URL)
//! autosouq migrate remote
//!
//! # Both
//! autosouq migrate all
//! ```
//!
//! Both schemas are created with `IF NOT EXISTS`, so running a migration
//! again is harmless.

use tracing::{info, warn};

use autosouq_storefront::error::AppError;
use autosouq_storefront::state::AppState;

/// Create the embedded store schema.
///
/// # Errors
///
/// Returns an error if the schema statements fail.
pub async fn local(state: &AppState) -> Result<(), AppError> {
    let Some(store) = state.store().embedded() else {
        warn!("Embedded store is disabled or unavailable, nothing to migrate");
        return Ok(());
    };

    info!(path = ?state.config().embedded_db, "Running embedded store migrations...");
    store.migrate().await?;
    info!("Embedded store migrations complete!");
    Ok(())
}

/// Create the hosted catalog schema.
///
/// # Errors
///
/// Returns an error if no remote database is configured, the connection
/// fails, or the schema statements fail.
pub async fn remote(state: &AppState) -> Result<(), AppError> {
    info!("Connecting to remote catalog...");
    let catalog = state.catalog().await?;

    info!("Running remote catalog migrations...");
    catalog.source().migrate().await?;
    info!("Remote catalog migrations complete!");
    Ok(())
}
