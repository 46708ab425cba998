//! Load sample sellers and listings from a YAML file.
//!
//! See `seed/sample_cars.yaml` for the format.

use std::path::Path;

use tracing::{info, warn};

use autosouq_storefront::error::AppError;
use autosouq_storefront::seed::SeedFile;
use autosouq_storefront::state::AppState;

/// Seed the local stores, and the hosted catalog when `remote` is set.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, references an
/// unknown seller, or a remote insert fails.
pub async fn run(state: &AppState, path: &Path, remote: bool) -> Result<(), AppError> {
    if !path.exists() {
        return Err(AppError::BadRequest(format!(
            "File not found: {}",
            path.display()
        )));
    }

    info!(path = %path.display(), "Loading seed file");

    // Read and validate before touching any store
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::BadRequest(format!("Cannot read {}: {e}", path.display())))?;
    let file: SeedFile = serde_yaml::from_str(&content)
        .map_err(|e| AppError::BadRequest(format!("Invalid seed file: {e}")))?;
    file.validate()?;

    info!(
        sellers = file.sellers.len(),
        listings = file.listings.len(),
        "Parsed seed file"
    );

    let report = file.apply_local(state.store()).await?;
    info!("Local seeding complete!");
    info!("  Accounts written: {}", report.accounts);
    info!("  Listings written: {}", report.listings);
    if report.degraded > 0 || report.failed > 0 {
        warn!(
            degraded = report.degraded,
            failed = report.failed,
            "Some records were not written to both local stores"
        );
    }

    if remote {
        let catalog = state.catalog().await?;
        let report = file.apply_remote(catalog).await?;
        info!("Remote seeding complete!");
        info!("  Profiles inserted: {}", report.accounts);
        info!("  Listings inserted: {}", report.listings);
    }

    Ok(())
}
