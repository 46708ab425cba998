//! Account commands on the local stores.

use tracing::info;

use autosouq_storefront::error::AppError;
use autosouq_storefront::services::{ProfileChanges, Registration};
use autosouq_storefront::state::AppState;

use crate::output;

/// Create an account and log in as it.
///
/// # Errors
///
/// Returns an error for invalid input, a taken email, or a failed save.
pub async fn register(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
    phone: Option<&str>,
    location: Option<&str>,
) -> Result<(), AppError> {
    let auth = state.auth();
    let account = auth
        .register(&Registration {
            name,
            email,
            password,
            phone,
            location,
        })
        .await?;
    let session = auth.login(account.email.as_str(), password).await?;
    output::line(output::session(&session));
    Ok(())
}

/// # Errors
///
/// Returns `AuthError::InvalidCredentials` for a wrong email or password.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<(), AppError> {
    let session = state.auth().login(email, password).await?;
    output::line(output::session(&session));
    Ok(())
}

/// # Errors
///
/// Returns an error if the session record cannot be removed.
pub async fn logout(state: &AppState) -> Result<(), AppError> {
    state.auth().logout().await?;
    Ok(())
}

/// # Errors
///
/// Returns `AuthError::NotLoggedIn` without a session.
pub async fn whoami(state: &AppState) -> Result<(), AppError> {
    let session = state.auth().require_session().await?;
    output::line(output::session(&session));
    Ok(())
}

/// Show the session, applying `changes` first if there are any.
///
/// # Errors
///
/// Returns an error without a session, for a blank name, or if the account
/// cannot be saved.
pub async fn profile(state: &AppState, changes: &ProfileChanges) -> Result<(), AppError> {
    let auth = state.auth();
    let session = if changes.name.is_none() && changes.phone.is_none() && changes.location.is_none()
    {
        auth.require_session().await?
    } else {
        auth.update_profile(changes).await?
    };
    output::line(output::session(&session));
    Ok(())
}

/// Wipe both local stores and the session record.
///
/// # Errors
///
/// Returns `AppError::Internal` if neither store could be cleared.
pub async fn reset(state: &AppState) -> Result<(), AppError> {
    let status = state.store().clear_local().await;
    output::note_status(status);
    if !status.is_durable() {
        return Err(AppError::Internal(format!(
            "local stores could not be cleared ({status})"
        )));
    }
    state.auth().logout().await?;
    info!(%status, "Local stores cleared");
    Ok(())
}
