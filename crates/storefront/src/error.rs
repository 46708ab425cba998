//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for front-ends. Server-side failures are
//! captured to Sentry by [`AppError::report`]; user mistakes are not.

use thiserror::Error;

use crate::cache::KvError;
use crate::catalog::RemoteError;
use crate::config::ConfigError;
use crate::db::RepositoryError;
use crate::seed::SeedError;
use crate::services::auth::AuthError;
use crate::services::listings::ListingError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Remote catalog operation failed.
    #[error("Catalog error: {0}")]
    Remote(#[from] RemoteError),

    /// Flat cache operation failed.
    #[error("Cache error: {0}")]
    Cache(#[from] KvError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Listing operation failed.
    #[error("Listing error: {0}")]
    Listing(#[from] ListingError),

    /// Configuration is missing or invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Seed file is inconsistent.
    #[error("Seed error: {0}")]
    Seed(#[from] SeedError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the failure is ours rather than the user's.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Cache(_) | Self::Config(_) | Self::Internal(_) => true,
            Self::Remote(err) => !matches!(err, RemoteError::NotFound(_)),
            Self::Auth(err) => matches!(
                err,
                AuthError::Storage(_) | AuthError::Session(_) | AuthError::PasswordHash
            ),
            Self::Listing(err) => matches!(err, ListingError::Storage(_)),
            Self::Seed(err) => matches!(err, SeedError::Auth(_, _)),
            Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }

    /// Log the error, capturing server errors to Sentry.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Command failed"
            );
        } else {
            tracing::warn!(error = %self, "Command rejected");
        }
    }

    /// Message safe to show to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Cache(_) | Self::Internal(_) => {
                "Local storage error".to_string()
            }
            Self::Remote(RemoteError::NotFound(what)) => format!("Not found: {what}"),
            Self::Remote(RemoteError::NotConfigured) => {
                "Remote catalog is not configured".to_string()
            }
            Self::Remote(_) => "Remote catalog unavailable".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::AccountNotFound => {
                    "Invalid credentials".to_string()
                }
                AuthError::EmailTaken => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::MissingName => "Name is required".to_string(),
                AuthError::NotLoggedIn => "Please log in first".to_string(),
                _ => "Authentication error".to_string(),
            },
            Self::Listing(ListingError::Storage(_)) => "Listing could not be saved".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("listing", "Listing created", Some(&[("listing_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
