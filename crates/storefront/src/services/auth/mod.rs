//! Authentication service.
//!
//! Password accounts kept in the local stores, plus the cached session record
//! for the logged-in account.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use tracing::{info, instrument};

use autosouq_core::{Account, AccountId, Email, Session};

use crate::cache::{KeyValueStore, SessionStore};
use crate::db::EmbeddedStore;
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::sync::DualStore;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Input for [`AuthService::register`].
#[derive(Debug, Clone)]
pub struct Registration<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub phone: Option<&'a str>,
    pub location: Option<&'a str>,
}

/// Profile fields to change. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

/// Authentication service.
///
/// Handles registration, login, logout and profile edits.
pub struct AuthService<'a, K, E> {
    store: &'a DualStore<K, E>,
    sessions: &'a SessionStore<K>,
}

impl<'a, K: KeyValueStore, E: EmbeddedStore> AuthService<'a, K, E> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a DualStore<K, E>, sessions: &'a SessionStore<K>) -> Self {
        Self { store, sessions }
    }

    /// Register a new account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::EmailTaken` if the email is already registered.
    /// Returns `AuthError::Storage` if neither local store accepted the account.
    #[instrument(skip(self, registration))]
    pub async fn register(&self, registration: &Registration<'_>) -> Result<Account, AuthError> {
        let email = Email::parse(registration.email)?;
        let name = registration.name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        validate_password(registration.password)?;

        if self.store.find_account_by_email(&email).await.value.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(registration.password)?;
        let now = Utc::now();
        let account = Account {
            id: AccountId::generate(),
            name: name.to_string(),
            email,
            password_hash,
            phone: non_empty(registration.phone),
            location: non_empty(registration.location),
            created_at: now,
            updated_at: now,
        };

        let status = self.store.save_account(&account).await;
        if !status.is_durable() {
            return Err(AuthError::Storage(status));
        }

        info!(account_id = %account.id, %status, "Account registered");
        Ok(account)
    }

    /// Log in and write the session record.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AuthError::Session` if the session record cannot be written.
    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = Email::parse(email)?;

        let account = self
            .store
            .find_account_by_email(&email)
            .await
            .value
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &account.password_hash)?;

        let session = Session::from(&account);
        self.sessions.set(Some(&session)).await?;

        set_sentry_user(&account.id, Some(account.email.as_str()));
        add_breadcrumb("auth", "Logged in", None);
        info!(account_id = %account.id, "Logged in");
        Ok(session)
    }

    /// Remove the session record.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the record cannot be removed.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.sessions.set(None).await?;
        clear_sentry_user();
        add_breadcrumb("auth", "Logged out", None);
        Ok(())
    }

    /// The logged-in account snapshot, if any.
    pub async fn current_session(&self) -> Option<Session> {
        self.sessions.current().await
    }

    /// The logged-in account snapshot.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` if there is no session.
    pub async fn require_session(&self) -> Result<Session, AuthError> {
        self.current_session().await.ok_or(AuthError::NotLoggedIn)
    }

    /// Edit the logged-in account and refresh the session record.
    ///
    /// Empty strings clear `phone` and `location`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` without a session,
    /// `AuthError::AccountNotFound` if the session's account is gone,
    /// `AuthError::MissingName` for a blank name.
    #[instrument(skip(self, changes))]
    pub async fn update_profile(&self, changes: &ProfileChanges) -> Result<Session, AuthError> {
        let session = self.require_session().await?;

        let mut account = self
            .store
            .find_account(&session.id)
            .await
            .value
            .ok_or(AuthError::AccountNotFound)?;

        if let Some(name) = &changes.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AuthError::MissingName);
            }
            account.name = name.to_string();
        }
        if let Some(phone) = &changes.phone {
            account.phone = non_empty(Some(phone));
        }
        if let Some(location) = &changes.location {
            account.location = non_empty(Some(location));
        }
        account.updated_at = Utc::now();

        let status = self.store.save_account(&account).await;
        if !status.is_durable() {
            return Err(AuthError::Storage(status));
        }

        let session = Session::from(&account);
        self.sessions.set(Some(&session)).await?;
        info!(account_id = %account.id, %status, "Profile updated");
        Ok(session)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cache::MemoryKeyValueStore;
    use crate::db::{SqliteEmbeddedStore, create_memory_pool};

    async fn fixture() -> (DualStore<MemoryKeyValueStore, SqliteEmbeddedStore>, SessionStore<MemoryKeyValueStore>) {
        let kv = MemoryKeyValueStore::new();
        let db = SqliteEmbeddedStore::new(create_memory_pool().await.unwrap());
        db.migrate().await.unwrap();
        (DualStore::new(kv.clone(), Some(db)), SessionStore::new(kv))
    }

    fn registration<'a>(email: &'a str, password: &'a str) -> Registration<'a> {
        Registration {
            name: "Dubai Luxury Motors",
            email,
            password,
            phone: Some("+971 50 123 4567"),
            location: Some("Dubai"),
        }
    }

    #[test]
    fn test_hash_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(verify_password("wrong horse", &hash).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_password() {
        let (store, sessions) = fixture().await;
        let auth = AuthService::new(&store, &sessions);

        let account = auth
            .register(&registration("a@x.com", "hunter2hunter2"))
            .await
            .unwrap();
        assert_ne!(account.password_hash, "hunter2hunter2");

        let raw = store.cache().store().get("users").await.unwrap().unwrap();
        assert!(!raw.contains("hunter2hunter2"));
        assert!(auth.current_session().await.is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_existing_email() {
        let (store, sessions) = fixture().await;
        let auth = AuthService::new(&store, &sessions);
        auth.register(&registration("a@x.com", "password-one"))
            .await
            .unwrap();

        let err = auth
            .register(&registration("A@X.com", "password-two"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_login_logout() {
        let (store, sessions) = fixture().await;
        let auth = AuthService::new(&store, &sessions);
        let account = auth
            .register(&registration("a@x.com", "password-one"))
            .await
            .unwrap();

        assert!(matches!(
            auth.login("a@x.com", "wrong-password").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@x.com", "password-one").await,
            Err(AuthError::InvalidCredentials)
        ));

        let session = auth.login("a@x.com", "password-one").await.unwrap();
        assert_eq!(session.id, account.id);
        assert_eq!(auth.current_session().await, Some(session));

        auth.logout().await.unwrap();
        assert!(auth.current_session().await.is_none());
    }

    #[tokio::test]
    async fn test_update_profile_refreshes_session() {
        let (store, sessions) = fixture().await;
        let auth = AuthService::new(&store, &sessions);

        assert!(matches!(
            auth.update_profile(&ProfileChanges::default()).await,
            Err(AuthError::NotLoggedIn)
        ));

        auth.register(&registration("a@x.com", "password-one"))
            .await
            .unwrap();
        auth.login("a@x.com", "password-one").await.unwrap();

        let changes = ProfileChanges {
            name: Some("Sharjah Autos".to_string()),
            phone: Some(String::new()),
            location: Some("Sharjah".to_string()),
        };
        let session = auth.update_profile(&changes).await.unwrap();
        assert_eq!(session.name, "Sharjah Autos");
        assert!(session.phone.is_none());
        assert_eq!(session.location.as_deref(), Some("Sharjah"));
        assert_eq!(auth.current_session().await, Some(session.clone()));

        let stored = store.find_account(&session.id).await.value.unwrap();
        assert_eq!(stored.name, "Sharjah Autos");
    }
}
