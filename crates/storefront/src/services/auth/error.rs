//! Authentication error types.

use thiserror::Error;

use autosouq_core::SyncStatus;

use crate::cache::KvError;

/// Errors from registration, login and profile edits.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] autosouq_core::EmailError),

    /// Unknown email or wrong password; the two are not told apart.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The session points at an account neither store holds.
    #[error("account not found")]
    AccountNotFound,

    #[error("an account with this email already exists")]
    EmailTaken,

    #[error("weak password: {0}")]
    WeakPassword(String),

    #[error("name is required")]
    MissingName,

    #[error("not logged in")]
    NotLoggedIn,

    /// Neither local store accepted the write.
    #[error("account could not be stored ({0})")]
    Storage(SyncStatus),

    /// The session record could not be read or written.
    #[error("session error: {0}")]
    Session(#[from] KvError),

    #[error("password hashing failed")]
    PasswordHash,
}
