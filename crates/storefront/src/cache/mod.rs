//! Flat key-value cache and session record.
//!
//! The flat cache is the simplest store the storefront has: one string value
//! per logical key, holding either the session snapshot or a whole serialized
//! array of records. It is always available and is the fallback whenever the
//! embedded store is missing or failing.
//!
//! # Keys
//!
//! | Key | Value |
//! |-----|-------|
//! | `currentUser` | [`Session`](autosouq_core::Session) JSON |
//! | `users` | JSON array of [`Account`](autosouq_core::Account) |
//! | `carListings` | JSON array of [`Listing`](autosouq_core::Listing) |
//!
//! Callers never touch a global store; a [`KeyValueStore`] is injected so tests
//! can use [`MemoryKeyValueStore`] and the binary a [`FileKeyValueStore`].

mod file;
mod flat;
mod memory;
mod session;

use std::future::Future;

use thiserror::Error;

pub use file::FileKeyValueStore;
pub use flat::FlatCache;
pub use memory::MemoryKeyValueStore;
pub use session::SessionStore;

/// Fixed keys of the flat cache.
pub mod keys {
    /// Key for the logged-in account snapshot.
    pub const CURRENT_USER: &str = "currentUser";

    /// Key for the serialized accounts array.
    pub const ACCOUNTS: &str = "users";

    /// Key for the serialized listings array.
    pub const LISTINGS: &str = "carListings";
}

/// Errors from a key-value store.
#[derive(Debug, Error)]
pub enum KvError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A persistent string map addressed by logical keys.
pub trait KeyValueStore: Clone + Send + Sync + 'static {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, KvError>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), KvError>> + Send;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), KvError>> + Send;
}
