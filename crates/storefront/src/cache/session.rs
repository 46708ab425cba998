use tracing::{debug, warn};

use autosouq_core::Session;

use super::{KeyValueStore, KvError, keys};

/// The cached "current session" record.
///
/// Reads never fail: an unreadable or corrupt record is treated as logged out.
#[derive(Clone, Debug)]
pub struct SessionStore<K> {
    store: K,
}

impl<K: KeyValueStore> SessionStore<K> {
    #[must_use]
    pub const fn new(store: K) -> Self {
        Self { store }
    }

    /// The logged-in account snapshot, if any.
    pub async fn current(&self) -> Option<Session> {
        let raw = match self.store.get(keys::CURRENT_USER).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Failed to read session record");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %e, "Discarding corrupt session record");
                None
            }
        }
    }

    /// Store the session snapshot, or remove it when `session` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the record cannot be written or removed.
    pub async fn set(&self, session: Option<&Session>) -> Result<(), KvError> {
        match session {
            Some(session) => {
                let raw = serde_json::to_string(session)?;
                self.store.set(keys::CURRENT_USER, raw).await?;
                debug!(account_id = %session.id, "Session record set");
            }
            None => {
                self.store.remove(keys::CURRENT_USER).await?;
                debug!("Session record cleared");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use autosouq_core::{AccountId, Email};

    use super::*;
    use crate::cache::MemoryKeyValueStore;

    fn session() -> Session {
        Session {
            id: AccountId::new("u1"),
            name: "A".to_string(),
            email: Email::parse("a@x.com").unwrap(),
            phone: None,
            location: Some("Dubai".to_string()),
        }
    }

    #[tokio::test]
    async fn test_set_and_clear() {
        let sessions = SessionStore::new(MemoryKeyValueStore::new());
        assert!(sessions.current().await.is_none());

        sessions.set(Some(&session())).await.unwrap();
        assert_eq!(sessions.current().await, Some(session()));

        sessions.set(None).await.unwrap();
        assert!(sessions.current().await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_record_reads_as_logged_out() {
        let store = MemoryKeyValueStore::new();
        store
            .set(keys::CURRENT_USER, "{\"id\":".to_string())
            .await
            .unwrap();
        assert!(SessionStore::new(store).current().await.is_none());
    }
}
