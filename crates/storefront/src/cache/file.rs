use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{KeyValueStore, KvError};

/// Key-value store persisted as a single JSON object file.
///
/// Every write rewrites the whole file through a sibling temp file and a
/// rename, so a crash leaves either the old or the new contents. Operations on
/// one instance (and its clones) are serialized; separate processes are not
/// coordinated and the last writer wins.
#[derive(Clone, Debug)]
pub struct FileKeyValueStore {
    path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl FileKeyValueStore {
    /// Open a store backed by `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>, KvError> {
        match tokio::fs::read(self.path.as_ref()).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the map ahead of a write. A corrupt file reads as empty so the
    /// write replaces it; the returned flag is set when that happened.
    async fn read_map_for_write(&self) -> Result<(BTreeMap<String, String>, bool), KvError> {
        match self.read_map().await {
            Ok(map) => Ok((map, false)),
            Err(KvError::Serde(e)) => {
                warn!(path = %self.path.display(), error = %e, "Flat cache file is corrupt, replacing it");
                Ok((BTreeMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    async fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), KvError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, self.path.as_ref()).await?;
        debug!(path = %self.path.display(), keys = map.len(), "Flat cache file written");
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        Ok(map.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), KvError> {
        let _guard = self.lock.lock().await;
        let (mut map, _) = self.read_map_for_write().await?;
        map.insert(key.to_owned(), value);
        self.write_map(&map).await
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        let _guard = self.lock.lock().await;
        let (mut map, corrupt) = self.read_map_for_write().await?;
        if map.remove(key).is_some() || corrupt {
            self.write_map(&map).await?;
        }
        Ok(())
    }
}
