//! File-based settings storage.
//!
//! Keeps all settings in one flat JSON object.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use super::write_atomic;
use crate::store::error::{StorageError, StorageResult};
use crate::store::settings::SettingsStore;

/// File-based implementation of `SettingsStore`.
///
/// Writes are serialized so concurrent `set` calls cannot drop each other's
/// keys during the read-modify-write cycle.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> StorageResult<BTreeMap<String, String>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StorageError::file_io(&self.path, e)),
        };

        serde_json::from_str(&content)
            .map_err(|e| StorageError::file_deserialization(&self.path, e.to_string()))
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut all = self.read_all().await?;
        all.insert(key.to_string(), value.to_string());

        let content = serde_json::to_vec_pretty(&all)
            .map_err(|e| StorageError::serialization(e.to_string()))?;
        write_atomic(&self.path, &content).await
    }
}
