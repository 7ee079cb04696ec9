//! Key-value settings storage trait.

use async_trait::async_trait;

use super::error::StorageResult;

/// Small string key-value store for plugin settings (e.g. the catalog
/// short token).
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a value. Returns `Ok(None)` if the key was never written.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}
