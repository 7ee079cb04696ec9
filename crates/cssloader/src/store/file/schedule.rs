//! File-based schedule storage implementation.
//!
//! Stores the whole schedule as one YAML list at `{path}`.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::write_atomic;
use crate::scheduler::ScheduledChange;
use crate::store::error::{StorageError, StorageResult};
use crate::store::schedule::ScheduleStore;

/// File-based implementation of `ScheduleStore`.
#[derive(Debug, Clone)]
pub struct FileScheduleStore {
    path: PathBuf,
}

impl FileScheduleStore {
    /// Create a store backed by the given YAML file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl ScheduleStore for FileScheduleStore {
    async fn load(&self) -> StorageResult<Vec<ScheduledChange>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::file_io(&self.path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_saphyr::from_str(&content)
            .map_err(|e| StorageError::file_deserialization(&self.path, e.to_string()))
    }

    async fn save(&self, entries: &[ScheduledChange]) -> StorageResult<()> {
        let content = serde_saphyr::to_string(&entries.to_vec())
            .map_err(|e| StorageError::serialization(e.to_string()))?;

        write_atomic(&self.path, content.as_bytes()).await?;

        tracing::debug!(path = %self.path.display(), entries = entries.len(), "Saved schedule");
        Ok(())
    }
}
