//! File-based storage implementations.
//!
//! - YAML for the schedule
//! - JSON for theme manifests, theme config and settings (the formats the
//!   theme backend already uses on disk)
//!
//! All writes use atomic operations (temp file + rename) to prevent corruption.

mod schedule;
mod settings;
mod theme;

pub use schedule::FileScheduleStore;
pub use settings::FileSettingsStore;
pub use theme::FileThemeStore;

use std::path::Path;

use tokio::fs;

use crate::store::error::{StorageError, StorageResult};

/// Write `content` to `path` through a sibling temp file and a rename.
pub(crate) async fn write_atomic(path: &Path, content: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::file_io(parent, e))?;
    }

    // Unique per write, so concurrent writers never share a temp file.
    let mut temp_name = path.as_os_str().to_os_string();
    temp_name.push(format!(".{}.tmp", ulid::Ulid::new()));
    let temp_path = std::path::PathBuf::from(temp_name);

    fs::write(&temp_path, content)
        .await
        .map_err(|e| StorageError::file_io(&temp_path, e))?;

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StorageError::file_io(path, e));
    }

    Ok(())
}
