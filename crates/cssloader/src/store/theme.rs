//! Theme backend trait.

use async_trait::async_trait;

use crate::theme::Theme;

use super::error::StorageResult;

/// Access to installed themes and their enabled state.
///
/// This is the boundary to whatever actually injects CSS; the daemon reads
/// the theme list, flips enabled flags, and adds or removes theme folders
/// through it.
#[async_trait]
pub trait ThemeStore: Send + Sync {
    /// List all installed themes, sorted by name.
    async fn list(&self) -> StorageResult<Vec<Theme>>;

    /// Enable or disable a theme by name.
    ///
    /// Returns `StorageError::NotFound` if no theme has that name.
    async fn set_enabled(&self, name: &str, enabled: bool) -> StorageResult<()>;

    /// Unpack a zipped theme download into the themes directory.
    ///
    /// Returns the names of the themes found in the archive. Existing files
    /// are overwritten, so reinstalling updates a theme in place.
    async fn install_archive(&self, archive: Vec<u8>) -> StorageResult<Vec<String>>;

    /// Remove an installed theme and its saved config.
    async fn delete(&self, name: &str) -> StorageResult<()>;

    /// Write a new preset theme depending on `dependencies`, capturing each
    /// dependency's current config values.
    ///
    /// Returns `StorageError::AlreadyExists` if a theme has that name.
    async fn create_preset(&self, name: &str, dependencies: &[String]) -> StorageResult<()>;
}
