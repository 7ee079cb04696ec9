//! Theme error types.

use thiserror::Error;

use crate::store::StorageError;

/// Errors from theme and preset operations.
#[derive(Debug, Error)]
pub enum ThemeError {
    /// No installed theme carries that name.
    #[error("theme not found: {0}")]
    ThemeNotFound(String),

    /// No installed theme with that name carries the preset flag.
    #[error("preset not found: {0}")]
    PresetNotFound(String),

    /// A theme with that name is already installed.
    #[error("theme already exists: {0}")]
    AlreadyExists(String),

    /// Bundled themes ship with the plugin and cannot be deleted.
    #[error("cannot delete bundled theme: {0}")]
    Bundled(String),

    #[error("invalid preset name: '{0}'")]
    InvalidName(String),

    /// The theme backend failed.
    #[error("theme backend error: {0}")]
    Storage(#[from] StorageError),
}
