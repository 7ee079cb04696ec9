//! Shared snapshot of installed themes.

// std::sync::RwLock is correct here: the lock is never held across .await
// points, and scheduler triggers read it from synchronous callbacks.
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::Theme;
use crate::store::{StorageResult, ThemeStore};

/// Which preset is currently active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedPreset {
    None,
    One(Theme),
    /// More than one preset is enabled at once.
    Invalid,
}

/// Read-mostly registry of installed themes, shared between the scheduler,
/// the preset bridge and HTTP handlers.
///
/// Readers always see a whole snapshot; `replace` swaps the list atomically.
#[derive(Debug, Clone, Default)]
pub struct PresetRegistry {
    themes: Arc<RwLock<Arc<Vec<Theme>>>>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_themes(themes: Vec<Theme>) -> Self {
        let registry = Self::new();
        registry.replace(themes);
        registry
    }

    /// Replace the whole theme list.
    pub fn replace(&self, themes: Vec<Theme>) {
        let mut guard = self.themes.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(themes);
    }

    /// Reload the theme list from the backend.
    pub async fn refresh(&self, store: &dyn ThemeStore) -> StorageResult<usize> {
        let themes = store.list().await?;
        let count = themes.len();
        self.replace(themes);
        debug!(themes = count, "Refreshed theme registry");
        Ok(count)
    }

    /// Current snapshot of every installed theme.
    pub fn snapshot(&self) -> Arc<Vec<Theme>> {
        self.themes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Themes carrying the preset flag.
    pub fn presets(&self) -> Vec<Theme> {
        self.snapshot()
            .iter()
            .filter(|t| t.is_preset())
            .cloned()
            .collect()
    }

    /// True iff a theme with this id exists and is a preset.
    pub fn has_preset(&self, id: &str) -> bool {
        self.snapshot().iter().any(|t| t.id == id && t.is_preset())
    }

    /// Look up a preset by id.
    pub fn find_preset(&self, id: &str) -> Option<Theme> {
        self.snapshot()
            .iter()
            .find(|t| t.id == id && t.is_preset())
            .cloned()
    }

    pub fn find_by_name(&self, name: &str) -> Option<Theme> {
        self.snapshot().iter().find(|t| t.name == name).cloned()
    }

    pub fn selected_preset(&self) -> SelectedPreset {
        let snapshot = self.snapshot();
        let mut enabled = snapshot.iter().filter(|t| t.enabled && t.is_preset());
        match (enabled.next(), enabled.next()) {
            (None, _) => SelectedPreset::None,
            (Some(theme), None) => SelectedPreset::One(theme.clone()),
            (Some(_), Some(_)) => SelectedPreset::Invalid,
        }
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}
