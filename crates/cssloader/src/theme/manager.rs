//! Serialized writes to theme state.
//!
//! Every change to installed themes goes through [`ThemeManager`]: preset
//! activation from HTTP and from the scheduler, enable and disable, install,
//! delete, preset creation and reload. One async lock covers each
//! read-plan-write-refresh sequence, so plans are always made against the
//! current backend state and the registry ends with the last writer's view.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::Theme;
use super::error::ThemeError;
use super::preset::{NO_PRESET, PresetApplier, plan_preset_change};
use super::registry::PresetRegistry;
use crate::store::{StorageError, ThemeStore};

/// Owns the theme backend and the registry built from it.
#[derive(Clone)]
pub struct ThemeManager {
    store: Arc<dyn ThemeStore>,
    registry: PresetRegistry,
    write_lock: Arc<Mutex<()>>,
}

impl ThemeManager {
    pub fn new(store: Arc<dyn ThemeStore>, registry: PresetRegistry) -> Self {
        Self {
            store,
            registry,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn registry(&self) -> &PresetRegistry {
        &self.registry
    }

    /// Reload the registry from the backend.
    pub async fn refresh(&self) -> Result<usize, ThemeError> {
        let _guard = self.write_lock.lock().await;
        Ok(self.registry.refresh(self.store.as_ref()).await?)
    }

    /// Enable or disable a theme and return its new state.
    pub async fn set_enabled(&self, name: &str, enabled: bool) -> Result<Theme, ThemeError> {
        let _guard = self.write_lock.lock().await;

        self.store
            .set_enabled(name, enabled)
            .await
            .map_err(storage_error)?;
        self.registry.refresh(self.store.as_ref()).await?;

        self.registry
            .find_by_name(name)
            .ok_or_else(|| ThemeError::ThemeNotFound(name.to_string()))
    }

    /// Unpack a downloaded theme archive and return the themes it contained.
    pub async fn install_archive(&self, archive: Vec<u8>) -> Result<Vec<Theme>, ThemeError> {
        let _guard = self.write_lock.lock().await;

        let names = self.store.install_archive(archive).await?;
        self.registry.refresh(self.store.as_ref()).await?;

        Ok(names
            .iter()
            .filter_map(|name| self.registry.find_by_name(name))
            .collect())
    }

    /// Delete an installed theme. Bundled themes are refused.
    pub async fn delete(&self, name: &str) -> Result<(), ThemeError> {
        let _guard = self.write_lock.lock().await;

        let themes = self.store.list().await?;
        let theme = themes
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| ThemeError::ThemeNotFound(name.to_string()))?;
        if theme.bundled {
            return Err(ThemeError::Bundled(name.to_string()));
        }

        self.store.delete(name).await.map_err(storage_error)?;
        self.registry.refresh(self.store.as_ref()).await?;
        Ok(())
    }

    /// Save the currently enabled themes as a new preset and activate it.
    pub async fn create_preset(&self, name: &str) -> Result<Theme, ThemeError> {
        let name = name.trim();
        if name == NO_PRESET || !name.chars().any(char::is_alphanumeric) {
            return Err(ThemeError::InvalidName(name.to_string()));
        }

        let _guard = self.write_lock.lock().await;

        let themes = self.store.list().await?;
        if themes.iter().any(|t| t.name == name) {
            return Err(ThemeError::AlreadyExists(name.to_string()));
        }
        let dependencies: Vec<String> = themes
            .iter()
            .filter(|t| t.enabled && !t.is_preset())
            .map(|t| t.name.clone())
            .collect();

        self.store
            .create_preset(name, &dependencies)
            .await
            .map_err(storage_error)?;
        self.apply_locked(name).await?;

        self.registry
            .find_by_name(name)
            .ok_or_else(|| ThemeError::ThemeNotFound(name.to_string()))
    }

    /// Callers must hold `write_lock`.
    async fn apply_locked(&self, name: &str) -> Result<(), ThemeError> {
        // Plan against the backend, not the registry: the registry may lag.
        let themes = self.store.list().await?;
        let change = plan_preset_change(name, &themes)?;

        if change.is_noop() {
            debug!(preset = %name, "Preset already active");
            return Ok(());
        }

        for theme in &change.disable {
            self.store.set_enabled(theme, false).await?;
        }
        if let Some(theme) = &change.enable {
            self.store.set_enabled(theme, true).await?;
        }

        self.registry.refresh(self.store.as_ref()).await?;

        info!(
            preset = %name,
            disabled = change.disable.len(),
            "Applied preset"
        );
        Ok(())
    }
}

#[async_trait]
impl PresetApplier for ThemeManager {
    async fn apply_preset(&self, name: &str) -> Result<(), ThemeError> {
        let _guard = self.write_lock.lock().await;
        self.apply_locked(name).await
    }
}

fn storage_error(e: StorageError) -> ThemeError {
    match e {
        StorageError::NotFound { id, .. } => ThemeError::ThemeNotFound(id),
        StorageError::AlreadyExists { id, .. } => ThemeError::AlreadyExists(id),
        other => ThemeError::Storage(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StorageResult;
    use crate::theme::{Flag, SelectedPreset};

    fn theme(name: &str, preset: bool, enabled: bool) -> Theme {
        Theme {
            id: format!("id-{name}"),
            name: name.to_string(),
            display_name: name.to_string(),
            version: "v1.0".to_string(),
            author: String::new(),
            enabled,
            flags: if preset { vec![Flag::Preset] } else { vec![] },
            dependencies: vec![],
            bundled: false,
        }
    }

    /// In-memory theme backend that records writes and yields on every
    /// call, so concurrent callers interleave.
    #[derive(Default)]
    struct MemoryThemes {
        themes: Mutex<Vec<Theme>>,
        writes: Mutex<Vec<(String, bool)>>,
    }

    impl MemoryThemes {
        fn with(themes: Vec<Theme>) -> Arc<Self> {
            Arc::new(Self {
                themes: Mutex::new(themes),
                writes: Mutex::new(vec![]),
            })
        }

        async fn enabled_presets(&self) -> Vec<String> {
            self.themes
                .lock()
                .await
                .iter()
                .filter(|t| t.enabled && t.is_preset())
                .map(|t| t.name.clone())
                .collect()
        }
    }

    #[async_trait]
    impl ThemeStore for MemoryThemes {
        async fn list(&self) -> StorageResult<Vec<Theme>> {
            let themes = self.themes.lock().await.clone();
            tokio::task::yield_now().await;
            Ok(themes)
        }

        async fn set_enabled(&self, name: &str, enabled: bool) -> StorageResult<()> {
            tokio::task::yield_now().await;
            let mut themes = self.themes.lock().await;
            let theme = themes
                .iter_mut()
                .find(|t| t.name == name)
                .ok_or_else(|| StorageError::not_found("theme", name))?;
            theme.enabled = enabled;
            self.writes.lock().await.push((name.to_string(), enabled));
            Ok(())
        }

        async fn install_archive(&self, _archive: Vec<u8>) -> StorageResult<Vec<String>> {
            Err(StorageError::invalid_archive("not supported in memory"))
        }

        async fn delete(&self, name: &str) -> StorageResult<()> {
            let mut themes = self.themes.lock().await;
            let before = themes.len();
            themes.retain(|t| t.name != name);
            if themes.len() == before {
                return Err(StorageError::not_found("theme", name));
            }
            Ok(())
        }

        async fn create_preset(&self, name: &str, dependencies: &[String]) -> StorageResult<()> {
            let mut preset = theme(name, true, false);
            preset.dependencies = dependencies.to_vec();
            self.themes.lock().await.push(preset);
            Ok(())
        }
    }

    #[tokio::test]
    async fn apply_writes_backend_and_refreshes_registry() {
        let store = MemoryThemes::with(vec![
            theme("Morning", true, true),
            theme("Evening", true, false),
        ]);
        let registry = PresetRegistry::new();
        let manager = ThemeManager::new(store.clone(), registry.clone());

        manager.apply_preset("Evening").await.unwrap();

        assert_eq!(
            *store.writes.lock().await,
            vec![("Morning".to_string(), false), ("Evening".to_string(), true)]
        );
        assert!(registry.find_by_name("Evening").unwrap().enabled);
        assert!(!registry.find_by_name("Morning").unwrap().enabled);
    }

    #[tokio::test]
    async fn apply_skips_writes_when_already_active() {
        let store = MemoryThemes::with(vec![theme("Morning", true, true)]);
        let manager = ThemeManager::new(store.clone(), PresetRegistry::new());

        manager.apply_preset("Morning").await.unwrap();
        manager.apply_preset("Morning").await.unwrap();

        assert!(store.writes.lock().await.is_empty());
    }

    #[tokio::test]
    async fn overlapping_applies_leave_one_active_preset() {
        let store = MemoryThemes::with(vec![
            theme("A", true, true),
            theme("B", true, false),
            theme("C", true, false),
        ]);
        let manager = ThemeManager::new(store.clone(), PresetRegistry::new());
        let other = manager.clone();

        let (b, c) = tokio::join!(manager.apply_preset("B"), other.apply_preset("C"));
        b.unwrap();
        c.unwrap();

        let enabled = store.enabled_presets().await;
        assert_eq!(enabled.len(), 1, "enabled presets: {enabled:?}");
        match manager.registry().selected_preset() {
            SelectedPreset::One(theme) => assert_eq!(theme.name, enabled[0]),
            other => panic!("expected one selected preset, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn overlapping_apply_and_disable_agree_with_registry() {
        let store = MemoryThemes::with(vec![theme("A", true, false), theme("B", true, false)]);
        let manager = ThemeManager::new(store.clone(), PresetRegistry::new());

        let (applied, disabled) = tokio::join!(
            manager.apply_preset("A"),
            manager.set_enabled("A", false)
        );
        applied.unwrap();
        disabled.unwrap();

        let backend = store.list().await.unwrap();
        assert_eq!(*manager.registry().snapshot(), backend);
    }

    #[tokio::test]
    async fn set_enabled_unknown_theme() {
        let store = MemoryThemes::with(vec![theme("Morning", true, false)]);
        let manager = ThemeManager::new(store, PresetRegistry::new());

        let err = manager.set_enabled("Nope", true).await.unwrap_err();
        assert!(matches!(err, ThemeError::ThemeNotFound(name) if name == "Nope"));
    }

    #[tokio::test]
    async fn delete_refuses_bundled_themes() {
        let mut bundled = theme("Stock", false, false);
        bundled.bundled = true;
        let store = MemoryThemes::with(vec![bundled, theme("Mine", false, false)]);
        let manager = ThemeManager::new(store.clone(), PresetRegistry::new());

        let err = manager.delete("Stock").await.unwrap_err();
        assert!(matches!(err, ThemeError::Bundled(_)));

        manager.delete("Mine").await.unwrap();
        assert!(manager.registry().find_by_name("Mine").is_none());
        assert!(manager.registry().find_by_name("Stock").is_some());

        let err = manager.delete("Mine").await.unwrap_err();
        assert!(matches!(err, ThemeError::ThemeNotFound(_)));
    }

    #[tokio::test]
    async fn create_preset_captures_enabled_themes_and_activates() {
        let store = MemoryThemes::with(vec![
            theme("Dark Mode", false, true),
            theme("Big Font", false, false),
            theme("Morning", true, true),
        ]);
        let manager = ThemeManager::new(store.clone(), PresetRegistry::new());

        let preset = manager.create_preset("  Mine ").await.unwrap();

        assert_eq!(preset.name, "Mine");
        assert!(preset.enabled && preset.is_preset());
        assert_eq!(preset.dependencies, vec!["Dark Mode"]);
        assert_eq!(store.enabled_presets().await, vec!["Mine"]);
    }

    #[tokio::test]
    async fn create_preset_rejects_bad_and_taken_names() {
        let store = MemoryThemes::with(vec![theme("Morning", true, false)]);
        let manager = ThemeManager::new(store, PresetRegistry::new());

        for name in [NO_PRESET, "   ", "!!"] {
            let err = manager.create_preset(name).await.unwrap_err();
            assert!(matches!(err, ThemeError::InvalidName(_)), "{name}");
        }

        let err = manager.create_preset("Morning").await.unwrap_err();
        assert!(matches!(err, ThemeError::AlreadyExists(_)));
    }
}
