//! File-based theme backend.
//!
//! Layout:
//!
//! ```text
//! {themes_dir}/{dir}/theme.json         manifest
//! {config_dir}/{dir}/config_USER.json   {"active": bool, ...patch values}
//! ```
//!
//! `config_dir` defaults to `themes_dir`. When they differ, the themes are
//! treated as bundled with the plugin.

use std::collections::{BTreeSet, HashSet};
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tokio::fs;
use tracing::{debug, info, warn};

use super::write_atomic;
use crate::store::error::{StorageError, StorageResult};
use crate::store::theme::ThemeStore;
use crate::theme::{Flag, MAX_MANIFEST_VERSION, Theme, ThemeManifest};

const MANIFEST_FILE: &str = "theme.json";
const CONFIG_FILE: &str = "config_USER.json";

/// File-based implementation of `ThemeStore`.
#[derive(Debug, Clone)]
pub struct FileThemeStore {
    themes_dir: PathBuf,
    config_dir: PathBuf,
}

/// A theme together with the directory name it was loaded from.
#[derive(Debug)]
struct ThemeEntry {
    dir_name: String,
    theme: Theme,
}

impl FileThemeStore {
    pub fn new(themes_dir: impl Into<PathBuf>) -> Self {
        let themes_dir = themes_dir.into();
        Self {
            config_dir: themes_dir.clone(),
            themes_dir,
        }
    }

    /// Keep per-theme config in a separate directory.
    pub fn with_config_dir(mut self, config_dir: impl Into<PathBuf>) -> Self {
        self.config_dir = config_dir.into();
        self
    }

    fn config_path(&self, dir_name: &str) -> PathBuf {
        self.config_dir.join(dir_name).join(CONFIG_FILE)
    }

    fn bundled(&self) -> bool {
        self.config_dir != self.themes_dir
    }

    /// Scan the themes directory.
    ///
    /// Directories without a manifest are skipped silently; unreadable or
    /// unsupported manifests are skipped with a warning.
    async fn scan(&self) -> StorageResult<Vec<ThemeEntry>> {
        let mut entries = match fs::read_dir(&self.themes_dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %self.themes_dir.display(), "Themes directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(StorageError::file_io(&self.themes_dir, e)),
        };

        let mut found = Vec::new();
        let mut seen = HashSet::new();

        let mut dirs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::file_io(&self.themes_dir, e))?
        {
            dirs.push(entry.path());
        }
        dirs.sort();

        for path in dirs {
            let manifest_path = path.join(MANIFEST_FILE);
            if fs::metadata(&manifest_path).await.is_err() {
                continue;
            }

            let Some(dir_name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
                continue;
            };

            let manifest = match read_manifest(&manifest_path).await {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %manifest_path.display(), error = %e, "Skipping invalid theme");
                    continue;
                }
            };

            if !manifest.is_supported() {
                warn!(
                    theme = %manifest.name,
                    manifest_version = manifest.manifest_version(),
                    "Skipping theme that requires a newer theme loader"
                );
                continue;
            }

            if !seen.insert(manifest.name.clone()) {
                debug!(theme = %manifest.name, "Ignoring duplicate theme name");
                continue;
            }

            let enabled = read_active(&self.config_path(&dir_name)).await;
            found.push(ThemeEntry {
                dir_name,
                theme: manifest.into_theme(enabled, self.bundled()),
            });
        }

        found.sort_by(|a, b| a.theme.name.cmp(&b.theme.name));
        Ok(found)
    }

    /// Write the `active` flag, keeping any other keys in the config file.
    async fn write_active(&self, dir_name: &str, active: bool) -> StorageResult<()> {
        let path = self.config_path(dir_name);

        let mut config = read_config(&path).await?;
        config.insert("active".to_string(), Value::Bool(active));

        let content =
            serde_json::to_vec(&config).map_err(|e| StorageError::serialization(e.to_string()))?;
        write_atomic(&path, &content).await
    }

    /// Manifest names of the theme folders among `dirs`.
    async fn names_in(&self, dirs: BTreeSet<String>) -> Vec<String> {
        let mut names = Vec::new();
        for dir in dirs {
            let manifest_path = self.themes_dir.join(&dir).join(MANIFEST_FILE);
            match read_manifest(&manifest_path).await {
                Ok(manifest) => names.push(manifest.name),
                Err(e) => debug!(dir = %dir, error = %e, "Archive folder is not a theme"),
            }
        }
        names
    }
}

async fn read_manifest(path: &Path) -> StorageResult<ThemeManifest> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| StorageError::file_io(path, e))?;
    serde_json::from_str(&content).map_err(|e| StorageError::file_deserialization(path, e.to_string()))
}

/// Theme config as a JSON object; a missing file is an empty object.
async fn read_config(path: &Path) -> StorageResult<Map<String, Value>> {
    match fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content)
            .map_err(|e| StorageError::file_deserialization(path, e.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
        Err(e) => Err(StorageError::file_io(path, e)),
    }
}

/// Folder name for a new preset: path separators and other awkward
/// characters become `_`.
fn preset_dir_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}

/// Unpack a zip archive under `dest`, returning its top-level folder names.
///
/// Entries that would land outside `dest` reject the whole archive.
fn extract_archive(archive: &[u8], dest: &Path) -> StorageResult<BTreeSet<String>> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive))
        .map_err(|e| StorageError::invalid_archive(e.to_string()))?;

    let mut top_level = BTreeSet::new();
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| StorageError::invalid_archive(e.to_string()))?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(StorageError::invalid_archive(format!(
                "unsafe path '{}'",
                entry.name()
            )));
        };

        let mut components = relative.components();
        if let Some(Component::Normal(first)) = components.next()
            && (entry.is_dir() || components.next().is_some())
        {
            top_level.insert(first.to_string_lossy().to_string());
        }

        let out = dest.join(&relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&out).map_err(|e| StorageError::file_io(&out, e))?;
            continue;
        }
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::file_io(parent, e))?;
        }
        let mut file = std::fs::File::create(&out).map_err(|e| StorageError::file_io(&out, e))?;
        std::io::copy(&mut entry, &mut file).map_err(|e| StorageError::file_io(&out, e))?;
    }

    Ok(top_level)
}

/// A missing or unreadable config means "not active".
async fn read_active(path: &Path) -> bool {
    let Ok(content) = fs::read_to_string(path).await else {
        return false;
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(config) => config.get("active").and_then(Value::as_bool).unwrap_or(false),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable theme config");
            false
        }
    }
}

#[async_trait]
impl ThemeStore for FileThemeStore {
    async fn list(&self) -> StorageResult<Vec<Theme>> {
        Ok(self.scan().await?.into_iter().map(|e| e.theme).collect())
    }

    async fn set_enabled(&self, name: &str, enabled: bool) -> StorageResult<()> {
        let entries = self.scan().await?;

        let entry = entries
            .iter()
            .find(|e| e.theme.name == name)
            .ok_or_else(|| StorageError::not_found("theme", name))?;

        if !enabled {
            self.write_active(&entry.dir_name, false).await?;
            info!(theme = %name, "Disabled theme");
            return Ok(());
        }

        // Enable dependencies first, depth-first, each at most once.
        let mut visited = HashSet::new();
        let mut stack = vec![entry];
        let mut order = Vec::new();
        while let Some(current) = stack.pop() {
            if !visited.insert(current.theme.name.clone()) {
                continue;
            }
            order.push(current);
            for dep in &current.theme.dependencies {
                match entries.iter().find(|e| &e.theme.name == dep) {
                    Some(dep_entry) => stack.push(dep_entry),
                    None => warn!(theme = %name, dependency = %dep, "Dependency not installed"),
                }
            }
        }

        for current in order.iter().rev() {
            self.write_active(&current.dir_name, true).await?;
        }

        info!(theme = %name, dependencies = order.len() - 1, "Enabled theme");
        Ok(())
    }

    async fn install_archive(&self, archive: Vec<u8>) -> StorageResult<Vec<String>> {
        let themes_dir = self.themes_dir.clone();
        fs::create_dir_all(&themes_dir)
            .await
            .map_err(|e| StorageError::file_io(&themes_dir, e))?;

        let dirs = tokio::task::spawn_blocking(move || extract_archive(&archive, &themes_dir))
            .await
            .map_err(|e| StorageError::invalid_archive(e.to_string()))??;

        let names = self.names_in(dirs).await;
        if names.is_empty() {
            return Err(StorageError::invalid_archive("no theme.json found"));
        }

        info!(themes = ?names, "Installed theme archive");
        Ok(names)
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        let entries = self.scan().await?;
        let entry = entries
            .iter()
            .find(|e| e.theme.name == name)
            .ok_or_else(|| StorageError::not_found("theme", name))?;

        let theme_path = self.themes_dir.join(&entry.dir_name);
        fs::remove_dir_all(&theme_path)
            .await
            .map_err(|e| StorageError::file_io(&theme_path, e))?;

        if self.bundled() {
            let config_path = self.config_dir.join(&entry.dir_name);
            match fs::remove_dir_all(&config_path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::file_io(&config_path, e)),
            }
        }

        info!(theme = %name, "Deleted theme");
        Ok(())
    }

    async fn create_preset(&self, name: &str, dependencies: &[String]) -> StorageResult<()> {
        let entries = self.scan().await?;
        if entries.iter().any(|e| e.theme.name == name) {
            return Err(StorageError::already_exists("theme", name));
        }

        let dir_name = preset_dir_name(name);
        if dir_name.is_empty() {
            return Err(StorageError::serialization(format!(
                "no usable folder name for preset '{name}'"
            )));
        }
        let manifest_path = self.themes_dir.join(&dir_name).join(MANIFEST_FILE);
        if fs::metadata(&manifest_path).await.is_ok() {
            return Err(StorageError::already_exists("theme", dir_name));
        }

        let mut captured = Map::new();
        for dependency in dependencies {
            let entry = entries
                .iter()
                .find(|e| &e.theme.name == dependency)
                .ok_or_else(|| StorageError::not_found("theme", dependency.as_str()))?;
            let mut values = read_config(&self.config_path(&entry.dir_name)).await?;
            values.remove("active");
            captured.insert(dependency.clone(), Value::Object(values));
        }

        let manifest = json!({
            "name": name,
            "manifest_version": MAX_MANIFEST_VERSION,
            "flags": [Flag::Preset],
            "dependencies": captured,
        });
        let content = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| StorageError::serialization(e.to_string()))?;
        write_atomic(&manifest_path, &content).await?;

        info!(preset = %name, dependencies = dependencies.len(), "Created preset");
        Ok(())
    }
}
