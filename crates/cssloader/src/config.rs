use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

// ============================================================================
// Config (root)
// ============================================================================

/// Contents of `cssloader.yaml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub workspace: Option<PathBuf>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub themes: ThemesConfig,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("unclosed variable reference '${{' (missing '}}')")]
    UnclosedVarReference,
}

impl Config {
    /// Load the config file. A missing file yields the defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        let expanded = expand_env_vars(&contents)?;
        Ok(serde_saphyr::from_str(&expanded)?)
    }

    /// Resolve every configured path against the config file location.
    pub fn paths(&self, config_path: &Path) -> ResolvedPaths {
        let workspace = resolve_path(
            config_path,
            self.workspace
                .as_deref()
                .unwrap_or_else(|| Path::new(DEFAULT_WORKSPACE)),
        );
        let in_workspace = |configured: &Option<PathBuf>, default: &str| match configured {
            Some(p) => resolve_path(config_path, p),
            None => workspace.join(default),
        };

        let themes_dir = in_workspace(&self.themes.path, DEFAULT_THEMES_DIR);
        let theme_config_dir = match &self.themes.config_path {
            Some(p) => resolve_path(config_path, p),
            None => themes_dir.clone(),
        };

        ResolvedPaths {
            schedule: in_workspace(&self.scheduler.path, DEFAULT_SCHEDULE_FILE),
            settings: in_workspace(&self.catalog.settings_path, DEFAULT_SETTINGS_FILE),
            themes_dir,
            theme_config_dir,
            workspace,
        }
    }
}

/// Absolute (or config-relative) locations of everything on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub workspace: PathBuf,
    pub themes_dir: PathBuf,
    pub theme_config_dir: PathBuf,
    pub schedule: PathBuf,
    pub settings: PathBuf,
}

/// Resolve a path relative to the config file directory.
///
/// Absolute paths are returned as-is, so the result does not depend on the
/// current working directory.
pub fn resolve_path(config_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    config_dir.join(path)
}

// ============================================================================
// Default Paths
// ============================================================================

/// Default config file name.
pub const DEFAULT_CONFIG_FILE: &str = "cssloader.yaml";
/// Default workspace directory (relative to config file).
pub const DEFAULT_WORKSPACE: &str = ".cssloader";
/// Default themes directory (relative to workspace).
pub const DEFAULT_THEMES_DIR: &str = "themes";
/// Default schedule file (relative to workspace).
pub const DEFAULT_SCHEDULE_FILE: &str = "schedule.yaml";
/// Default settings file (relative to workspace).
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

// ============================================================================
// Private Helpers (Serde Defaults)
// ============================================================================

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8321
}

fn default_request_timeout() -> u64 {
    30
}

fn default_tick_interval() -> u64 {
    20
}

fn default_api_url() -> String {
    "https://api.deckthemes.com".to_string()
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand `${VAR}` references in `input`.
///
/// - `${VAR}` must be set
/// - `${VAR:-default}` falls back to `default` (which may be empty)
/// - `$$` is a literal `$`
/// - a `$` not followed by `{` or `$` is kept as is
///
/// Defaults are not expanded recursively.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
        } else if let Some(body) = after.strip_prefix('{') {
            let end = body.find('}').ok_or(ConfigError::UnclosedVarReference)?;
            out.push_str(&lookup_var(&body[..end])?);
            rest = &body[end + 1..];
        } else {
            out.push('$');
            rest = after;
        }
    }

    out.push_str(rest);
    Ok(out)
}

fn lookup_var(reference: &str) -> Result<String, ConfigError> {
    let (name, default) = match reference.split_once(":-") {
        Some((name, default)) => (name, Some(default)),
        None => (reference, None),
    };

    match (std::env::var(name), default) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(default)) => Ok(default.to_string()),
        (Err(_), None) => Err(ConfigError::MissingEnvVar(name.to_string())),
    }
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// If set, admin endpoints require `Authorization: Bearer <token>`.
    #[serde(default)]
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            admin_token: None,
        }
    }
}

// ============================================================================
// ThemesConfig
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ThemesConfig {
    /// Directory holding one subdirectory per installed theme.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Where per-theme `config_USER.json` files live. Defaults to `path`.
    #[serde(default)]
    pub config_path: Option<PathBuf>,
}

// ============================================================================
// SchedulerSettings
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SchedulerSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tick_interval")]
    pub tick_interval_seconds: u64,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl SchedulerSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_seconds.max(1))
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_seconds: default_tick_interval(),
            path: None,
        }
    }
}

// ============================================================================
// CatalogConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub settings_path: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            settings_path: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8321);
        assert!(config.scheduler.enabled);
        assert_eq!(config.scheduler.tick_interval(), Duration::from_secs(20));
        assert_eq!(config.catalog.api_url, "https://api.deckthemes.com");
    }

    #[tokio::test]
    async fn test_load_missing_file_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load(temp_dir.path().join("missing.yaml"))
            .await
            .unwrap();
        assert_eq!(config.server.port, 8321);
        assert!(config.workspace.is_none());
    }

    #[tokio::test]
    async fn test_load_valid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cssloader.yaml");
        std::fs::write(
            &path,
            r#"
workspace: /var/lib/cssloader
server:
  host: 0.0.0.0
  port: 9000
  admin_token: secret
themes:
  path: /home/deck/homebrew/themes
scheduler:
  tick_interval_seconds: 5
catalog:
  api_url: http://localhost:3000
"#,
        )
        .unwrap();

        let config = Config::load(&path).await.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.admin_token.as_deref(), Some("secret"));
        assert_eq!(config.server.request_timeout_seconds, 30);
        assert_eq!(config.scheduler.tick_interval(), Duration::from_secs(5));
        assert_eq!(config.catalog.api_url, "http://localhost:3000");

        let paths = config.paths(&path);
        assert_eq!(paths.workspace, PathBuf::from("/var/lib/cssloader"));
        assert_eq!(paths.themes_dir, PathBuf::from("/home/deck/homebrew/themes"));
        assert_eq!(paths.theme_config_dir, paths.themes_dir);
        assert_eq!(
            paths.schedule,
            PathBuf::from("/var/lib/cssloader/schedule.yaml")
        );
    }

    #[tokio::test]
    async fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cssloader.yaml");
        std::fs::write(&path, "server: [not, a, map").unwrap();

        let result = Config::load(&path).await;
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_default_paths_live_in_workspace() {
        let config = Config::default();
        let paths = config.paths(Path::new("/etc/cssloader/cssloader.yaml"));

        assert_eq!(paths.workspace, PathBuf::from("/etc/cssloader/.cssloader"));
        assert_eq!(
            paths.themes_dir,
            PathBuf::from("/etc/cssloader/.cssloader/themes")
        );
        assert_eq!(
            paths.settings,
            PathBuf::from("/etc/cssloader/.cssloader/settings.json")
        );
    }

    #[test]
    fn test_resolve_path_absolute() {
        let resolved = resolve_path(Path::new("/etc/cssloader.yaml"), Path::new("/data"));
        assert_eq!(resolved, PathBuf::from("/data"));
    }

    #[test]
    fn test_resolve_path_relative() {
        let resolved = resolve_path(Path::new("/etc/app/cssloader.yaml"), Path::new("themes"));
        assert_eq!(resolved, PathBuf::from("/etc/app/themes"));
    }

    #[test]
    fn test_resolve_path_config_in_current_dir() {
        let resolved = resolve_path(Path::new("cssloader.yaml"), Path::new("themes"));
        assert_eq!(resolved, PathBuf::from("themes"));
    }

    #[test]
    fn test_expand_env_vars_required_var() {
        // SAFETY: Single-threaded test
        unsafe { std::env::set_var("CSSLOADER_TEST_REQUIRED", "value") };
        let result = expand_env_vars("a ${CSSLOADER_TEST_REQUIRED} b").unwrap();
        assert_eq!(result, "a value b");
        unsafe { std::env::remove_var("CSSLOADER_TEST_REQUIRED") };
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: Single-threaded test
        unsafe { std::env::remove_var("CSSLOADER_TEST_MISSING") };
        let result = expand_env_vars("port: ${CSSLOADER_TEST_MISSING}");
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(name)) if name == "CSSLOADER_TEST_MISSING"));
    }

    #[test]
    fn test_expand_env_vars_defaults() {
        // SAFETY: Single-threaded test
        unsafe { std::env::remove_var("CSSLOADER_TEST_UNSET") };
        assert_eq!(
            expand_env_vars("port: ${CSSLOADER_TEST_UNSET:-8321}").unwrap(),
            "port: 8321"
        );
        assert_eq!(
            expand_env_vars("token: ${CSSLOADER_TEST_UNSET:-}").unwrap(),
            "token: "
        );
    }

    #[test]
    fn test_expand_env_vars_dollar_handling() {
        assert_eq!(expand_env_vars("cost: $100").unwrap(), "cost: $100");
        assert_eq!(expand_env_vars("raw: $${HOME}").unwrap(), "raw: ${HOME}");
        assert_eq!(expand_env_vars("end $").unwrap(), "end $");
    }

    #[test]
    fn test_expand_env_vars_unclosed() {
        let result = expand_env_vars("value: ${UNCLOSED");
        assert!(matches!(result, Err(ConfigError::UnclosedVarReference)));
    }
}
