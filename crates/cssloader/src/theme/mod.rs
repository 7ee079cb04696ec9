//! Installed themes and presets.
//!
//! A preset is an ordinary theme carrying the `PRESET` flag; activating one
//! enables it and disables every other preset.

pub mod error;
pub mod manager;
pub mod preset;
pub mod registry;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use error::ThemeError;
pub use manager::ThemeManager;
pub use preset::{NO_PRESET, PresetApplier, PresetChange, plan_preset_change};
pub use registry::{PresetRegistry, SelectedPreset};

/// Highest `manifest_version` this daemon understands.
pub const MAX_MANIFEST_VERSION: u32 = 9;

// ============================================================================
// Theme
// ============================================================================

/// An installed theme as seen by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub version: String,
    pub author: String,
    pub enabled: bool,
    #[serde(default)]
    pub flags: Vec<Flag>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Shipped with the plugin rather than installed by the user.
    #[serde(default)]
    pub bundled: bool,
}

impl Theme {
    pub fn has_flag(&self, flag: &Flag) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_preset(&self) -> bool {
        self.has_flag(&Flag::Preset)
    }
}

// ============================================================================
// Flags
// ============================================================================

/// Classification flag attached to a theme manifest.
///
/// Unknown flags are kept verbatim so they round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Flag {
    Preset,
    KeepDependencies,
    OptionalDependencies,
    RequireNavPatch,
    Other(String),
}

impl Flag {
    pub fn as_str(&self) -> &str {
        match self {
            Flag::Preset => "PRESET",
            Flag::KeepDependencies => "KEEP_DEPENDENCIES",
            Flag::OptionalDependencies => "OPTIONAL_DEPENDENCIES",
            Flag::RequireNavPatch => "REQUIRE_NAV_PATCH",
            Flag::Other(s) => s,
        }
    }
}

impl From<String> for Flag {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PRESET" => Flag::Preset,
            "KEEP_DEPENDENCIES" => Flag::KeepDependencies,
            "OPTIONAL_DEPENDENCIES" => Flag::OptionalDependencies,
            "REQUIRE_NAV_PATCH" => Flag::RequireNavPatch,
            _ => Flag::Other(s),
        }
    }
}

impl From<Flag> for String {
    fn from(flag: Flag) -> Self {
        flag.as_str().to_string()
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Manifest (theme.json)
// ============================================================================

/// On-disk `theme.json` contents. Only the fields the daemon needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeManifest {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub manifest_version: Option<u32>,
    #[serde(default)]
    pub flags: Vec<Flag>,
    /// Dependency name -> patch overrides. Only the names are used here.
    #[serde(default)]
    pub dependencies: BTreeMap<String, serde_json::Value>,
}

impl ThemeManifest {
    pub fn manifest_version(&self) -> u32 {
        self.manifest_version.unwrap_or(1)
    }

    pub fn is_supported(&self) -> bool {
        self.manifest_version() <= MAX_MANIFEST_VERSION
    }

    pub fn into_theme(self, enabled: bool, bundled: bool) -> Theme {
        Theme {
            id: self.id.unwrap_or_else(|| self.name.clone()),
            display_name: self.display_name.unwrap_or_else(|| self.name.clone()),
            version: self.version.unwrap_or_else(|| "v1.0".to_string()),
            author: self.author.unwrap_or_default(),
            enabled,
            flags: self.flags,
            dependencies: self.dependencies.into_keys().collect(),
            bundled,
            name: self.name,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_defaults() {
        let manifest: ThemeManifest = serde_json::from_str(r#"{"name": "Clean Home"}"#).unwrap();
        assert_eq!(manifest.manifest_version(), 1);

        let theme = manifest.into_theme(false, false);
        assert_eq!(theme.id, "Clean Home");
        assert_eq!(theme.display_name, "Clean Home");
        assert_eq!(theme.version, "v1.0");
        assert_eq!(theme.author, "");
        assert!(!theme.is_preset());
    }

    #[test]
    fn manifest_with_preset_flag_and_dependencies() {
        let manifest: ThemeManifest = serde_json::from_str(
            r#"{
                "name": "Evening",
                "id": "a1b2",
                "display_name": "Evening Profile",
                "manifest_version": 8,
                "flags": ["PRESET"],
                "dependencies": {"Dark Mode": {}, "Big Clock": {"Size": "Large"}}
            }"#,
        )
        .unwrap();

        let theme = manifest.into_theme(true, false);
        assert_eq!(theme.id, "a1b2");
        assert_eq!(theme.display_name, "Evening Profile");
        assert!(theme.is_preset());
        assert!(theme.enabled);
        assert_eq!(theme.dependencies, vec!["Big Clock", "Dark Mode"]);
    }

    #[test]
    fn unknown_flags_round_trip() {
        let flags: Vec<Flag> = serde_json::from_str(r#"["PRESET", "SOMETHING_NEW"]"#).unwrap();
        assert_eq!(flags[0], Flag::Preset);
        assert_eq!(flags[1], Flag::Other("SOMETHING_NEW".to_string()));

        let json = serde_json::to_string(&flags).unwrap();
        assert_eq!(json, r#"["PRESET","SOMETHING_NEW"]"#);
    }

    #[test]
    fn newer_manifest_is_unsupported() {
        let manifest: ThemeManifest = serde_json::from_str(&format!(
            r#"{{"name": "Future", "manifest_version": {}}}"#,
            MAX_MANIFEST_VERSION + 1
        ))
        .unwrap();
        assert!(!manifest.is_supported());
    }
}
