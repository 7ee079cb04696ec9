//! Preset activation.
//!
//! Activating a preset enables it and disables every other enabled preset.
//! Selecting [`NO_PRESET`] disables all presets.

use async_trait::async_trait;

use super::Theme;
use super::error::ThemeError;

/// Pseudo preset name meaning "no preset active".
pub const NO_PRESET: &str = "None";

/// State changes needed to make `name` the only active preset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetChange {
    /// Enabled presets to turn off.
    pub disable: Vec<String>,
    /// Preset to turn on, if it is not already enabled.
    pub enable: Option<String>,
}

impl PresetChange {
    pub fn is_noop(&self) -> bool {
        self.disable.is_empty() && self.enable.is_none()
    }
}

/// Compute the changes that activate preset `name` over `themes`.
///
/// Themes already in the desired state are left alone, so applying the same
/// preset twice yields an empty change the second time.
pub fn plan_preset_change(name: &str, themes: &[Theme]) -> Result<PresetChange, ThemeError> {
    let target = if name == NO_PRESET {
        None
    } else {
        let theme = themes
            .iter()
            .find(|t| t.name == name && t.is_preset())
            .ok_or_else(|| ThemeError::PresetNotFound(name.to_string()))?;
        Some(theme)
    };

    let disable = themes
        .iter()
        .filter(|t| t.is_preset() && t.enabled && t.name != name)
        .map(|t| t.name.clone())
        .collect();

    let enable = target.filter(|t| !t.enabled).map(|t| t.name.clone());

    Ok(PresetChange { disable, enable })
}

// ============================================================================
// PresetApplier
// ============================================================================

/// Performs the actual preset activation.
#[async_trait]
pub trait PresetApplier: Send + Sync {
    /// Make preset `name` the active preset ([`NO_PRESET`] clears it).
    async fn apply_preset(&self, name: &str) -> Result<(), ThemeError>;
}
