//! Shared API types used by both server handlers and client.
//!
//! These types define the contract between server and client.
//! Changes here affect both sides, preventing silent drift.

use serde::{Deserialize, Serialize};

use crate::scheduler::ScheduledChange;
use crate::theme::{NO_PRESET, SelectedPreset, Theme};

/// Label shown when more than one preset is enabled.
pub const INVALID_PRESET_STATE: &str = "Invalid State";

// ============================================================================
// Schedule Types
// ============================================================================

/// Body of `POST /api/v1/schedule` and `PUT /api/v1/schedule/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    #[serde(alias = "profileId")]
    pub profile_id: String,
    pub hours: u8,
    pub minutes: u8,
}

/// A scheduled change as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: String,
    pub profile_id: String,
    pub hours: u8,
    pub minutes: u8,
    /// `HH:MM`.
    pub time: String,
    /// Name of the target preset, if it is still installed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_name: Option<String>,
}

impl ScheduleEntry {
    pub fn new(change: &ScheduledChange, preset_name: Option<String>) -> Self {
        Self {
            id: change.id.clone(),
            profile_id: change.profile_id.clone(),
            hours: change.hours,
            minutes: change.minutes,
            time: format!("{:02}:{:02}", change.hours, change.minutes),
            preset_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListScheduleResponse {
    pub entries: Vec<ScheduleEntry>,
}

// ============================================================================
// Preset Types
// ============================================================================

/// Summary of a preset in list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetSummary {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub enabled: bool,
}

impl From<&Theme> for PresetSummary {
    fn from(theme: &Theme) -> Self {
        Self {
            id: theme.id.clone(),
            name: theme.name.clone(),
            display_name: theme.display_name.clone(),
            enabled: theme.enabled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPresetsResponse {
    pub presets: Vec<PresetSummary>,
    /// Name of the active preset, `None`, or `Invalid State`.
    pub selected: String,
}

impl ListPresetsResponse {
    pub fn new(presets: &[Theme], selected: SelectedPreset) -> Self {
        let selected = match selected {
            SelectedPreset::None => NO_PRESET.to_string(),
            SelectedPreset::One(theme) => theme.name,
            SelectedPreset::Invalid => INVALID_PRESET_STATE.to_string(),
        };
        Self {
            presets: presets.iter().map(PresetSummary::from).collect(),
            selected,
        }
    }
}

/// Body of `POST /api/v1/presets/apply`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyPresetRequest {
    pub name: String,
}

/// Body of `POST /api/v1/presets`. The preset captures the themes enabled
/// right now.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePresetRequest {
    pub name: String,
}

// ============================================================================
// Theme Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListThemesResponse {
    pub themes: Vec<Theme>,
}

/// Body of `PUT /api/v1/themes/{name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetThemeRequest {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadThemesResponse {
    pub themes: usize,
}

/// Body of `POST /api/v1/themes/install`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallThemeRequest {
    /// Catalog theme id.
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallThemeResponse {
    /// The theme and any dependencies installed with it.
    pub installed: Vec<Theme>,
}
