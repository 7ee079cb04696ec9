//! Scheduled change data structures.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{Result, SchedulerError};

/// Unique identifier for a scheduled change.
pub type ScheduleId = String;

// ============================================================================
// ScheduledChange
// ============================================================================

/// Rule that activates a preset at a time of day, every day.
///
/// The target preset is held by id only and may no longer exist when the
/// rule fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledChange {
    pub id: ScheduleId,
    /// Id of the preset to activate.
    #[serde(rename = "profileId")]
    pub profile_id: String,
    pub hours: u8,
    pub minutes: u8,
}

impl ScheduledChange {
    /// Create a change with a freshly generated id.
    pub fn new(profile_id: impl Into<String>, hours: u8, minutes: u8) -> Self {
        Self {
            id: Self::generate_id(),
            profile_id: profile_id.into(),
            hours,
            minutes,
        }
    }

    /// Generate a new scheduled change ID.
    pub fn generate_id() -> ScheduleId {
        format!("change_{}", ulid::Ulid::new())
    }

    /// Validated trigger time.
    pub fn time(&self) -> Result<TimeOfDay> {
        TimeOfDay::new(self.hours, self.minutes)
    }
}

// ============================================================================
// TimeOfDay
// ============================================================================

/// Wall-clock hour and minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    pub(super) hours: u8,
    pub(super) minutes: u8,
}

impl TimeOfDay {
    pub fn new(hours: u8, minutes: u8) -> Result<Self> {
        if hours > 23 || minutes > 59 {
            return Err(SchedulerError::InvalidTime { hours, minutes });
        }
        Ok(Self { hours, minutes })
    }

    pub fn hours(&self) -> u8 {
        self.hours
    }

    pub fn minutes(&self) -> u8 {
        self.minutes
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours, self.minutes)
    }
}
