//! Scheduler error types.

use thiserror::Error;

use super::change::ScheduleId;
use crate::store::StorageError;

/// Errors that can occur in the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Time of day out of range. Nothing was changed.
    #[error("invalid time {hours:02}:{minutes:02}: hours must be 0-23 and minutes 0-59")]
    InvalidTime { hours: u8, minutes: u8 },

    /// Scheduled change not found.
    #[error("scheduled change not found: {0}")]
    NotFound(ScheduleId),

    /// The listener table and the schedule disagree about an id.
    #[error("schedule out of sync for {id}: {detail}")]
    InconsistentState { id: ScheduleId, detail: &'static str },

    /// The schedule changed in memory but could not be written.
    #[error("schedule updated in memory but not persisted: {0}")]
    Persistence(#[source] StorageError),

    /// The persisted schedule could not be read.
    #[error("failed to load schedule: {0}")]
    Load(#[source] StorageError),

    /// The scheduler task is gone.
    #[error("scheduler service is not running")]
    Unavailable,
}

/// Result type for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;
