//! Schedule storage trait.

use async_trait::async_trait;

use crate::scheduler::ScheduledChange;

use super::error::StorageResult;

/// Durable storage for the ordered list of scheduled preset changes.
///
/// The whole list is written on every change, so `save` has replace
/// semantics rather than per-entry upserts.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Load the persisted schedule.
    ///
    /// Returns an empty list if nothing has been saved yet.
    async fn load(&self) -> StorageResult<Vec<ScheduledChange>>;

    /// Replace the persisted schedule.
    ///
    /// Must be atomic - either fully succeeds or has no effect.
    async fn save(&self, entries: &[ScheduledChange]) -> StorageResult<()>;
}
