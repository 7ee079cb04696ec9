//! Tick callback for a single scheduled change.

use std::sync::Arc;

use super::change::ScheduledChange;
use super::clock::Clock;
use super::ticker::Trigger;

/// Build the tick callback for `change`.
///
/// On every invocation the callback reads `clock`. When the time of day
/// equals the change's trigger time it calls `apply` with the target preset
/// id if `exists` accepts it, and `on_stale` with the change otherwise. At
/// any other time it does nothing.
///
/// The callback fires on every tick within the matching minute, so `apply`
/// must be idempotent.
pub fn build_trigger<E, A, S>(
    change: ScheduledChange,
    clock: Arc<dyn Clock>,
    exists: E,
    apply: A,
    on_stale: S,
) -> Trigger
where
    E: Fn(&str) -> bool + Send + Sync + 'static,
    A: Fn(&str) + Send + Sync + 'static,
    S: Fn(&ScheduledChange) + Send + Sync + 'static,
{
    Box::new(move || {
        let now = clock.now();
        if now.hours != change.hours || now.minutes != change.minutes {
            return;
        }

        if exists(&change.profile_id) {
            apply(&change.profile_id);
        } else {
            on_stale(&change);
        }
    })
}
