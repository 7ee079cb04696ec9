//! Schedule engine.
//!
//! Owns the ordered schedule, the listener table and the ticker, and keeps
//! the three in step:
//!
//! - every scheduled change has exactly one subscription in the ticker
//! - the listener table maps each change id to that subscription
//! - the schedule is sorted by time of day after every mutation
//!
//! Triggers run synchronously inside [`ScheduleEngine::tick`] and only queue
//! effects. The effects are applied after the trigger pass, so a trigger
//! never re-enters the engine.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::change::{ScheduleId, ScheduledChange};
use super::clock::Clock;
use super::error::{Result, SchedulerError};
use super::listeners::ListenerTable;
use super::ticker::{Subscription, Ticker};
use super::trigger::build_trigger;
use crate::store::ScheduleStore;
use crate::theme::{PresetApplier, PresetRegistry};

/// Work queued by a trigger.
#[derive(Debug)]
enum TickEffect {
    /// Activate the preset. Revalidated against the registry before use.
    Apply { id: ScheduleId, profile_id: String },
    /// Target preset is gone; drop the change.
    Stale(ScheduledChange),
}

/// Outcome of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Names of presets that were applied.
    pub applied: Vec<String>,
    /// Ids of changes removed because their preset no longer exists.
    pub removed: Vec<ScheduleId>,
    /// Human-readable failures.
    pub failures: Vec<String>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.removed.is_empty() && self.failures.is_empty()
    }
}

pub struct ScheduleEngine {
    entries: Vec<ScheduledChange>,
    listeners: ListenerTable,
    ticker: Ticker,
    clock: Arc<dyn Clock>,
    registry: PresetRegistry,
    applier: Arc<dyn PresetApplier>,
    store: Arc<dyn ScheduleStore>,
    effects_tx: mpsc::UnboundedSender<TickEffect>,
    effects_rx: mpsc::UnboundedReceiver<TickEffect>,
}

impl ScheduleEngine {
    pub fn new(
        clock: Arc<dyn Clock>,
        registry: PresetRegistry,
        applier: Arc<dyn PresetApplier>,
        store: Arc<dyn ScheduleStore>,
    ) -> Self {
        let (effects_tx, effects_rx) = mpsc::unbounded_channel();
        Self {
            entries: Vec::new(),
            listeners: ListenerTable::new(),
            ticker: Ticker::new(),
            clock,
            registry,
            applier,
            store,
            effects_tx,
            effects_rx,
        }
    }

    /// Scheduled changes, sorted by time of day.
    pub fn entries(&self) -> &[ScheduledChange] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&ScheduledChange> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn listeners(&self) -> &ListenerTable {
        &self.listeners
    }

    /// Number of active tick subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.ticker.len()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add a change, or replace the change with the same id.
    ///
    /// Memory is updated before the store is written; on
    /// [`SchedulerError::Persistence`] the new schedule is live but not
    /// durable.
    pub async fn upsert(&mut self, change: ScheduledChange) -> Result<()> {
        self.register(change)?;
        self.persist().await
    }

    /// Remove a change by id.
    ///
    /// An id unknown to both the schedule and the listener table yields
    /// [`SchedulerError::NotFound`] without touching the store.
    pub async fn remove(&mut self, id: &str) -> Result<()> {
        let subscription = self.listeners.get(id);
        let index = self.position(id);

        match (subscription, index) {
            (None, None) => Err(SchedulerError::NotFound(id.to_string())),
            (Some(subscription), Some(index)) => {
                self.ticker.unsubscribe(subscription);
                self.listeners.remove(id);
                let removed = self.entries.remove(index);
                debug!(
                    id = %removed.id,
                    profile_id = %removed.profile_id,
                    "Removed scheduled change"
                );
                self.persist().await
            }
            (Some(_), None) => Err(inconsistent(id, "listener registered without schedule entry")),
            (None, Some(_)) => Err(inconsistent(id, "schedule entry without listener")),
        }
    }

    /// Load the persisted schedule and register every entry.
    ///
    /// Nothing is written back. Entries with an invalid time are skipped; for
    /// duplicate ids the last one wins.
    pub async fn restore(&mut self) -> Result<usize> {
        let loaded = self.store.load().await.map_err(SchedulerError::Load)?;

        for change in loaded {
            let id = change.id.clone();
            if let Err(e) = self.register(change) {
                warn!(id = %id, error = %e, "Skipping persisted scheduled change");
            }
        }

        info!(entries = self.entries.len(), "Restored schedule");
        Ok(self.entries.len())
    }

    /// Insert or replace in memory: ticker, listener table and schedule.
    fn register(&mut self, change: ScheduledChange) -> Result<()> {
        change.time()?;

        match self.listeners.get(&change.id) {
            None => {
                if self.position(&change.id).is_some() {
                    return Err(inconsistent(&change.id, "schedule entry without listener"));
                }
                let subscription = self.subscribe(&change);
                self.listeners.insert(change.id.clone(), subscription);
                debug!(
                    id = %change.id,
                    profile_id = %change.profile_id,
                    hours = change.hours,
                    minutes = change.minutes,
                    "Added scheduled change"
                );
                self.entries.push(change);
            }
            Some(old) => {
                let index = self.position(&change.id).ok_or_else(|| {
                    inconsistent(&change.id, "listener registered without schedule entry")
                })?;
                self.ticker.unsubscribe(old);
                let subscription = self.subscribe(&change);
                self.listeners.insert(change.id.clone(), subscription);
                debug!(
                    id = %change.id,
                    profile_id = %change.profile_id,
                    hours = change.hours,
                    minutes = change.minutes,
                    "Replaced scheduled change"
                );
                self.entries[index] = change;
            }
        }

        // Stable: equal times keep insertion order.
        self.entries.sort_by_key(|e| (e.hours, e.minutes));
        Ok(())
    }

    fn subscribe(&mut self, change: &ScheduledChange) -> Subscription {
        let registry = self.registry.clone();
        let apply_tx = self.effects_tx.clone();
        let stale_tx = self.effects_tx.clone();
        let id = change.id.clone();

        let trigger = build_trigger(
            change.clone(),
            self.clock.clone(),
            move |profile_id| registry.has_preset(profile_id),
            move |profile_id| {
                let _ = apply_tx.send(TickEffect::Apply {
                    id: id.clone(),
                    profile_id: profile_id.to_string(),
                });
            },
            move |change| {
                let _ = stale_tx.send(TickEffect::Stale(change.clone()));
            },
        );
        self.ticker.subscribe(trigger)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    async fn persist(&self) -> Result<()> {
        self.store.save(&self.entries).await.map_err(|e| {
            warn!(error = %e, entries = self.entries.len(), "Failed to persist schedule");
            SchedulerError::Persistence(e)
        })
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Fire every trigger once and apply what they queued.
    pub async fn tick(&mut self) -> TickReport {
        let fired = self.ticker.fire();
        let mut report = TickReport::default();

        while let Ok(effect) = self.effects_rx.try_recv() {
            match effect {
                TickEffect::Apply { id, profile_id } => {
                    // The registry may have changed since the trigger ran.
                    let Some(preset) = self.registry.find_preset(&profile_id) else {
                        self.drop_stale(&id, &profile_id, &mut report).await;
                        continue;
                    };

                    match self.applier.apply_preset(&preset.name).await {
                        Ok(()) => {
                            info!(id = %id, preset = %preset.name, "Applied scheduled preset");
                            report.applied.push(preset.name);
                        }
                        Err(e) => {
                            warn!(id = %id, preset = %preset.name, error = %e, "Failed to apply scheduled preset");
                            report.failures.push(format!("{id}: {e}"));
                        }
                    }
                }
                TickEffect::Stale(change) => {
                    self.drop_stale(&change.id, &change.profile_id, &mut report).await;
                }
            }
        }

        if !report.is_empty() {
            debug!(
                fired,
                applied = report.applied.len(),
                removed = report.removed.len(),
                failures = report.failures.len(),
                "Tick processed"
            );
        }
        report
    }

    async fn drop_stale(&mut self, id: &str, profile_id: &str, report: &mut TickReport) {
        info!(id = %id, profile_id = %profile_id, "Removing scheduled change for missing preset");

        match self.remove(id).await {
            Ok(()) => report.removed.push(id.to_string()),
            // Removed from memory; only the write failed.
            Err(e @ SchedulerError::Persistence(_)) => {
                report.removed.push(id.to_string());
                report.failures.push(format!("{id}: {e}"));
            }
            // Already gone.
            Err(SchedulerError::NotFound(_)) => {}
            Err(e) => report.failures.push(format!("{id}: {e}")),
        }
    }
}

/// Log and build an `InconsistentState` error.
fn inconsistent(id: &str, detail: &'static str) -> SchedulerError {
    error!(id = %id, detail, "Schedule bookkeeping out of sync");
    SchedulerError::InconsistentState {
        id: id.to_string(),
        detail,
    }
}
