//! Scheduler service.
//!
//! Runs the [`ScheduleEngine`] inside a single background task. Every
//! mutation goes through the command channel, so the schedule, listener
//! table and ticker only ever have one writer. The same task drives the
//! ticker from a periodic interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::change::{ScheduleId, ScheduledChange};
use super::clock::Clock;
use super::engine::{ScheduleEngine, TickReport};
use super::error::{Result, SchedulerError};
use crate::store::ScheduleStore;
use crate::theme::{PresetApplier, PresetRegistry};

/// Default interval between ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(20);

/// Command to the scheduler service.
enum SchedulerCommand {
    Upsert {
        change: ScheduledChange,
        reply: oneshot::Sender<Result<()>>,
    },
    Remove {
        id: ScheduleId,
        reply: oneshot::Sender<Result<()>>,
    },
    List {
        reply: oneshot::Sender<Vec<ScheduledChange>>,
    },
    TickNow {
        reply: oneshot::Sender<TickReport>,
    },
    Shutdown,
}

/// Handle for interacting with the scheduler service.
#[derive(Clone)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Add or replace a scheduled change.
    pub async fn upsert(&self, change: ScheduledChange) -> Result<()> {
        self.request(|reply| SchedulerCommand::Upsert { change, reply }).await?
    }

    /// Remove a scheduled change.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.request(|reply| SchedulerCommand::Remove { id, reply }).await?
    }

    /// All scheduled changes, sorted by time of day.
    pub async fn list(&self) -> Result<Vec<ScheduledChange>> {
        self.request(|reply| SchedulerCommand::List { reply }).await
    }

    /// Run one tick immediately.
    pub async fn tick_now(&self) -> Result<TickReport> {
        self.request(|reply| SchedulerCommand::TickNow { reply }).await
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(SchedulerCommand::Shutdown).await;
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SchedulerCommand,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| SchedulerError::Unavailable)?;
        reply_rx.await.map_err(|_| SchedulerError::Unavailable)
    }
}

/// Configuration for the scheduler service.
pub struct SchedulerConfig {
    pub tick_interval: Duration,
    pub clock: Arc<dyn Clock>,
    pub registry: PresetRegistry,
    pub applier: Arc<dyn PresetApplier>,
    pub store: Arc<dyn ScheduleStore>,
}

/// The scheduler service.
pub struct SchedulerService {
    engine: ScheduleEngine,
    tick_interval: Duration,
}

impl SchedulerService {
    /// Create a new scheduler service.
    pub fn new(config: SchedulerConfig) -> Self {
        let engine = ScheduleEngine::new(
            config.clock,
            config.registry,
            config.applier,
            config.store,
        );
        Self {
            engine,
            tick_interval: config.tick_interval,
        }
    }

    /// Start the scheduler service.
    ///
    /// Restores the persisted schedule, then spawns the service task.
    /// A schedule that fails to load is logged and the service starts empty.
    pub async fn start(mut self) -> SchedulerHandle {
        let (command_tx, command_rx) = mpsc::channel(100);

        if let Err(e) = self.engine.restore().await {
            error!(error = %e, "Failed to load schedule");
        }

        tokio::spawn(self.run(command_rx));

        SchedulerHandle { command_tx }
    }

    /// Main service loop.
    async fn run(mut self, mut command_rx: mpsc::Receiver<SchedulerCommand>) {
        info!(
            interval_secs = self.tick_interval.as_secs(),
            entries = self.engine.entries().len(),
            "Scheduler service started"
        );

        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                cmd = command_rx.recv() => {
                    let Some(cmd) = cmd else {
                        debug!("All scheduler handles dropped");
                        break;
                    };
                    if !self.handle_command(cmd).await {
                        break;
                    }
                }
                _ = interval.tick() => {
                    self.engine.tick().await;
                }
            }
        }

        info!("Scheduler service stopped");
    }

    /// Returns false when the service should stop.
    async fn handle_command(&mut self, cmd: SchedulerCommand) -> bool {
        match cmd {
            SchedulerCommand::Upsert { change, reply } => {
                let _ = reply.send(self.engine.upsert(change).await);
            }
            SchedulerCommand::Remove { id, reply } => {
                let _ = reply.send(self.engine.remove(&id).await);
            }
            SchedulerCommand::List { reply } => {
                let _ = reply.send(self.engine.entries().to_vec());
            }
            SchedulerCommand::TickNow { reply } => {
                let _ = reply.send(self.engine.tick().await);
            }
            SchedulerCommand::Shutdown => {
                info!("Scheduler service shutting down");
                return false;
            }
        }
        true
    }
}
