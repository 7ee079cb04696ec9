//! Scheduled preset changes.
//!
//! A scheduled change activates a preset at a fixed time of day. The engine
//! keeps one tick subscription per change; on each tick the subscription
//! compares the clock with its trigger time and, on a match, queues the
//! preset for activation (or queues the change for removal if the preset no
//! longer exists).
//!
//! # Usage
//!
//! ```ignore
//! let service = SchedulerService::new(SchedulerConfig { ... });
//! let handle = service.start().await;
//!
//! handle.upsert(ScheduledChange::new("preset-id", 21, 30)).await?;
//! let schedule = handle.list().await?;
//! handle.remove(&schedule[0].id).await?;
//! ```

pub mod change;
pub mod clock;
pub mod engine;
pub mod error;
pub mod listeners;
pub mod service;
pub mod ticker;
pub mod trigger;

pub use change::{ScheduleId, ScheduledChange, TimeOfDay};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{ScheduleEngine, TickReport};
pub use error::{Result, SchedulerError};
pub use listeners::ListenerTable;
pub use service::{DEFAULT_TICK_INTERVAL, SchedulerConfig, SchedulerHandle, SchedulerService};
pub use ticker::{Subscription, Ticker, Trigger};
pub use trigger::build_trigger;
