//! Wall-clock sources.

use std::sync::{Mutex, PoisonError};

use chrono::Timelike;

use super::change::TimeOfDay;

/// Source of the current time of day.
pub trait Clock: Send + Sync {
    fn now(&self) -> TimeOfDay;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimeOfDay {
        let now = chrono::Local::now();
        // chrono keeps hour < 24 and minute < 60
        TimeOfDay {
            hours: now.hour() as u8,
            minutes: now.minute() as u8,
        }
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<TimeOfDay>,
}

impl ManualClock {
    pub fn new(now: TimeOfDay) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: TimeOfDay) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimeOfDay {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
