//! Mapping from scheduled change id to its tick subscription.

use std::collections::HashMap;

use super::change::ScheduleId;
use super::ticker::Subscription;

/// At most one subscription per scheduled change id.
#[derive(Debug, Default)]
pub struct ListenerTable {
    by_id: HashMap<ScheduleId, Subscription>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Subscription> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Record the subscription for `id`, returning the one it replaces.
    pub fn insert(&mut self, id: ScheduleId, subscription: Subscription) -> Option<Subscription> {
        self.by_id.insert(id, subscription)
    }

    pub fn remove(&mut self, id: &str) -> Option<Subscription> {
        self.by_id.remove(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
