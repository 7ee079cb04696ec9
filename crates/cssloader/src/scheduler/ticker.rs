//! Periodic tick signal.
//!
//! The ticker owns a set of zero-argument callbacks. Each call to
//! [`Ticker::fire`] invokes every subscribed callback once. Who calls `fire`
//! and how often is up to the owner: the service drives it from an interval,
//! tests drive it by hand.

use std::collections::BTreeMap;
use std::fmt;

/// Callback invoked on every tick.
pub type Trigger = Box<dyn Fn() + Send + Sync>;

/// Handle returned by [`Ticker::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subscription(u64);

#[derive(Default)]
pub struct Ticker {
    next_id: u64,
    subscribers: BTreeMap<u64, Trigger>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, trigger: Trigger) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.insert(id, trigger);
        Subscription(id)
    }

    /// Returns false if the subscription was not active.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.subscribers.remove(&subscription.0).is_some()
    }

    pub fn is_subscribed(&self, subscription: Subscription) -> bool {
        self.subscribers.contains_key(&subscription.0)
    }

    /// Invoke every subscriber once. Returns how many were invoked.
    pub fn fire(&self) -> usize {
        for trigger in self.subscribers.values() {
            trigger();
        }
        self.subscribers.len()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl fmt::Debug for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticker")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: &Arc<AtomicUsize>) -> Trigger {
        let counter = counter.clone();
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn fire_invokes_each_subscriber_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut ticker = Ticker::new();
        ticker.subscribe(counting(&counter));
        ticker.subscribe(counting(&counter));

        assert_eq!(ticker.fire(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribed_trigger_does_not_fire() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut ticker = Ticker::new();
        let sub = ticker.subscribe(counting(&counter));

        assert!(ticker.unsubscribe(sub));
        assert!(!ticker.unsubscribe(sub));
        assert!(!ticker.is_subscribed(sub));

        ticker.fire();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(ticker.is_empty());
    }

    #[test]
    fn subscriptions_are_never_reused() {
        let mut ticker = Ticker::new();
        let a = ticker.subscribe(Box::new(|| {}));
        ticker.unsubscribe(a);
        let b = ticker.subscribe(Box::new(|| {}));

        assert_ne!(a, b);
        assert!(!ticker.is_subscribed(a));
    }
}
