//! Observer registry and non-blocking fan-out.
//!
//! The registry maps each observer's identity to the sending half of its
//! bounded delivery queue. It does no locking of its own; the owning
//! [`BufferedLogStream`](crate::BufferedLogStream) keeps it behind the same
//! mutex as the history ring so registration and broadcast are serialized
//! with writes.

use std::collections::BTreeMap;
use std::fmt;

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::entry::LogEntry;

/// Identity of an observer, unique for the lifetime of its stream.
///
/// Identities are assigned in increasing order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    /// The raw numeric identity.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Per-broadcast delivery counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Observers whose queue accepted the entry.
    pub delivered: usize,
    /// Observers whose queue was full; they will see a sequence gap.
    pub dropped: usize,
    /// Observers whose receiver was gone; they were removed from the registry.
    pub pruned: usize,
}

/// Mapping from observer identity to its delivery queue.
#[derive(Debug, Default)]
pub struct ObserverRegistry {
    next_id: u64,
    queues: BTreeMap<ObserverId, mpsc::Sender<LogEntry>>,
}

impl ObserverRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            next_id: 0,
            queues: BTreeMap::new(),
        }
    }

    /// Store `queue` under a fresh identity and return that identity.
    pub fn register(&mut self, queue: mpsc::Sender<LogEntry>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.queues.insert(id, queue);
        id
    }

    /// Remove the queue registered under `id`.
    ///
    /// Returns `false` if nothing was registered under that identity, so a
    /// second removal is harmless.
    pub fn unregister(&mut self, id: ObserverId) -> bool {
        self.queues.remove(&id).is_some()
    }

    /// Offer `entry` to every registered queue without waiting.
    ///
    /// A full queue loses this entry. A queue whose receiver has been dropped
    /// is removed.
    pub fn broadcast(&mut self, entry: &LogEntry) -> BroadcastOutcome {
        let mut outcome = BroadcastOutcome::default();
        self.queues
            .retain(|_, queue| match queue.try_send(entry.clone()) {
                Ok(()) => {
                    outcome.delivered = outcome.delivered.saturating_add(1);
                    true
                }
                Err(TrySendError::Full(_)) => {
                    outcome.dropped = outcome.dropped.saturating_add(1);
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    outcome.pruned = outcome.pruned.saturating_add(1);
                    false
                }
            });
        outcome
    }

    /// Whether an observer is registered under `id`.
    pub fn contains(&self, id: ObserverId) -> bool {
        self.queues.contains_key(&id)
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    /// Whether no observers are registered.
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn entry(sequence: u64) -> LogEntry {
        LogEntry::new(sequence, Utc::now(), format!("Log {sequence}"))
    }

    #[test]
    fn identities_are_unique_and_increasing() {
        let mut registry = ObserverRegistry::new();
        let (tx_a, _rx_a) = mpsc::channel(1);
        let (tx_b, _rx_b) = mpsc::channel(1);
        let a = registry.register(tx_a);
        let b = registry.register(tx_b);
        assert!(b > a);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn identities_are_not_reused_after_unregister() {
        let mut registry = ObserverRegistry::new();
        let (tx_a, _rx_a) = mpsc::channel(1);
        let a = registry.register(tx_a);
        assert!(registry.unregister(a));
        let (tx_b, _rx_b) = mpsc::channel(1);
        let b = registry.register(tx_b);
        assert_ne!(a, b);
    }

    #[test]
    fn unregister_twice_is_harmless() {
        let mut registry = ObserverRegistry::new();
        let (tx, _rx) = mpsc::channel(1);
        let id = registry.register(tx);
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn broadcast_drops_for_full_queue_only() {
        let mut registry = ObserverRegistry::new();
        let (slow_tx, mut slow_rx) = mpsc::channel(1);
        let (fast_tx, mut fast_rx) = mpsc::channel(4);
        registry.register(slow_tx);
        registry.register(fast_tx);

        let first = registry.broadcast(&entry(0));
        assert_eq!(first.delivered, 2);

        let second = registry.broadcast(&entry(1));
        assert_eq!(second.delivered, 1);
        assert_eq!(second.dropped, 1);

        assert_eq!(slow_rx.try_recv().unwrap().sequence, 0);
        assert!(slow_rx.try_recv().is_err());
        assert_eq!(fast_rx.try_recv().unwrap().sequence, 0);
        assert_eq!(fast_rx.try_recv().unwrap().sequence, 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn broadcast_prunes_closed_receivers() {
        let mut registry = ObserverRegistry::new();
        let (tx, rx) = mpsc::channel(1);
        let id = registry.register(tx);
        drop(rx);

        let outcome = registry.broadcast(&entry(0));
        assert_eq!(outcome.pruned, 1);
        assert!(!registry.contains(id));
    }
}
