//! The buffered log stream facade.
//!
//! [`BufferedLogStream`] composes the [`HistoryRing`] and the
//! [`ObserverRegistry`] behind a single mutex. Both the write path
//! (`append to ring, broadcast`) and the subscribe path (`replay ring,
//! register`) run entirely inside that critical section, which gives the
//! seam guarantee: every line is seen by a new observer exactly once, either
//! in its replay or through live broadcast.
//!
//! Nothing inside the critical section awaits or blocks. Broadcast uses
//! `try_send`, so a consumer that stops reading can never stall the writer.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, trace};

use crate::entry::LogEntry;
use crate::observer::StreamObserver;
use crate::registry::{ObserverId, ObserverRegistry};
use crate::ring::HistoryRing;

/// Largest accepted history capacity.
///
/// Each observer's delivery queue is a bounded channel of the same size, and
/// tokio caps a bounded channel at [`Semaphore::MAX_PERMITS`].
pub const MAX_CAPACITY: usize = Semaphore::MAX_PERMITS;

/// Errors that can occur when constructing a stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The requested history capacity was zero.
    #[error("stream capacity must be at least 1 line")]
    ZeroCapacity,

    /// The requested history capacity exceeds [`MAX_CAPACITY`].
    #[error("stream capacity {requested} exceeds the maximum of {max} lines")]
    CapacityTooLarge {
        /// The capacity that was asked for.
        requested: usize,
        /// The largest accepted capacity.
        max: usize,
    },
}

/// Mutable state guarded by the stream lock.
#[derive(Debug)]
pub(crate) struct StreamState {
    ring: HistoryRing,
    next_sequence: u64,
    pub(crate) registry: ObserverRegistry,
}

/// State shared between a stream's handles and its observers.
#[derive(Debug)]
pub(crate) struct Shared {
    capacity: NonZeroUsize,
    state: Mutex<StreamState>,
}

impl Shared {
    /// Acquire the stream lock.
    ///
    /// A panic while the lock is held cannot leave the ring or registry
    /// half-updated in a way later callers would misread, so a poisoned lock
    /// is recovered rather than propagated.
    pub(crate) fn lock(&self) -> MutexGuard<'_, StreamState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A bounded, in-memory log broadcaster.
///
/// Cloning the stream is cheap and yields another handle to the same
/// history and observer set, so it can be handed explicitly to each
/// component that needs it (the stdin producer, every transport handler).
#[derive(Debug, Clone)]
pub struct BufferedLogStream {
    shared: Arc<Shared>,
}

impl BufferedLogStream {
    /// Create a stream that keeps the last `max_lines` lines of history.
    ///
    /// Each observer's delivery queue has the same capacity.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::ZeroCapacity`] if `max_lines` is 0, or
    /// [`StreamError::CapacityTooLarge`] if it exceeds [`MAX_CAPACITY`].
    pub fn new(max_lines: usize) -> Result<Self, StreamError> {
        let capacity = NonZeroUsize::new(max_lines).ok_or(StreamError::ZeroCapacity)?;
        Self::with_capacity(capacity)
    }

    /// Create a stream from a capacity already known to be non-zero.
    ///
    /// History memory grows with the lines written, up to `capacity`; nothing
    /// is reserved up front.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::CapacityTooLarge`] if `capacity` exceeds
    /// [`MAX_CAPACITY`].
    pub fn with_capacity(capacity: NonZeroUsize) -> Result<Self, StreamError> {
        if capacity.get() > MAX_CAPACITY {
            return Err(StreamError::CapacityTooLarge {
                requested: capacity.get(),
                max: MAX_CAPACITY,
            });
        }

        Ok(Self {
            shared: Arc::new(Shared {
                capacity,
                state: Mutex::new(StreamState {
                    ring: HistoryRing::new(capacity),
                    next_sequence: 0,
                    registry: ObserverRegistry::new(),
                }),
            }),
        })
    }

    /// Write a line to the stream and return its sequence number.
    ///
    /// The line is timestamped at insertion, appended to the history and
    /// offered to every registered observer. Observers whose queue is full
    /// miss this line.
    pub fn write_line(&self, text: impl Into<String>) -> u64 {
        let text = text.into();
        let mut state = self.shared.lock();

        let sequence = state.next_sequence;
        state.next_sequence = sequence.wrapping_add(1);

        let entry = LogEntry::new(sequence, Utc::now(), text);
        let outcome = state.registry.broadcast(&entry);
        state.ring.append(entry);
        drop(state);

        if outcome.pruned > 0 {
            trace!(sequence, pruned = outcome.pruned, "pruned departed observers");
        }

        sequence
    }

    /// Subscribe a new observer.
    ///
    /// The observer's queue is pre-filled with the current history, oldest
    /// first, and it receives every line written afterwards. Callers should
    /// [`close`](StreamObserver::close) the observer when finished; dropping
    /// it has the same effect.
    pub fn new_observer(&self) -> StreamObserver {
        let (tx, rx) = mpsc::channel(self.shared.capacity.get());

        let mut state = self.shared.lock();
        for entry in state.ring.iter() {
            // The queue is as large as the ring, so replay always fits.
            let _ = tx.try_send(entry.clone());
        }
        let replayed = state.ring.len();
        let id = state.registry.register(tx);
        let observers = state.registry.len();
        drop(state);

        debug!(observer = %id, replayed, observers, "observer registered");

        StreamObserver::new(id, rx, Arc::downgrade(&self.shared))
    }

    /// Copy of the current history, oldest first.
    pub fn history(&self) -> Vec<LogEntry> {
        self.shared.lock().ring.snapshot()
    }

    /// The entry with the given sequence number, if it is still in history.
    pub fn entry(&self, sequence: u64) -> Option<LogEntry> {
        self.shared.lock().ring.get(sequence).cloned()
    }

    /// Sequence number the next written line will receive.
    pub fn next_sequence(&self) -> u64 {
        self.shared.lock().next_sequence
    }

    /// Number of currently registered observers.
    pub fn observer_count(&self) -> usize {
        self.shared.lock().registry.len()
    }

    /// Whether `id` is still registered with this stream.
    pub fn is_registered(&self, id: ObserverId) -> bool {
        self.shared.lock().registry.contains(id)
    }

    /// History and per-observer queue capacity.
    pub fn capacity(&self) -> NonZeroUsize {
        self.shared.capacity
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(
            BufferedLogStream::new(0).unwrap_err(),
            StreamError::ZeroCapacity
        );
    }

    #[test]
    fn oversized_capacity_is_rejected() {
        assert_eq!(
            BufferedLogStream::new(usize::MAX).unwrap_err(),
            StreamError::CapacityTooLarge {
                requested: usize::MAX,
                max: MAX_CAPACITY,
            }
        );
        let just_over = NonZeroUsize::new(MAX_CAPACITY.saturating_add(1)).unwrap();
        assert!(matches!(
            BufferedLogStream::with_capacity(just_over),
            Err(StreamError::CapacityTooLarge { .. })
        ));
    }

    #[test]
    fn largest_capacity_is_usable_without_reserving_it() {
        let stream = BufferedLogStream::new(MAX_CAPACITY).unwrap();
        stream.write_line("a");
        let mut observer = stream.new_observer();
        assert_eq!(observer.try_next().unwrap().text, "a");
        stream.write_line("b");
        assert_eq!(observer.try_next().unwrap().text, "b");
        assert_eq!(stream.history().len(), 2);
    }

    #[test]
    fn sequence_numbers_are_contiguous_from_zero() {
        let stream = BufferedLogStream::new(4).unwrap();
        let assigned: Vec<u64> = (0..10).map(|i| stream.write_line(format!("Log {i}"))).collect();
        assert_eq!(assigned, (0..10).collect::<Vec<u64>>());
        assert_eq!(stream.next_sequence(), 10);
    }

    #[test]
    fn history_is_bounded_to_most_recent_lines() {
        let stream = BufferedLogStream::new(10).unwrap();
        for i in 0..25 {
            stream.write_line(format!("Log {i}"));
        }
        let history = stream.history();
        assert_eq!(history.len(), 10);
        let seqs: Vec<u64> = history.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, (15..25).collect::<Vec<u64>>());
    }

    #[test]
    fn entry_lookup_follows_eviction() {
        let stream = BufferedLogStream::new(2).unwrap();
        stream.write_line("a");
        stream.write_line("b");
        stream.write_line("c");
        assert!(stream.entry(0).is_none());
        assert_eq!(stream.entry(2).unwrap().text, "c");
    }

    #[test]
    fn timestamps_are_taken_at_write_time() {
        let stream = BufferedLogStream::new(2).unwrap();
        let before = Utc::now();
        stream.write_line("a");
        let after = Utc::now();
        let entry = stream.entry(0).unwrap();
        assert!(entry.timestamp >= before);
        assert!(entry.timestamp <= after);
    }

    #[test]
    fn stalled_observer_does_not_block_writer() {
        let stream = BufferedLogStream::new(4).unwrap();
        let _stalled = stream.new_observer();

        let started = Instant::now();
        for i in 0..10_000 {
            stream.write_line(format!("Log {i}"));
        }
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(stream.observer_count(), 1);
    }

    #[test]
    fn dropped_observer_is_unregistered() {
        let stream = BufferedLogStream::new(4).unwrap();
        let observer = stream.new_observer();
        let id = observer.id();
        assert!(stream.is_registered(id));
        drop(observer);
        assert!(!stream.is_registered(id));
        assert_eq!(stream.observer_count(), 0);
    }

    #[test]
    fn concurrent_writers_never_share_a_sequence() {
        let stream = BufferedLogStream::new(8).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stream = stream.clone();
                std::thread::spawn(move || {
                    (0..250).map(|i| stream.write_line(format!("Log {i}"))).collect::<Vec<u64>>()
                })
            })
            .collect();

        let mut all: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        assert_eq!(all, (0..1000).collect::<Vec<u64>>());
    }
}
