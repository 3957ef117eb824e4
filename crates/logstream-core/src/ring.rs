//! Fixed-capacity circular history of the most recent log entries.
//!
//! The ring is owned by a [`BufferedLogStream`](crate::BufferedLogStream) and
//! only mutated from its write path. Memory is bounded by the capacity
//! regardless of how many lines are written or how long the process runs.

use std::num::NonZeroUsize;

use crate::entry::LogEntry;

/// Circular store holding up to `capacity` of the most recently appended
/// entries.
///
/// Slots are filled in order until the ring is full; after that every append
/// overwrites the slot under the write cursor, which always holds the oldest
/// entry.
#[derive(Debug)]
pub struct HistoryRing {
    /// Stored entries. Grows up to `capacity`, then stays that length.
    slots: Vec<LogEntry>,

    /// Position of the next write. Once the ring is full this is also the
    /// position of the oldest entry.
    head: usize,

    /// Maximum number of entries retained.
    capacity: NonZeroUsize,
}

impl HistoryRing {
    /// Create an empty ring that retains at most `capacity` entries.
    ///
    /// No slots are allocated until entries are appended.
    pub const fn new(capacity: NonZeroUsize) -> Self {
        Self {
            slots: Vec::new(),
            head: 0,
            capacity,
        }
    }

    /// Append an entry, evicting the oldest one if the ring is full.
    pub fn append(&mut self, entry: LogEntry) {
        if self.slots.len() < self.capacity.get() {
            self.slots.push(entry);
        } else if let Some(slot) = self.slots.get_mut(self.head) {
            *slot = entry;
        }

        let next = self.head.saturating_add(1);
        self.head = if next >= self.capacity.get() { 0 } else { next };
    }

    /// Iterate over the stored entries, oldest first.
    ///
    /// Before the ring wraps, `head` equals the number of stored entries, so
    /// the first half of the chain is empty and the second yields everything
    /// in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.slots
            .iter()
            .skip(self.head)
            .chain(self.slots.iter().take(self.head))
    }

    /// Copy the stored entries out, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.iter().cloned().collect()
    }

    /// Look up a stored entry by sequence number.
    ///
    /// Returns `None` if the entry has been evicted or was never written.
    pub fn get(&self, sequence: u64) -> Option<&LogEntry> {
        let oldest = self.iter().next()?.sequence;
        let offset = usize::try_from(sequence.checked_sub(oldest)?).ok()?;
        self.iter().nth(offset).filter(|e| e.sequence == sequence)
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Maximum number of entries retained.
    pub const fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn ring(capacity: usize) -> HistoryRing {
        HistoryRing::new(NonZeroUsize::new(capacity).unwrap())
    }

    fn entry(sequence: u64) -> LogEntry {
        LogEntry::new(sequence, Utc::now(), format!("Log {sequence}"))
    }

    fn sequences(ring: &HistoryRing) -> Vec<u64> {
        ring.iter().map(|e| e.sequence).collect()
    }

    #[test]
    fn empty_ring_has_empty_snapshot() {
        let ring = ring(4);
        assert!(ring.is_empty());
        assert_eq!(ring.len(), 0);
        assert!(ring.snapshot().is_empty());
    }

    #[test]
    fn huge_capacity_allocates_only_what_is_stored() {
        let mut ring = ring(usize::MAX);
        ring.append(entry(0));
        ring.append(entry(1));
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.capacity().get(), usize::MAX);
        assert_eq!(sequences(&ring), vec![0, 1]);
    }

    #[test]
    fn partial_fill_keeps_insertion_order() {
        let mut ring = ring(4);
        for seq in 0..3 {
            ring.append(entry(seq));
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(sequences(&ring), vec![0, 1, 2]);
    }

    #[test]
    fn wrapping_evicts_oldest() {
        let mut ring = ring(4);
        for seq in 0..10 {
            ring.append(entry(seq));
        }
        assert_eq!(ring.len(), 4);
        assert_eq!(sequences(&ring), vec![6, 7, 8, 9]);
    }

    #[test]
    fn exactly_full_ring_is_ordered() {
        let mut ring = ring(3);
        for seq in 0..3 {
            ring.append(entry(seq));
        }
        assert_eq!(sequences(&ring), vec![0, 1, 2]);
        ring.append(entry(3));
        assert_eq!(sequences(&ring), vec![1, 2, 3]);
    }

    #[test]
    fn capacity_one_keeps_latest_only() {
        let mut ring = ring(1);
        ring.append(entry(0));
        ring.append(entry(1));
        ring.append(entry(2));
        assert_eq!(ring.len(), 1);
        assert_eq!(sequences(&ring), vec![2]);
    }

    #[test]
    fn snapshot_preserves_entry_contents() {
        let mut ring = ring(2);
        let first = entry(0);
        let second = entry(1);
        ring.append(first.clone());
        ring.append(second.clone());
        assert_eq!(ring.snapshot(), vec![first, second]);
    }

    #[test]
    fn get_finds_only_retained_entries() {
        let mut ring = ring(3);
        for seq in 0..5 {
            ring.append(entry(seq));
        }
        assert!(ring.get(1).is_none());
        assert_eq!(ring.get(2).map(|e| e.text.as_str()), Some("Log 2"));
        assert_eq!(ring.get(4).map(|e| e.sequence), Some(4));
        assert!(ring.get(5).is_none());
    }
}
