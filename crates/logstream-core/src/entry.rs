//! The unit of data flowing through a stream.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single timestamped, sequence-numbered log line.
///
/// `sequence` counts lines since the start of the stream, beginning at 0.
/// An observer that sees a jump in sequence numbers has lost lines because
/// it could not keep up with the producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Position of this line in the stream's write order.
    pub sequence: u64,
    /// Time the line was written to the stream (not the time it was observed).
    pub timestamp: DateTime<Utc>,
    /// The line content, uninterpreted.
    pub text: String,
}

impl LogEntry {
    /// Build an entry from its parts.
    pub const fn new(sequence: u64, timestamp: DateTime<Utc>, text: String) -> Self {
        Self {
            sequence,
            timestamp,
            text,
        }
    }
}
