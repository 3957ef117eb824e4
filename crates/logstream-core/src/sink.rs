//! Gap-aware rendering of an observer's entries.
//!
//! Dropped entries never raise an error anywhere in the stream. They are only
//! visible as a jump in sequence numbers, which [`GapTracker`] detects and
//! reports as a `Skipping <k> lines...` line ahead of the next entry.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::entry::LogEntry;
use crate::observer::StreamObserver;

/// Tracks the last sequence number seen by one consumer.
#[derive(Debug, Clone, Copy, Default)]
pub struct GapTracker {
    last_seen: Option<u64>,
}

/// Text produced for one received entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// `Skipping <k> lines...` when entries were missed before this one.
    pub skip: Option<String>,
    /// The entry itself, as `<timestamp> - <text>`.
    pub line: String,
}

impl Rendered {
    /// The skip notice (if any) and the line, each newline-terminated.
    pub fn into_text(self) -> String {
        match self.skip {
            Some(skip) => format!("{skip}\n{}\n", self.line),
            None => format!("{}\n", self.line),
        }
    }

    /// The skip notice (if any) followed by the line, without terminators.
    pub fn into_lines(self) -> impl Iterator<Item = String> {
        self.skip.into_iter().chain(std::iter::once(self.line))
    }
}

impl GapTracker {
    /// A tracker that has not seen any entry.
    pub const fn new() -> Self {
        Self { last_seen: None }
    }

    /// Record `entry` and return how many entries were skipped before it.
    ///
    /// The first entry observed never reports a gap.
    pub fn observe(&mut self, entry: &LogEntry) -> Option<u64> {
        let skipped = self
            .last_seen
            .map_or(0, |last| entry.sequence.saturating_sub(last.saturating_add(1)));
        self.last_seen = Some(entry.sequence);
        (skipped > 0).then_some(skipped)
    }

    /// Record `entry` and render it, preceded by a skip notice if needed.
    pub fn render(&mut self, entry: &LogEntry) -> Rendered {
        Rendered {
            skip: self.observe(entry).map(render_skip),
            line: render_entry(entry),
        }
    }

    /// Sequence number of the most recent entry observed.
    pub const fn last_seen(&self) -> Option<u64> {
        self.last_seen
    }
}

/// Render an entry as `<timestamp> - <text>`.
pub fn render_entry(entry: &LogEntry) -> String {
    format!("{} - {}", entry.timestamp.to_rfc3339(), entry.text)
}

/// Render the notice for `skipped` missing entries.
pub fn render_skip(skipped: u64) -> String {
    format!("Skipping {skipped} lines...")
}

/// Copy everything `observer` produces to `writer`, annotating gaps.
///
/// Writes one line per entry, flushing after each so slow streams reach the
/// reader promptly. Returns the number of entries written once the observer
/// terminates. The observer is closed on every exit path.
///
/// # Errors
///
/// Returns the first error produced by `writer`.
pub async fn stream_to_writer<W>(
    mut observer: StreamObserver,
    writer: &mut W,
) -> std::io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut tracker = GapTracker::new();
    let mut written: u64 = 0;

    while let Some(entry) = observer.next().await {
        let text = tracker.render(&entry).into_text();
        writer.write_all(text.as_bytes()).await?;
        writer.flush().await?;
        written = written.saturating_add(1);
    }

    observer.close();
    Ok(written)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::stream::BufferedLogStream;

    fn entry(sequence: u64) -> LogEntry {
        LogEntry::new(sequence, Utc::now(), format!("Log {sequence}"))
    }

    #[test]
    fn contiguous_entries_report_no_gap() {
        let mut tracker = GapTracker::new();
        for seq in 0..5 {
            assert_eq!(tracker.observe(&entry(seq)), None);
        }
        assert_eq!(tracker.last_seen(), Some(4));
    }

    #[test]
    fn first_entry_never_reports_gap() {
        let mut tracker = GapTracker::new();
        assert_eq!(tracker.observe(&entry(10)), None);
        assert_eq!(tracker.observe(&entry(11)), None);
    }

    #[test]
    fn hole_is_reported_once_between_neighbours() {
        let mut tracker = GapTracker::new();
        let lines: Vec<String> = [0, 1, 2, 5, 6]
            .into_iter()
            .flat_map(|seq| tracker.render(&entry(seq)).into_lines())
            .collect();

        let skips: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.starts_with("Skipping"))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(skips, vec![3]);
        assert_eq!(lines[3], "Skipping 2 lines...");
        assert!(lines[2].ends_with(" - Log 2"));
        assert!(lines[4].ends_with(" - Log 5"));
    }

    #[test]
    fn rendered_text_is_newline_terminated() {
        let e = entry(7);
        let rendered = Rendered {
            skip: Some(render_skip(3)),
            line: render_entry(&e),
        };
        let text = rendered.into_text();
        assert!(text.starts_with("Skipping 3 lines...\n"));
        assert!(text.ends_with(" - Log 7\n"));
        assert!(text.contains(&e.timestamp.to_rfc3339()));
    }

    #[tokio::test]
    async fn stream_to_writer_copies_queued_entries() {
        let stream = BufferedLogStream::new(3).unwrap();
        stream.write_line("Log 0");
        let observer = stream.new_observer();
        let closer = observer.closer();
        // Queue holds 0 plus two more; the rest are dropped until it drains.
        for i in 1..6 {
            stream.write_line(format!("Log {i}"));
        }
        closer.close();

        let mut out = Vec::new();
        let written = stream_to_writer(observer, &mut out).await.unwrap();
        assert_eq!(written, 3);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(" - Log 0"));
        assert!(lines[2].ends_with(" - Log 2"));
        assert!(!text.contains("Skipping"));
        assert_eq!(stream.observer_count(), 0);
    }

    #[tokio::test]
    async fn stream_to_writer_reports_skips_after_drain() {
        let stream = BufferedLogStream::new(2).unwrap();
        let mut observer = stream.new_observer();
        stream.write_line("Log 0");
        stream.write_line("Log 1");
        stream.write_line("Log 2");
        // Drain one entry so 3 fits, after 2 was dropped.
        assert_eq!(observer.next().await.unwrap().sequence, 0);
        stream.write_line("Log 3");
        observer.closer().close();

        let mut out = Vec::new();
        stream_to_writer(observer, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(" - Log 1"));
        assert_eq!(lines[1], "Skipping 1 lines...");
        assert!(lines[2].ends_with(" - Log 3"));
    }
}
