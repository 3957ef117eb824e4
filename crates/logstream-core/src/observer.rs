//! Per-subscriber handle onto a [`BufferedLogStream`](crate::BufferedLogStream).
//!
//! A [`StreamObserver`] yields its replay followed by live entries, in
//! strictly increasing sequence order, until it is closed. Consumption is
//! available as an async [`next`](StreamObserver::next), a blocking
//! [`blocking_next`](StreamObserver::blocking_next) for plain threads, or as a
//! [`futures::Stream`].
//!
//! Closing removes the observer from the registry *before* its queue is
//! released, so a broadcast in flight never targets a released queue.

use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tracing::debug;

use crate::entry::LogEntry;
use crate::registry::ObserverId;
use crate::stream::Shared;

/// Handle that unregisters an observer from its stream.
///
/// Obtained from [`StreamObserver::closer`] so a task other than the
/// consumer can end the subscription. Entries queued before the close are
/// still delivered to the consumer, after which its sequence ends.
#[derive(Debug, Clone)]
pub struct ObserverCloser {
    id: ObserverId,
    stream: Weak<Shared>,
}

impl ObserverCloser {
    /// Remove the observer from its stream's registry.
    ///
    /// Returns `false` if it was already removed or the stream is gone.
    pub fn close(&self) -> bool {
        let Some(shared) = self.stream.upgrade() else {
            return false;
        };
        let removed = shared.lock().registry.unregister(self.id);
        if removed {
            debug!(observer = %self.id, "observer unregistered");
        }
        removed
    }

    /// Identity of the observer this handle closes.
    pub const fn id(&self) -> ObserverId {
        self.id
    }
}

/// A subscriber's view of a stream: replayed history, then live entries.
///
/// Dropping the observer closes it.
#[derive(Debug)]
pub struct StreamObserver {
    closer: ObserverCloser,
    /// `None` once [`close`](Self::close) has released the queue.
    queue: Option<mpsc::Receiver<LogEntry>>,
}

impl StreamObserver {
    pub(crate) const fn new(
        id: ObserverId,
        queue: mpsc::Receiver<LogEntry>,
        stream: Weak<Shared>,
    ) -> Self {
        Self {
            closer: ObserverCloser { id, stream },
            queue: Some(queue),
        }
    }

    /// Identity of this observer within its stream.
    pub const fn id(&self) -> ObserverId {
        self.closer.id
    }

    /// Wait for the next entry.
    ///
    /// Returns `None` once the observer is closed (by [`close`](Self::close),
    /// by an [`ObserverCloser`] after the queue drains, or because the stream
    /// was dropped). Reading past the end keeps returning `None`.
    pub async fn next(&mut self) -> Option<LogEntry> {
        self.queue.as_mut()?.recv().await
    }

    /// Blocking variant of [`next`](Self::next) for synchronous consumers.
    ///
    /// Must not be called from within an async runtime.
    pub fn blocking_next(&mut self) -> Option<LogEntry> {
        self.queue.as_mut()?.blocking_recv()
    }

    /// Take the next entry if one is already queued.
    pub fn try_next(&mut self) -> Option<LogEntry> {
        self.queue.as_mut()?.try_recv().ok()
    }

    /// A handle that can close this observer from another task.
    pub fn closer(&self) -> ObserverCloser {
        self.closer.clone()
    }

    /// Unregister from the stream and release the queue.
    ///
    /// Entries still queued are discarded; subsequent reads return `None`.
    /// Calling this more than once has no further effect.
    pub fn close(&mut self) {
        self.closer.close();
        self.queue = None;
    }

    /// Whether the observer will yield no further entries.
    ///
    /// True after [`close`](Self::close), and after an [`ObserverCloser`] or
    /// a dropped stream has ended the subscription and the queue is drained.
    pub fn is_closed(&self) -> bool {
        self.queue
            .as_ref()
            .is_none_or(|queue| queue.is_closed() && queue.is_empty())
    }
}

impl Drop for StreamObserver {
    fn drop(&mut self) {
        self.closer.close();
    }
}

impl Stream for StreamObserver {
    type Item = LogEntry;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<LogEntry>> {
        match self.get_mut().queue.as_mut() {
            Some(queue) => queue.poll_recv(cx),
            None => Poll::Ready(None),
        }
    }
}
