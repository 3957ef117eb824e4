//! Core broadcast engine for logstream.
//!
//! A [`BufferedLogStream`] accepts text lines from a single producer and fans
//! them out to any number of [`StreamObserver`]s. Each new observer first
//! receives a replay of the most recent lines held in a fixed-capacity
//! [`HistoryRing`], then every line written after it subscribed.
//!
//! # Delivery model
//!
//! Every observer owns a bounded queue sized to the ring's capacity. The
//! producer delivers with a non-blocking `try_send`: when an observer's queue
//! is full the line is dropped for that observer only, and the gap shows up
//! later as a discontinuity in [`LogEntry::sequence`]. The producer never
//! waits on a consumer. The [`sink`] module turns those discontinuities into
//! `Skipping <k> lines...` markers.
//!
//! # Modules
//!
//! - [`entry`] -- the immutable [`LogEntry`] value
//! - [`ring`] -- the fixed-capacity [`HistoryRing`]
//! - [`registry`] -- the [`ObserverRegistry`] and non-blocking broadcast
//! - [`stream`] -- the [`BufferedLogStream`] facade
//! - [`observer`] -- the per-subscriber [`StreamObserver`]
//! - [`sink`] -- gap-aware rendering of an observer's entries
//! - [`config`] -- YAML configuration for the streamer binary

pub mod config;
pub mod entry;
pub mod observer;
pub mod registry;
pub mod ring;
pub mod sink;
pub mod stream;

pub use entry::LogEntry;
pub use observer::{ObserverCloser, StreamObserver};
pub use registry::{BroadcastOutcome, ObserverId, ObserverRegistry};
pub use ring::HistoryRing;
pub use sink::{GapTracker, Rendered, stream_to_writer};
pub use stream::{BufferedLogStream, MAX_CAPACITY, StreamError};
