//! # Event Bus System
//!
//! Progress reporting for a download batch over `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The batch coordinator and the per-track pipeline publish [`CoreEvent`]s;
//! presentation layers (the CLI progress bar, tests) subscribe independently.
//! Publishing is purely observational: with no subscriber the event is
//! dropped and the pipeline carries on.
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐    subscribe    ┌──────────────┐
//! │ Coordinator  ├──────────────>│ EventBus  ├────────────────>│ Progress bar │
//! └──────────────┘               │ (broadcast│                 └──────────────┘
//! ┌──────────────┐     emit      │  channel) │    subscribe    ┌──────────────┐
//! │ Materializer ├──────────────>│           ├────────────────>│ Test probe   │
//! └──────────────┘               └───────────┘                 └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{BatchEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut stream = bus.subscribe();
//!
//! bus.emit(CoreEvent::Batch(BatchEvent::Started { total: 5 })).ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event, CoreEvent::Batch(BatchEvent::Started { total: 5 }));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Subscribers may see `RecvError::Lagged(n)` when they fall behind; this is
//! non-fatal. `RecvError::Closed` means every sender is gone and the batch
//! is over.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// A batch emits a handful of events per track; subscribers that can't keep
/// up receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published through the event bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Whole-batch lifecycle and aggregate progress
    Batch(BatchEvent),
    /// Per-track pipeline progress and outcome
    Track(TrackEvent),
}

impl CoreEvent {
    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Track(TrackEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Track(TrackEvent::Succeeded { note: Some(_), .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Batch(BatchEvent::Completed { failed, .. }) if *failed > 0 => {
                EventSeverity::Warning
            }
            CoreEvent::Batch(BatchEvent::Started { .. })
            | CoreEvent::Batch(BatchEvent::Completed { .. })
            | CoreEvent::Track(TrackEvent::Succeeded { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity, used to style rendered events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Batch Events
// ============================================================================

/// Events describing the batch as a whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum BatchEvent {
    /// Every track has been dispatched.
    Started {
        /// Number of tracks in the batch.
        total: usize,
    },
    /// One more track reached a terminal outcome.
    Progress {
        /// Tracks finished so far (success or failure).
        completed: usize,
        /// Number of tracks in the batch.
        total: usize,
        /// Progress percentage (0-100).
        percent: u8,
    },
    /// All tracks are done.
    Completed { succeeded: usize, failed: usize },
}

impl BatchEvent {
    /// Builds a progress event, computing the percentage.
    pub fn progress(completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100
        } else {
            ((completed.min(total) * 100) / total) as u8
        };
        BatchEvent::Progress {
            completed,
            total,
            percent,
        }
    }
}

// ============================================================================
// Track Events
// ============================================================================

/// Pipeline stage a track is currently in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TrackStage {
    /// Waiting for a concurrency permit
    Waiting,
    /// Extraction tool running
    Downloading,
    /// Querying the catalog
    ResolvingMetadata,
    /// Tagging tool running
    Tagging,
}

impl fmt::Display for TrackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrackStage::Waiting => "waiting",
            TrackStage::Downloading => "downloading",
            TrackStage::ResolvingMetadata => "resolving metadata",
            TrackStage::Tagging => "tagging",
        };
        f.write_str(label)
    }
}

/// Events for a single track, keyed by the track's display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum TrackEvent {
    /// The track entered a new stage.
    Stage { track: String, stage: TrackStage },
    /// Output already existed; nothing was downloaded.
    Skipped { track: String },
    /// The track finished successfully.
    Succeeded {
        track: String,
        /// Set when the file was kept without tags (e.g. "no metadata").
        note: Option<String>,
    },
    /// The track failed; `reason` is the message stored in the batch result.
    Failed { track: String, reason: String },
}

impl TrackEvent {
    /// Display name of the track this event refers to.
    pub fn track(&self) -> &str {
        match self {
            TrackEvent::Stage { track, .. }
            | TrackEvent::Skipped { track }
            | TrackEvent::Succeeded { track, .. }
            | TrackEvent::Failed { track, .. } => track,
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for pipeline events.
///
/// Cheap to clone; all clones publish into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let track_events = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Track(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
