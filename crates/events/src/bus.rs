//! In-process status bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`StatusBus`] is the central publish/subscribe hub for [`StatusEvent`]s
//! emitted by the chain runtime. It is designed to be shared via
//! `Arc<StatusBus>` across the application.

use blurmill_core::data::InputData;
use blurmill_core::request::{RequestId, WorkerKind};
use blurmill_core::status::WorkStatus;
use blurmill_core::types::Timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// StatusEvent
// ---------------------------------------------------------------------------

/// A status transition observed on a single work unit.
///
/// Constructed via [`StatusEvent::new`] and enriched with the builder
/// methods [`with_tags`](StatusEvent::with_tags) and
/// [`with_output`](StatusEvent::with_output).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEvent {
    /// Id of the work request the transition belongs to.
    pub request_id: RequestId,

    /// Unique chain name the request was enqueued under.
    pub chain: String,

    /// Worker kind of the unit.
    pub kind: WorkerKind,

    /// The status the unit moved into.
    pub status: WorkStatus,

    /// Observation tags carried by the request.
    pub tags: Vec<String>,

    /// Output bag; empty unless `status` is `Succeeded`.
    pub output: InputData,

    /// When the transition occurred (UTC).
    pub timestamp: Timestamp,
}

impl StatusEvent {
    /// Create a new event with empty tags and output.
    pub fn new(
        chain: impl Into<String>,
        request_id: RequestId,
        kind: WorkerKind,
        status: WorkStatus,
    ) -> Self {
        Self {
            request_id,
            chain: chain.into(),
            kind,
            status,
            tags: Vec::new(),
            output: InputData::default(),
            timestamp: Utc::now(),
        }
    }

    /// Attach the request's observation tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Attach the unit's output bag.
    pub fn with_output(mut self, output: InputData) -> Self {
        self.output = output;
        self
    }
}

// ---------------------------------------------------------------------------
// StatusBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out bus for work status transitions.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`StatusEvent`].
///
/// # Usage
///
/// ```rust
/// use blurmill_core::request::{WorkRequest, WorkerKind};
/// use blurmill_core::status::WorkStatus;
/// use blurmill_events::bus::{StatusBus, StatusEvent};
///
/// let bus = StatusBus::default();
/// let mut rx = bus.subscribe();
///
/// let request = WorkRequest::from_kind(WorkerKind::Cleanup);
/// bus.publish(StatusEvent::new(
///     "demo_chain",
///     request.id,
///     request.kind,
///     WorkStatus::Enqueued,
/// ));
/// ```
pub struct StatusBus {
    sender: broadcast::Sender<StatusEvent>,
}

impl StatusBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// the runtime's snapshot tracker remains the queryable record.
    pub fn publish(&self, event: StatusEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.sender.subscribe()
    }
}

impl Default for StatusBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
