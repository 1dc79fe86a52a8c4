//! Perception progress events
//!
//! Progress is advisory: emitting never blocks and never fails a scan, and a
//! bus with no subscribers silently drops events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

/// Events emitted while a scan runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PerceptionEvent {
    ScanStarted {
        scan_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// A stage is about to run
    StageStarted {
        scan_id: Uuid,
        /// Stage name (e.g. "detection", "freshness")
        stage: String,
        /// Human-readable status line
        message: String,
    },

    /// Primary yield was low; the hybrid fallback pass is running
    FallbackTriggered {
        scan_id: Uuid,
        primary_count: usize,
        threshold: f64,
    },

    ScanCompleted {
        scan_id: Uuid,
        ingredient_count: usize,
        elapsed_ms: u64,
    },

    ScanTimedOut {
        scan_id: Uuid,
        deadline_ms: u64,
    },
}

impl PerceptionEvent {
    /// Status line suitable for display, if the event carries one
    pub fn status_message(&self) -> Option<&str> {
        match self {
            PerceptionEvent::StageStarted { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Broadcast bus for perception events
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PerceptionEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per slow subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<PerceptionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event; dropped if nobody is listening
    pub fn emit(&self, event: PerceptionEvent) {
        if self.tx.send(event).is_err() {
            trace!("No perception event subscribers");
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
