// Event Sink Port - structured observability for queue transitions
// Replaces ad-hoc text logging: tests subscribe to events instead of parsing logs

use crate::domain::QueueEvent;
use tracing::{debug, error, info, warn};

/// Receives every state transition of a queue and its retry loops
///
/// Queue transitions are emitted while the queue's lock is held, so events
/// for one queue arrive in the order they happened. Implementations must not
/// block and must not call back into the queue that emitted the event.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &QueueEvent);
}

/// Default sink: one structured `tracing` event per transition
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &QueueEvent) {
        match event {
            QueueEvent::Enqueued {
                queue,
                id,
                label,
                queue_length,
            } => debug!(
                queue = %queue,
                item_id = %id,
                label = %label,
                queue_length = queue_length,
                "Work item enqueued"
            ),
            QueueEvent::Started {
                queue,
                id,
                label,
                waited_ms,
                active_count,
            } => debug!(
                queue = %queue,
                item_id = %id,
                label = %label,
                waited_ms = waited_ms,
                active_count = active_count,
                "Work item started"
            ),
            QueueEvent::Completed {
                queue,
                id,
                label,
                duration_ms,
            } => debug!(
                queue = %queue,
                item_id = %id,
                label = %label,
                duration_ms = duration_ms,
                "Work item completed"
            ),
            QueueEvent::Failed {
                queue,
                id,
                label,
                duration_ms,
                error,
            } => warn!(
                queue = %queue,
                item_id = %id,
                label = %label,
                duration_ms = duration_ms,
                error = %error,
                "Work item failed"
            ),
            QueueEvent::Cleared { queue, id, label } => info!(
                queue = %queue,
                item_id = %id,
                label = %label,
                "Pending work item cleared"
            ),
            QueueEvent::RetryScheduled {
                queue,
                label,
                attempt,
                delay_ms,
                error,
            } => warn!(
                queue = %queue,
                label = %label,
                attempt = attempt,
                delay_ms = delay_ms,
                error = %error,
                "Scheduling retry"
            ),
            QueueEvent::RetryExhausted {
                queue,
                label,
                attempts,
                error,
            } => error!(
                queue = %queue,
                label = %label,
                attempts = attempts,
                error = %error,
                "Max retry attempts reached"
            ),
        }
    }
}

/// Discards every event
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: &QueueEvent) {}
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every event in arrival order
    #[derive(Clone, Default)]
    pub struct RecordingEventSink {
        events: Arc<Mutex<Vec<QueueEvent>>>,
    }
    impl RecordingEventSink {
        pub fn new() -> Self {
            Self::default()
        }
        pub fn events(&self) -> Vec<QueueEvent> {
            self.events.lock().unwrap().clone()
        }
        /// Labels of `Started` events, in admission order
        pub fn started_labels(&self) -> Vec<String> {
            self.labels_where(|e| matches!(e, QueueEvent::Started { .. }))
        }
        /// Labels of `Completed` and `Failed` events, in settle order
        pub fn settled_labels(&self) -> Vec<String> {
            self.labels_where(|e| {
                matches!(e, QueueEvent::Completed { .. } | QueueEvent::Failed { .. })
            })
        }
        pub fn count(&self, predicate: impl Fn(&QueueEvent) -> bool) -> usize {
            self.events.lock().unwrap().iter().filter(|&e| predicate(e)).count()
        }
        fn labels_where(&self, predicate: impl Fn(&QueueEvent) -> bool) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|&e| predicate(e))
                .map(|e| e.label().to_string())
                .collect()
        }
    }
    impl EventSink for RecordingEventSink {
        fn emit(&self, event: &QueueEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }
}
