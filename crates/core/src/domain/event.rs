// Queue Events - state transitions observed by an EventSink

use super::{QueueId, WorkItemId};
use serde::{Deserialize, Serialize};

/// A single observable transition inside a queue or its retry loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum QueueEvent {
    /// Item appended to the pending queue
    Enqueued {
        queue: QueueId,
        id: WorkItemId,
        label: String,
        queue_length: usize,
    },
    /// Item admitted into an active slot
    Started {
        queue: QueueId,
        id: WorkItemId,
        label: String,
        waited_ms: i64,
        active_count: usize,
    },
    Completed {
        queue: QueueId,
        id: WorkItemId,
        label: String,
        duration_ms: i64,
    },
    Failed {
        queue: QueueId,
        id: WorkItemId,
        label: String,
        duration_ms: i64,
        error: String,
    },
    /// Pending item rejected by `clear()`
    Cleared {
        queue: QueueId,
        id: WorkItemId,
        label: String,
    },
    /// Attempt failed; the next one (1-indexed `attempt`) runs after `delay_ms`
    RetryScheduled {
        queue: QueueId,
        label: String,
        attempt: u32,
        delay_ms: u64,
        error: String,
    },
    RetryExhausted {
        queue: QueueId,
        label: String,
        attempts: u32,
        error: String,
    },
}

impl QueueEvent {
    pub fn queue(&self) -> &str {
        match self {
            QueueEvent::Enqueued { queue, .. }
            | QueueEvent::Started { queue, .. }
            | QueueEvent::Completed { queue, .. }
            | QueueEvent::Failed { queue, .. }
            | QueueEvent::Cleared { queue, .. }
            | QueueEvent::RetryScheduled { queue, .. }
            | QueueEvent::RetryExhausted { queue, .. } => queue,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            QueueEvent::Enqueued { label, .. }
            | QueueEvent::Started { label, .. }
            | QueueEvent::Completed { label, .. }
            | QueueEvent::Failed { label, .. }
            | QueueEvent::Cleared { label, .. }
            | QueueEvent::RetryScheduled { label, .. }
            | QueueEvent::RetryExhausted { label, .. } => label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = QueueEvent::Cleared {
            queue: "pdf".to_string(),
            id: "item-3".to_string(),
            label: "render".to_string(),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "cleared");
        assert_eq!(value["queue"], "pdf");
        assert_eq!(event.label(), "render");
    }
}
