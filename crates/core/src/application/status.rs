// Status Reporter - read-only view of a queue

use crate::domain::{QueueId, Snapshot};
use serde::{Deserialize, Serialize};

/// Owned point-in-time view of a queue
///
/// Built under the queue's lock from cloned snapshots, so holding or
/// mutating it never affects admission or draining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub name: QueueId,
    pub queue_length: usize,
    pub active_count: usize,
    pub max_concurrent: usize,
    pub completed_count: u64,
    pub failed_count: u64,
    /// Ordered by start time
    pub active_items: Vec<Snapshot>,
    /// FIFO order
    pub pending_items: Vec<Snapshot>,
    /// Most recent first
    pub recently_completed: Vec<Snapshot>,
}

impl QueueStatus {
    /// No pending and no active work
    pub fn is_idle(&self) -> bool {
        self.queue_length == 0 && self.active_count == 0
    }

    pub fn available_slots(&self) -> usize {
        self.max_concurrent.saturating_sub(self.active_count)
    }

    pub fn total_settled(&self) -> u64 {
        self.completed_count + self.failed_count
    }
}
