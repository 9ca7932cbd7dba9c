// Queue bookkeeping: pending FIFO, active slots, history ring buffer
//
// Every method here runs under the queue's mutex and never awaits.

use super::job::{Job, Outcome};
use crate::application::status::QueueStatus;
use crate::domain::{QueueConfig, Snapshot, WorkItemId, WorkRecord};
use std::collections::{HashMap, VecDeque};

/// A pending submission: its record plus the operation it still owns
pub(crate) struct WorkItem {
    pub record: WorkRecord,
    pub job: Box<dyn Job>,
}

/// Item handed to the drain loop after admission
pub(crate) struct Admitted {
    pub record: WorkRecord,
    pub job: Box<dyn Job>,
    pub active_count: usize,
}

pub(crate) struct QueueState {
    /// FIFO: insertion order is admission order
    pending: VecDeque<WorkItem>,

    /// Running items, bounded by max_concurrent
    active: HashMap<WorkItemId, WorkRecord>,

    /// Most-recent-first
    recently_completed: VecDeque<Snapshot>,

    completed_count: u64,
    failed_count: u64,
    history_capacity: usize,
}

impl QueueState {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            active: HashMap::new(),
            recently_completed: VecDeque::with_capacity(history_capacity),
            completed_count: 0,
            failed_count: 0,
            history_capacity,
        }
    }

    /// Append to the tail of the pending queue, returning the new length
    pub fn push(&mut self, item: WorkItem) -> usize {
        self.pending.push_back(item);
        self.pending.len()
    }

    /// Move the head of the pending queue into an active slot, if one is free
    pub fn admit_next(&mut self, max_concurrent: usize, now_millis: i64) -> Option<Admitted> {
        if self.active.len() >= max_concurrent {
            return None;
        }

        let WorkItem { mut record, job } = self.pending.pop_front()?;
        record.start(now_millis);
        self.active.insert(record.id.clone(), record.clone());

        Some(Admitted {
            record,
            job,
            active_count: self.active.len(),
        })
    }

    /// Retire an active item: terminal state, counters, history, free slot
    pub fn finish(
        &mut self,
        id: &str,
        outcome: &Outcome,
        now_millis: i64,
    ) -> Option<WorkRecord> {
        let mut record = self.active.remove(id)?;

        match outcome {
            Outcome::Completed => {
                record.complete(now_millis);
                self.completed_count += 1;
            }
            Outcome::Failed(message) => {
                record.fail(now_millis, message.clone());
                self.failed_count += 1;
            }
        }

        if self.history_capacity > 0 {
            if self.recently_completed.len() == self.history_capacity {
                self.recently_completed.pop_back();
            }
            self.recently_completed.push_front(record.snapshot());
        }

        Some(record)
    }

    /// Empty the pending queue, handing the items back for rejection
    pub fn take_pending(&mut self) -> Vec<WorkItem> {
        self.pending.drain(..).collect()
    }

    /// Owned copy of everything observable
    pub fn status(&self, config: &QueueConfig) -> QueueStatus {
        let mut active_items: Vec<Snapshot> =
            self.active.values().map(WorkRecord::snapshot).collect();
        active_items.sort_by(|a, b| {
            a.started_at
                .cmp(&b.started_at)
                .then_with(|| a.submitted_at.cmp(&b.submitted_at))
        });

        QueueStatus {
            name: config.name.clone(),
            queue_length: self.pending.len(),
            active_count: self.active.len(),
            max_concurrent: config.max_concurrent,
            completed_count: self.completed_count,
            failed_count: self.failed_count,
            active_items,
            pending_items: self.pending.iter().map(|item| item.record.snapshot()).collect(),
            recently_completed: self.recently_completed.iter().cloned().collect(),
        }
    }
}
