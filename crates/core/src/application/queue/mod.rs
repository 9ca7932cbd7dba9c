//! Admission Queue - bounded concurrency with FIFO admission
//!
//! - At most `max_concurrent` operations run at once
//! - Waiting items are admitted strictly in submission order
//! - Every submission settles exactly once, through the caller's future
//!
//! Bookkeeping lives behind a `std::sync::Mutex` that is never held across
//! an `.await` or while calling an operation. Queue transitions are emitted
//! under that lock, so a sink sees them in the order they happened.

mod job;
mod state;

use crate::application::status::QueueStatus;
use crate::domain::{QueueConfig, QueueError, QueueEvent, WorkRecord};
use crate::error::Result;
use crate::port::{
    EventSink, IdProvider, SystemTimeProvider, TimeProvider, TracingEventSink, UuidProvider,
};
use job::{panic_message, Outcome, Settlement, TypedJob};
use state::{Admitted, QueueState, WorkItem};
use std::fmt::{self, Display};
use std::panic::{self, AssertUnwindSafe};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Throttles concurrent calls to one backend (one instance per throttling domain)
///
/// Cloning is cheap and yields a handle to the same queue.
#[derive(Clone)]
pub struct AdmissionQueue {
    shared: Arc<Shared>,
}

struct Shared {
    config: QueueConfig,
    state: Mutex<QueueState>,
    sink: Arc<dyn EventSink>,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
}

impl fmt::Debug for AdmissionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionQueue")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl AdmissionQueue {
    /// Create a queue with production ports (tracing events, system clock, UUIDs)
    pub fn new(config: QueueConfig) -> Result<Self> {
        Self::with_ports(
            config,
            Arc::new(TracingEventSink),
            Arc::new(SystemTimeProvider),
            Arc::new(UuidProvider),
        )
    }

    /// Create a queue with injected ports
    ///
    /// # Arguments
    ///
    /// * `config` - Name, concurrency limit and history size (validated)
    /// * `sink` - Receives every state transition
    /// * `time_provider` - Timestamps for snapshots (injected for determinism)
    /// * `id_provider` - Work item IDs (injected for determinism)
    pub fn with_ports(
        config: QueueConfig,
        sink: Arc<dyn EventSink>,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Result<Self> {
        config.validate()?;
        debug!(?config, "AdmissionQueue::with_ports: called");

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState::new(config.history_capacity)),
                config,
                sink,
                time_provider,
                id_provider,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    pub fn max_concurrent(&self) -> usize {
        self.shared.config.max_concurrent
    }

    pub fn config(&self) -> &QueueConfig {
        &self.shared.config
    }

    /// Submit an operation
    ///
    /// The item is queued and, capacity permitting, admitted before this
    /// returns; the operation itself always runs on a spawned task, never
    /// inline. The returned future resolves once the operation settles, with
    /// its value or its error passed through unchanged. Dropping that future
    /// does not cancel the item.
    ///
    /// A blank `label` is recorded as `"request"`. Must be called from within
    /// a Tokio runtime.
    pub fn enqueue<F, Fut, T, E>(
        &self,
        label: impl Into<String>,
        operation: F,
    ) -> impl Future<Output = std::result::Result<T, QueueError<E>>> + Send + 'static
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let (reply, receiver) = oneshot::channel::<std::result::Result<T, QueueError<E>>>();
        let record = WorkRecord::new(
            self.shared.id_provider.generate_id(),
            label,
            self.shared.time_provider.now_millis(),
        );
        let id = record.id.clone();
        let label = record.label.clone();

        {
            let mut state = self.shared.lock();
            let queue_length = state.push(WorkItem {
                record,
                job: Box::new(TypedJob::new(operation, reply)),
            });

            // Under the lock so no drain can report Started first
            self.shared.sink.emit(&QueueEvent::Enqueued {
                queue: self.shared.config.name.clone(),
                id: id.clone(),
                label,
                queue_length,
            });
        }

        self.shared.drain();

        async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(QueueError::Abandoned { id }))
        }
    }

    /// Reject every pending item with `QueueError::Cleared`
    ///
    /// Items already processing run to completion. Returns how many items
    /// were rejected.
    pub fn clear(&self) -> usize {
        let cleared = {
            let mut state = self.shared.lock();
            let cleared = state.take_pending();
            for WorkItem { record, .. } in &cleared {
                self.shared.sink.emit(&QueueEvent::Cleared {
                    queue: self.shared.config.name.clone(),
                    id: record.id.clone(),
                    label: record.label.clone(),
                });
            }
            cleared
        };
        let count = cleared.len();

        for WorkItem { record, job } in cleared {
            job.reject(record.id, record.label);
        }

        if count > 0 {
            info!(queue = %self.name(), cleared = count, "Pending work items cleared");
        }
        count
    }

    /// Owned snapshot of depth, counters and item lists
    ///
    /// Safe to call from any task at any time; it only takes the lock long
    /// enough to copy.
    pub fn status(&self) -> QueueStatus {
        self.shared.lock().status(&self.shared.config)
    }

    pub(crate) fn emit(&self, event: &QueueEvent) {
        self.shared.sink.emit(event);
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // No operation code runs under this lock, so a poisoned guard still
        // holds consistent state
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fill free slots from the head of the pending queue
    ///
    /// Loops until the queue is full or empty. Each admitted operation runs on
    /// its own task, which drains again after settling, so draining never
    /// recurses on one stack and always yields between operations.
    fn drain(self: &Arc<Self>) {
        loop {
            let now = self.time_provider.now_millis();
            let mut state = self.lock();

            let Some(Admitted {
                record,
                job,
                active_count,
            }) = state.admit_next(self.config.max_concurrent, now)
            else {
                return;
            };

            self.sink.emit(&QueueEvent::Started {
                queue: self.config.name.clone(),
                id: record.id.clone(),
                label: record.label.clone(),
                waited_ms: record.waited_ms().unwrap_or(0),
                active_count,
            });
            drop(state);

            let shared = Arc::clone(self);
            let id = record.id;
            tokio::spawn(async move {
                let settlement = job.run(id.clone()).await;

                // The freed slot must be refilled even if a sink panics
                let settled =
                    panic::catch_unwind(AssertUnwindSafe(|| shared.settle(&id, settlement)));
                if let Err(payload) = settled {
                    error!(
                        queue = %shared.config.name,
                        item_id = %id,
                        panic = %panic_message(payload),
                        "Panic while settling work item"
                    );
                }
                shared.drain();
            });
        }
    }

    /// Record the outcome, free the slot, then hand the result to the caller
    fn settle(&self, id: &str, settlement: Settlement) {
        let Settlement { outcome, deliver } = settlement;
        let now = self.time_provider.now_millis();
        let mut state = self.lock();

        match state.finish(id, &outcome, now) {
            Some(record) => {
                let duration_ms = record.duration_ms().unwrap_or(0);
                let event = match outcome {
                    Outcome::Completed => QueueEvent::Completed {
                        queue: self.config.name.clone(),
                        id: record.id,
                        label: record.label,
                        duration_ms,
                    },
                    Outcome::Failed(error) => QueueEvent::Failed {
                        queue: self.config.name.clone(),
                        id: record.id,
                        label: record.label,
                        duration_ms,
                        error,
                    },
                };
                self.sink.emit(&event);
            }
            None => warn!(queue = %self.config.name, item_id = %id, "Settled item was not active"),
        }
        drop(state);

        deliver();
    }
}
