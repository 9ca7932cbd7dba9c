//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::sync::Arc;
use throttle_core::port::event_sink::mocks::RecordingEventSink;
use throttle_core::port::id_provider::mocks::SequentialIdProvider;
use throttle_core::port::TimeProvider;
use throttle_core::{AdmissionQueue, QueueConfig};
use tokio::time::Instant;

/// Milliseconds since creation on Tokio's clock, so paused-time tests get
/// exact timestamps
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeProvider for TokioClock {
    fn now_millis(&self) -> i64 {
        i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX)
    }
}

/// Queue wired to a recording sink, Tokio's clock and sequential IDs
pub fn queue(name: &str, max_concurrent: usize) -> (AdmissionQueue, RecordingEventSink) {
    queue_with_config(QueueConfig::new(name, max_concurrent))
}

pub fn queue_with_config(config: QueueConfig) -> (AdmissionQueue, RecordingEventSink) {
    let sink = RecordingEventSink::new();
    let queue = AdmissionQueue::with_ports(
        config,
        Arc::new(sink.clone()),
        Arc::new(TokioClock::new()),
        Arc::new(SequentialIdProvider::new()),
    )
    .expect("valid queue config");
    (queue, sink)
}
