//! Admission control: concurrency bound, FIFO order, no lost work

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use throttle_core::port::id_provider::mocks::SequentialIdProvider;
use throttle_core::port::{EventSink, SystemTimeProvider};
use throttle_core::{AdmissionQueue, QueueConfig, QueueError, QueueEvent, WorkState};
use tokio::time::sleep;

/// Three operations against a limit of two: A (100ms), B (50ms), C (10ms)
#[tokio::test(start_paused = true)]
async fn test_two_slot_timeline() {
    let (queue, sink) = common::queue("backend", 2);

    let a = queue.enqueue("A", || async {
        sleep(Duration::from_millis(100)).await;
        Ok::<_, String>("a")
    });
    let b = queue.enqueue("B", || async {
        sleep(Duration::from_millis(50)).await;
        Ok::<_, String>("b")
    });
    let c = queue.enqueue("C", || async {
        sleep(Duration::from_millis(10)).await;
        Ok::<_, String>("c")
    });

    // A and B admitted at t=0, C waits
    let status = queue.status();
    assert_eq!(status.active_count, 2);
    assert_eq!(status.queue_length, 1);
    assert_eq!(status.pending_items[0].label, "C");
    assert_eq!(status.pending_items[0].state, WorkState::Pending);

    // t=55: B done, C running in its slot
    sleep(Duration::from_millis(55)).await;
    let status = queue.status();
    assert_eq!(status.completed_count, 1);
    assert_eq!(status.queue_length, 0);
    let active: Vec<_> = status.active_items.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(active, vec!["A", "C"]);

    assert_eq!(a.await.unwrap(), "a");
    assert_eq!(b.await.unwrap(), "b");
    assert_eq!(c.await.unwrap(), "c");

    let status = queue.status();
    assert_eq!(status.completed_count, 3);
    assert_eq!(status.failed_count, 0);
    assert!(status.is_idle());
    assert_eq!(sink.settled_labels(), vec!["B", "C", "A"]);

    let c_snapshot = status
        .recently_completed
        .iter()
        .find(|s| s.label == "C")
        .unwrap();
    assert_eq!(c_snapshot.started_at, Some(50));
    assert_eq!(c_snapshot.finished_at, Some(60));
    assert_eq!(status.recently_completed[0].label, "A");
    assert_eq!(status.recently_completed[0].duration_ms, Some(100));
}

#[tokio::test(start_paused = true)]
async fn test_never_exceeds_max_concurrent() {
    let (queue, _sink) = common::queue("bounded", 3);
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let futures: Vec<_> = (0..20u64)
        .map(|i| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            queue.enqueue(format!("op-{}", i), move || async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                sleep(Duration::from_millis(5 + (i % 4) * 7)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, String>(i)
            })
        })
        .collect();

    for (i, fut) in futures.into_iter().enumerate() {
        assert_eq!(fut.await.unwrap(), i as u64);
    }

    assert_eq!(peak.load(Ordering::SeqCst), 3);
    assert_eq!(queue.status().completed_count, 20);
}

#[tokio::test(start_paused = true)]
async fn test_single_slot_runs_in_submission_order() {
    let (queue, sink) = common::queue("serial", 1);
    let order = Arc::new(Mutex::new(Vec::new()));

    let futures: Vec<_> = (0..10u64)
        .map(|i| {
            let order = Arc::clone(&order);
            queue.enqueue(format!("op-{}", i), move || async move {
                order.lock().unwrap().push(i);
                // Later items finish faster; admission order must not care
                sleep(Duration::from_millis(20 - i)).await;
                Ok::<_, String>(())
            })
        })
        .collect();

    for fut in futures {
        fut.await.unwrap();
    }

    assert_eq!(*order.lock().unwrap(), (0..10u64).collect::<Vec<_>>());
    let expected: Vec<String> = (0..10).map(|i| format!("op-{}", i)).collect();
    assert_eq!(sink.started_labels(), expected);
}

#[tokio::test(start_paused = true)]
async fn test_every_submission_settles() {
    let (queue, _sink) = common::queue("mixed", 4);

    let futures: Vec<_> = (0..30u64)
        .map(|i| {
            queue.enqueue(format!("op-{}", i), move || async move {
                sleep(Duration::from_millis(i % 7)).await;
                match i % 3 {
                    0 => Ok(i),
                    1 => Err(format!("failed {}", i)),
                    _ => panic!("op {} panicked", i),
                }
            })
        })
        .collect();

    let mut ok = 0;
    let mut failed = 0;
    let mut panicked = 0;
    for fut in futures {
        match fut.await {
            Ok(_) => ok += 1,
            Err(QueueError::Operation(_)) => failed += 1,
            Err(QueueError::Panicked { .. }) => panicked += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!((ok, failed, panicked), (10, 10, 10));
    let status = queue.status();
    assert_eq!(status.completed_count, 10);
    assert_eq!(status.failed_count, 20);
    assert!(status.is_idle());
}

#[tokio::test]
async fn test_operations_run_off_the_caller_task() {
    let (queue, _sink) = common::queue("spawned", 1);
    let ran = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&ran);
    let fut = queue.enqueue("deferred", move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok::<_, String>(())
    });

    // Admitted, but the operation body has not been polled inline
    assert_eq!(queue.status().active_count, 1);
    assert_eq!(ran.load(Ordering::SeqCst), 0);

    fut.await.unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

/// Replays the event stream: active count from Started minus settled events
#[derive(Default)]
struct ActiveTracker {
    state: Mutex<TrackerState>,
}

#[derive(Default)]
struct TrackerState {
    enqueued: std::collections::HashSet<String>,
    active: usize,
    peak: usize,
    started_before_enqueued: usize,
}

impl EventSink for ActiveTracker {
    fn emit(&self, event: &QueueEvent) {
        let mut state = self.state.lock().unwrap();
        match event {
            QueueEvent::Enqueued { id, .. } => {
                state.enqueued.insert(id.clone());
            }
            QueueEvent::Started { id, .. } => {
                if !state.enqueued.contains(id) {
                    state.started_before_enqueued += 1;
                }
                state.active += 1;
                state.peak = state.peak.max(state.active);
            }
            QueueEvent::Completed { .. } | QueueEvent::Failed { .. } => {
                state.active -= 1;
            }
            _ => {}
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_event_stream_respects_bound_across_threads() {
    let tracker = Arc::new(ActiveTracker::default());
    let queue = AdmissionQueue::with_ports(
        QueueConfig::new("events", 2),
        tracker.clone(),
        Arc::new(SystemTimeProvider),
        Arc::new(SequentialIdProvider::new()),
    )
    .unwrap();

    let producers: Vec<_> = (0..8)
        .map(|p| {
            let queue = queue.clone();
            tokio::spawn(async move {
                let futures: Vec<_> = (0..500)
                    .map(|i| {
                        queue.enqueue(format!("p{}-{}", p, i), || async {
                            tokio::task::yield_now().await;
                            Ok::<_, String>(())
                        })
                    })
                    .collect();
                for fut in futures {
                    fut.await.unwrap();
                }
            })
        })
        .collect();

    for producer in producers {
        producer.await.unwrap();
    }

    let state = tracker.state.lock().unwrap();
    assert_eq!(state.enqueued.len(), 4000);
    assert_eq!(state.active, 0);
    assert!(state.peak <= 2, "event-derived peak {} exceeds limit", state.peak);
    assert_eq!(state.started_before_enqueued, 0);
    assert_eq!(queue.status().completed_count, 4000);
}
