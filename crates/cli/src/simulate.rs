//! Simulated workload: random-latency operations pushed through one queue

use anyhow::{bail, Result};
use colored::Colorize;
use rand::Rng;
use serde::Serialize;
use std::time::{Duration, Instant};
use tabled::{Table, Tabled};
use throttle_core::{AdmissionQueue, QueueError, QueueStatus, RetryPolicy, Snapshot};
use tokio::task::JoinSet;
use tracing::{info, warn};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

/// Shape of a simulated run
#[derive(Debug, Clone)]
pub struct Workload {
    pub jobs: usize,
    pub min_ms: u64,
    pub max_ms: u64,
    pub fail_rate: f64,
    pub policy: RetryPolicy,
}

impl Workload {
    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            bail!("--jobs must be at least 1");
        }
        if self.min_ms > self.max_ms {
            bail!("--min-ms ({}) must not exceed --max-ms ({})", self.min_ms, self.max_ms);
        }
        if !(0.0..=1.0).contains(&self.fail_rate) {
            bail!("--fail-rate must be between 0 and 1, got {}", self.fail_rate);
        }
        Ok(())
    }
}

/// How the submissions settled, from the callers' side
#[derive(Debug, Default, Serialize)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
    pub cleared: usize,
    pub elapsed_ms: u64,
}

impl Summary {
    fn record(&mut self, result: std::result::Result<u64, QueueError<String>>) {
        match result {
            Ok(_) => self.succeeded += 1,
            Err(e) if e.is_cleared() => self.cleared += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Submit every job with retry, wait for all of them, and report
///
/// Ctrl-C clears whatever is still pending; running jobs finish normally.
pub async fn run(queue: &AdmissionQueue, workload: &Workload, quiet: bool) -> Result<Summary> {
    workload.validate()?;
    info!(
        queue = %queue.name(),
        jobs = workload.jobs,
        max_concurrent = queue.max_concurrent(),
        "Starting simulated workload"
    );

    let started = Instant::now();
    let mut set = JoinSet::new();

    for i in 0..workload.jobs {
        let queue = queue.clone();
        let (min_ms, max_ms, fail_rate) = (workload.min_ms, workload.max_ms, workload.fail_rate);
        let policy = workload.policy;

        set.spawn(async move {
            queue
                .enqueue_with_retry(format!("job-{}", i + 1), policy, move || {
                    let mut rng = rand::thread_rng();
                    let latency = rng.gen_range(min_ms..=max_ms);
                    let fails = rng.gen_bool(fail_rate);
                    async move {
                        tokio::time::sleep(Duration::from_millis(latency)).await;
                        if fails {
                            Err(format!("simulated failure after {}ms", latency))
                        } else {
                            Ok(latency)
                        }
                    }
                })
                .await
        });
    }

    let mut summary = Summary::default();
    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            joined = set.join_next() => match joined {
                Some(result) => summary.record(result?),
                None => break,
            },
            _ = ticker.tick(), if !quiet => print_progress(&queue.status()),
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                let cleared = queue.clear();
                warn!(queue = %queue.name(), cleared, "Interrupted, pending work cleared");
            }
        }
    }

    summary.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(summary)
}

fn print_progress(status: &QueueStatus) {
    println!(
        "  {} active {}/{}  pending {}  done {}  failed {}",
        "•".cyan(),
        status.active_count,
        status.max_concurrent,
        status.queue_length,
        status.completed_count,
        status.failed_count
    );
}

#[derive(Tabled)]
struct SnapshotRow {
    id: String,
    label: String,
    state: String,
    waited: String,
    duration: String,
    error: String,
}

impl From<&Snapshot> for SnapshotRow {
    fn from(snapshot: &Snapshot) -> Self {
        let waited = snapshot
            .started_at
            .map(|started| format!("{}ms", started - snapshot.submitted_at))
            .unwrap_or_else(|| "-".to_string());

        Self {
            id: snapshot.id.chars().take(8).collect(),
            label: snapshot.label.clone(),
            state: snapshot.state.to_string(),
            waited,
            duration: snapshot
                .duration_ms
                .map(|ms| format!("{}ms", ms))
                .unwrap_or_else(|| "-".to_string()),
            error: snapshot.error.clone().unwrap_or_default(),
        }
    }
}

/// Colored summary plus a table of recent completions
pub fn print_report(summary: &Summary, status: &QueueStatus) {
    println!();
    println!("{}", format!("Queue {}", status.name).cyan().bold());
    println!("  {} {}", "Succeeded:".bold(), summary.succeeded.to_string().green());
    println!("  {} {}", "Failed:".bold(), summary.failed.to_string().red());
    if summary.cleared > 0 {
        println!("  {} {}", "Cleared:".bold(), summary.cleared.to_string().yellow());
    }
    println!(
        "  {} {} completed, {} failed (including retried attempts)",
        "Attempts:".bold(),
        status.completed_count,
        status.failed_count
    );
    println!("  {} {} ms", "Elapsed:".bold(), summary.elapsed_ms);
    println!();

    if status.recently_completed.is_empty() {
        println!("{}", "No completed work items".yellow());
        return;
    }

    let rows: Vec<SnapshotRow> = status.recently_completed.iter().map(SnapshotRow::from).collect();
    println!("{}", Table::new(rows));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload() -> Workload {
        Workload {
            jobs: 3,
            min_ms: 10,
            max_ms: 20,
            fail_rate: 0.0,
            policy: RetryPolicy::no_retry(),
        }
    }

    #[test]
    fn test_workload_validation() {
        assert!(workload().validate().is_ok());
        assert!(Workload { jobs: 0, ..workload() }.validate().is_err());
        assert!(Workload { min_ms: 30, ..workload() }.validate().is_err());
        assert!(Workload { fail_rate: 1.5, ..workload() }.validate().is_err());
    }

    #[test]
    fn test_summary_tally() {
        let mut summary = Summary::default();
        summary.record(Ok(5));
        summary.record(Err(QueueError::Operation("boom".to_string())));
        summary.record(Err(QueueError::Cleared {
            id: "a".to_string(),
            label: "job-1".to_string(),
        }));

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.cleared, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_settles_every_job() {
        let queue = AdmissionQueue::new(throttle_core::QueueConfig::new("sim", 2)).unwrap();

        let summary = run(&queue, &Workload { jobs: 5, ..workload() }, true).await.unwrap();

        assert_eq!(summary.succeeded, 5);
        assert_eq!(queue.status().completed_count, 5);
        assert!(queue.status().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_counts_failures_after_retries() {
        let queue = AdmissionQueue::new(throttle_core::QueueConfig::new("sim", 2)).unwrap();
        let policy = RetryPolicy::new(1, Duration::from_millis(5)).unwrap();

        let summary = run(
            &queue,
            &Workload { fail_rate: 1.0, policy, ..workload() },
            true,
        )
        .await
        .unwrap();

        assert_eq!(summary.failed, 3);
        assert_eq!(queue.status().failed_count, 6);
    }
}
