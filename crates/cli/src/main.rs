//! Throttle CLI - builds the queue registry and drives simulated workloads

mod simulate;
mod telemetry;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::json;
use simulate::Workload;
use std::time::Duration;
use tabled::{Table, Tabled};
use throttle_core::application::constants::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_RETRIES};
use throttle_core::{QueueRegistry, RegistryConfig, RetryPolicy, VERSION};
use tracing::info;

#[derive(Parser)]
#[command(name = "throttle")]
#[command(about = "Admission control and retry for rate-limited backends", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Queue list as name=max_concurrent,... (overrides THROTTLE_QUEUES)
    #[arg(long, global = true)]
    queues: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured queues
    Queues {
        /// Print status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a simulated workload through one queue
    Simulate {
        /// Queue name
        #[arg(short, long, default_value = "backend")]
        queue: String,

        /// Number of operations to submit
        #[arg(short, long, default_value = "10")]
        jobs: usize,

        /// Shortest simulated latency (ms)
        #[arg(long, default_value = "50")]
        min_ms: u64,

        /// Longest simulated latency (ms)
        #[arg(long, default_value = "500")]
        max_ms: u64,

        /// Probability that an attempt fails (0.0 - 1.0)
        #[arg(long, default_value = "0.2")]
        fail_rate: f64,

        /// Retries after the first attempt
        #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
        retries: u32,

        /// Delay before the first retry (ms), doubled on each further retry
        #[arg(long, default_value_t = DEFAULT_INITIAL_DELAY.as_millis() as u64)]
        initial_delay_ms: u64,

        /// Print summary and final status as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Tabled)]
struct QueueRow {
    name: String,
    max_concurrent: usize,
    history_capacity: usize,
}

fn load_registry(queues: Option<&str>) -> Result<QueueRegistry> {
    let config = RegistryConfig::load(queues).context("Invalid queue configuration")?;

    QueueRegistry::from_config(config).context("Failed to build queue registry")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    telemetry::init_logging()?;
    info!("Throttle v{} starting...", VERSION);

    let registry = load_registry(cli.queues.as_deref())?;

    match cli.command {
        Commands::Queues { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&registry.statuses())?);
                return Ok(());
            }

            let rows: Vec<QueueRow> = registry
                .queues()
                .map(|queue| QueueRow {
                    name: queue.name().to_string(),
                    max_concurrent: queue.max_concurrent(),
                    history_capacity: queue.config().history_capacity,
                })
                .collect();

            println!("{}", "Configured queues".cyan().bold());
            println!();
            println!("{}", Table::new(rows));
        }

        Commands::Simulate {
            queue,
            jobs,
            min_ms,
            max_ms,
            fail_rate,
            retries,
            initial_delay_ms,
            json,
        } => {
            let queue = registry.require(&queue)?;
            let workload = Workload {
                jobs,
                min_ms,
                max_ms,
                fail_rate,
                policy: RetryPolicy::new(retries, Duration::from_millis(initial_delay_ms))?,
            };

            if !json {
                println!(
                    "{}",
                    format!(
                        "Simulating {} jobs on {} (max {} concurrent)",
                        jobs,
                        queue.name(),
                        queue.max_concurrent()
                    )
                    .cyan()
                    .bold()
                );
            }

            let summary = simulate::run(queue, &workload, json).await?;
            let status = queue.status();

            if json {
                let report = json!({ "summary": summary, "status": status });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                simulate::print_report(&summary, &status);
            }
        }
    }

    Ok(())
}
