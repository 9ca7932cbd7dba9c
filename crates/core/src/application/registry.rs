//! Queue Registry - named queues built once at startup
//!
//! Each throttling domain gets its own queue with its own limit, so one
//! domain's backlog never starves another. The registry owns the instances
//! and hands out handles; there is no global queue.

use crate::application::constants::{DEFAULT_QUEUES, HISTORY_CAPACITY_ENV, QUEUES_ENV};
use crate::application::queue::AdmissionQueue;
use crate::application::status::QueueStatus;
use crate::domain::queue::DEFAULT_HISTORY_CAPACITY;
use crate::domain::{QueueConfig, QueueId};
use crate::error::{AppError, Result};
use crate::port::{
    EventSink, IdProvider, SystemTimeProvider, TimeProvider, TracingEventSink, UuidProvider,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Queue definitions for a registry
///
/// Each `QueueConfig` carries its own history capacity; `parse` applies one
/// capacity to every queue it reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub queues: Vec<QueueConfig>,
}

impl RegistryConfig {
    /// Load from `THROTTLE_QUEUES` and `THROTTLE_HISTORY_CAPACITY`
    ///
    /// # Environment Variables
    ///
    /// - `THROTTLE_QUEUES`: comma-separated `name=max_concurrent` (default: backend=3,pdf=1)
    /// - `THROTTLE_HISTORY_CAPACITY`: recent completions kept per queue (default: 50)
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Like `from_env`, but an explicit queue list replaces `THROTTLE_QUEUES`
    ///
    /// With an override, `THROTTLE_QUEUES` is never read, so a malformed
    /// value there cannot fail the override.
    pub fn load(queue_list: Option<&str>) -> Result<Self> {
        let history_capacity = Self::history_capacity_from_env()?;

        match queue_list {
            Some(queue_list) => Self::parse(queue_list, history_capacity),
            None => {
                let queue_list =
                    std::env::var(QUEUES_ENV).unwrap_or_else(|_| DEFAULT_QUEUES.to_string());
                Self::parse(&queue_list, history_capacity)
            }
        }
    }

    /// `THROTTLE_HISTORY_CAPACITY`, or the default when unset
    pub fn history_capacity_from_env() -> Result<usize> {
        match std::env::var(HISTORY_CAPACITY_ENV) {
            Ok(raw) => raw.trim().parse::<usize>().map_err(|_| {
                AppError::Config(format!(
                    "{} must be a non-negative integer: {}",
                    HISTORY_CAPACITY_ENV, raw
                ))
            }),
            Err(_) => Ok(DEFAULT_HISTORY_CAPACITY),
        }
    }

    /// Parse `name=max_concurrent,...`, applying one history capacity to all queues
    pub fn parse(queue_list: &str, history_capacity: usize) -> Result<Self> {
        let mut queues = Vec::new();

        for entry in queue_list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, max) = entry.split_once('=').ok_or_else(|| {
                AppError::Config(format!("Queue entry must be name=max_concurrent: {}", entry))
            })?;
            let max_concurrent = max.trim().parse::<usize>().map_err(|_| {
                AppError::Config(format!("Invalid max_concurrent for queue {}: {}", name.trim(), max))
            })?;

            queues.push(
                QueueConfig::new(name.trim(), max_concurrent).with_history_capacity(history_capacity),
            );
        }

        if queues.is_empty() {
            return Err(AppError::Config("No queues configured".to_string()));
        }

        Ok(Self { queues })
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            queues: vec![QueueConfig::new("backend", 3), QueueConfig::new("pdf", 1)],
        }
    }
}

/// Owns one queue per throttling domain
#[derive(Debug)]
pub struct QueueRegistry {
    queues: BTreeMap<QueueId, AdmissionQueue>,
}

impl QueueRegistry {
    /// Build every configured queue with production ports
    pub fn from_config(config: RegistryConfig) -> Result<Self> {
        Self::new(
            config,
            Arc::new(TracingEventSink),
            Arc::new(SystemTimeProvider),
            Arc::new(UuidProvider),
        )
    }

    /// Build every configured queue, sharing the injected ports
    ///
    /// Fails on the first invalid config or on a duplicate name.
    pub fn new(
        config: RegistryConfig,
        sink: Arc<dyn EventSink>,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Result<Self> {
        let mut queues = BTreeMap::new();

        for queue_config in config.queues {
            if queues.contains_key(&queue_config.name) {
                return Err(AppError::Conflict(format!(
                    "Queue {} configured twice",
                    queue_config.name
                )));
            }

            let queue = AdmissionQueue::with_ports(
                queue_config,
                Arc::clone(&sink),
                Arc::clone(&time_provider),
                Arc::clone(&id_provider),
            )?;
            info!(
                queue = %queue.name(),
                max_concurrent = queue.max_concurrent(),
                "Queue registered"
            );
            queues.insert(queue.name().to_string(), queue);
        }

        Ok(Self { queues })
    }

    pub fn get(&self, name: &str) -> Option<&AdmissionQueue> {
        self.queues.get(name)
    }

    /// Like `get`, but a missing queue is an error
    pub fn require(&self, name: &str) -> Result<&AdmissionQueue> {
        self.get(name)
            .ok_or_else(|| AppError::NotFound(format!("Queue {}", name)))
    }

    /// Queue names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.queues.keys().map(String::as_str).collect()
    }

    pub fn queues(&self) -> impl Iterator<Item = &AdmissionQueue> {
        self.queues.values()
    }

    /// Status of every queue, sorted by name
    pub fn statuses(&self) -> Vec<QueueStatus> {
        self.queues.values().map(AdmissionQueue::status).collect()
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}
