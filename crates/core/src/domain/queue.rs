// Queue Domain Model

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Queue identifier (one per throttling domain)
pub type QueueId = String;

/// Number of snapshots kept in the recent-completion ring buffer
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Longest accepted queue name
pub const MAX_QUEUE_NAME_LEN: usize = 64;

/// Queue configuration, fixed at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    pub name: QueueId,
    pub max_concurrent: usize,
    pub history_capacity: usize,
}

impl QueueConfig {
    pub fn new(name: impl Into<String>, max_concurrent: usize) -> Self {
        Self {
            name: name.into(),
            max_concurrent,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    pub fn with_history_capacity(mut self, history_capacity: usize) -> Self {
        self.history_capacity = history_capacity;
        self
    }

    /// Reject configurations that could never admit work or be named in logs
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(AppError::Validation("Queue name cannot be empty".to_string()));
        }

        if self.name.len() > MAX_QUEUE_NAME_LEN {
            return Err(AppError::Validation(format!(
                "Queue name too long: {} chars (max {})",
                self.name.len(),
                MAX_QUEUE_NAME_LEN
            )));
        }

        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(AppError::Validation(format!(
                "Queue name must be alphanumeric (plus '-', '_', '.'): {}",
                self.name
            )));
        }

        if self.max_concurrent == 0 {
            return Err(AppError::Validation(format!(
                "Queue {} must allow at least one concurrent operation",
                self.name
            )));
        }

        Ok(())
    }
}
