// Work Item Domain Model

use serde::{Deserialize, Serialize};

/// Work item ID (UUID v4 in production)
pub type WorkItemId = String;

/// Label used when the caller submits without one
pub const DEFAULT_LABEL: &str = "request";

/// Work item lifecycle: Pending -> Processing -> {Completed | Failed}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl WorkState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkState::Completed | WorkState::Failed)
    }
}

impl std::fmt::Display for WorkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkState::Pending => write!(f, "PENDING"),
            WorkState::Processing => write!(f, "PROCESSING"),
            WorkState::Completed => write!(f, "COMPLETED"),
            WorkState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Immutable point-in-time copy of a work item, safe to hand to any caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: WorkItemId,
    pub label: String,
    pub state: WorkState,
    pub submitted_at: i64, // epoch ms
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub duration_ms: Option<i64>,
    pub error: Option<String>,
}

/// Bookkeeping for one submission (everything except the operation itself)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkRecord {
    pub id: WorkItemId,
    pub label: String,
    pub state: WorkState,
    pub submitted_at: i64,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub error: Option<String>,
}

impl WorkRecord {
    /// Create a pending record with injected ID and timestamp
    ///
    /// A blank label falls back to [`DEFAULT_LABEL`].
    pub fn new(id: impl Into<String>, label: impl Into<String>, submitted_at: i64) -> Self {
        let label = label.into();
        let label = if label.trim().is_empty() {
            DEFAULT_LABEL.to_string()
        } else {
            label
        };

        Self {
            id: id.into(),
            label,
            state: WorkState::Pending,
            submitted_at,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    /// Transition to Processing with explicit timestamp
    pub fn start(&mut self, now_millis: i64) {
        debug_assert_eq!(self.state, WorkState::Pending);
        self.state = WorkState::Processing;
        self.started_at = Some(now_millis);
    }

    /// Transition to Completed with explicit timestamp
    pub fn complete(&mut self, now_millis: i64) {
        debug_assert_eq!(self.state, WorkState::Processing);
        self.state = WorkState::Completed;
        self.finished_at = Some(now_millis);
    }

    /// Transition to Failed with explicit timestamp
    pub fn fail(&mut self, now_millis: i64, error: impl Into<String>) {
        debug_assert_eq!(self.state, WorkState::Processing);
        self.state = WorkState::Failed;
        self.finished_at = Some(now_millis);
        self.error = Some(error.into());
    }

    /// Time spent executing, once both ends are known
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(started), Some(finished)) => Some((finished - started).max(0)),
            _ => None,
        }
    }

    /// Time spent waiting in the pending queue
    pub fn waited_ms(&self) -> Option<i64> {
        self.started_at
            .map(|started| (started - self.submitted_at).max(0))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            id: self.id.clone(),
            label: self.label.clone(),
            state: self.state,
            submitted_at: self.submitted_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            duration_ms: self.duration_ms(),
            error: self.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_pending() {
        let record = WorkRecord::new("item-1", "fetch profile", 1000);

        assert_eq!(record.state, WorkState::Pending);
        assert_eq!(record.label, "fetch profile");
        assert_eq!(record.started_at, None);
        assert_eq!(record.finished_at, None);
        assert_eq!(record.duration_ms(), None);
    }

    #[test]
    fn test_blank_label_uses_default() {
        let record = WorkRecord::new("item-1", "   ", 1000);
        assert_eq!(record.label, DEFAULT_LABEL);
    }

    #[test]
    fn test_complete_lifecycle_timestamps() {
        let mut record = WorkRecord::new("item-1", "upload", 1000);
        record.start(1250);
        record.complete(1600);

        assert_eq!(record.state, WorkState::Completed);
        assert_eq!(record.waited_ms(), Some(250));
        assert_eq!(record.duration_ms(), Some(350));
        assert!(record.state.is_terminal());
    }

    #[test]
    fn test_failed_snapshot_carries_error() {
        let mut record = WorkRecord::new("item-2", "render pdf", 0);
        record.start(10);
        record.fail(40, "upstream returned 503");

        let snapshot = record.snapshot();
        assert_eq!(snapshot.state, WorkState::Failed);
        assert_eq!(snapshot.duration_ms, Some(30));
        assert_eq!(snapshot.error.as_deref(), Some("upstream returned 503"));
    }

    #[test]
    fn test_state_serializes_screaming_case() {
        let json = serde_json::to_string(&WorkState::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");
        assert_eq!(WorkState::Failed.to_string(), "FAILED");
    }
}
