// Domain Layer - Work items, queue configuration, events

pub mod error;
pub mod event;
pub mod queue;
pub mod work_item;

// Re-exports
pub use error::QueueError;
pub use event::QueueEvent;
pub use queue::{QueueConfig, QueueId};
pub use work_item::{Snapshot, WorkItemId, WorkRecord, WorkState, DEFAULT_LABEL};
