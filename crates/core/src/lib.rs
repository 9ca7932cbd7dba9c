// Throttle Core - Admission Control, Retry & Status
// NO subscriber setup, NO CLI - composition happens in the cli crate

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{AdmissionQueue, QueueRegistry, QueueStatus, RegistryConfig, RetryPolicy};
pub use domain::{QueueConfig, QueueError, QueueEvent, Snapshot, WorkState};
pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
