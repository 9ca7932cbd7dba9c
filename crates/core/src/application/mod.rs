// Application Layer - Admission control, retry, status and registry

pub mod constants;
pub mod queue;
pub mod registry;
pub mod retry;
pub mod status;

// Re-exports
pub use queue::AdmissionQueue;
pub use registry::{QueueRegistry, RegistryConfig};
pub use retry::{RetryDecision, RetryPolicy};
pub use status::QueueStatus;
