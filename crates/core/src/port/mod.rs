// Port Layer - Interfaces for clocks, IDs and observability

pub mod event_sink;
pub mod id_provider; // For deterministic testing
pub mod time_provider;

// Re-exports
pub use event_sink::{EventSink, NoopEventSink, TracingEventSink};
pub use id_provider::{IdProvider, UuidProvider};
pub use time_provider::{SystemTimeProvider, TimeProvider};
