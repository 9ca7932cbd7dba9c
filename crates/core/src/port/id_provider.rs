// ID Provider Port (for deterministic testing)

/// ID provider interface (allows deterministic IDs in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a new unique work item ID
    fn generate_id(&self) -> String;
}

/// UUID v4 provider (production)
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Produces item-1, item-2, ...
    #[derive(Default)]
    pub struct SequentialIdProvider {
        counter: AtomicU64,
    }
    impl SequentialIdProvider {
        pub fn new() -> Self {
            Self::default()
        }
    }
    impl IdProvider for SequentialIdProvider {
        fn generate_id(&self) -> String {
            let next = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            format!("item-{}", next)
        }
    }
}
