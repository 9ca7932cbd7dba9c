// Application constants (No magic values)
use std::time::Duration;

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry (1000ms = 1s)
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Environment variable listing queues as `name=max_concurrent,...`
pub const QUEUES_ENV: &str = "THROTTLE_QUEUES";

/// Environment variable overriding the recent-completion buffer size
pub const HISTORY_CAPACITY_ENV: &str = "THROTTLE_HISTORY_CAPACITY";

/// Queues built when nothing is configured: general backend calls plus a
/// single-slot lane for the rate-limited document renderer
pub const DEFAULT_QUEUES: &str = "backend=3,pdf=1";
