//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use std::time::Duration;

use crate::provider::RetryPolicy;

/// Retry policy with zero backoff — no waiting in tests.
pub fn retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(0),
        timeout: Duration::from_secs(5),
    }
}

/// Retry policy with a short per-attempt timeout, for hung-provider tests
/// under a paused runtime clock.
pub fn retry_with_timeout(max_attempts: u32, timeout: Duration) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(0),
        timeout,
    }
}
