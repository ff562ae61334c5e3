//! Windowed rate limiting with an injected clock.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::trace;

/// Time source for the limiter. Injectable so tests drive the window
/// deterministically instead of sleeping through it.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug)]
struct Window {
    started: Instant,
    admitted: u32,
}

/// Admits at most `max_requests` operations per rolling window.
///
/// Owned by the orchestrator and applied around each provider attempt; a
/// full window parks the caller until it rolls over.
pub struct WindowLimiter {
    max_requests: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<Window>,
}

impl WindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::with_clock(max_requests, window, Arc::new(SystemClock))
    }

    pub fn with_clock(max_requests: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        let started = clock.now();
        Self {
            max_requests,
            window,
            clock,
            state: Mutex::new(Window {
                started,
                admitted: 0,
            }),
        }
    }

    /// Try to take an admission slot in the current window.
    pub fn try_admit(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();

        if now.saturating_duration_since(state.started) >= self.window {
            state.started = now;
            state.admitted = 0;
        }

        if state.admitted < self.max_requests {
            state.admitted += 1;
            true
        } else {
            false
        }
    }

    /// Wait until an admission slot is available.
    pub async fn admit(&self) {
        loop {
            if self.try_admit() {
                return;
            }
            let wait = self.time_until_rollover().max(Duration::from_millis(1));
            trace!(wait_ms = wait.as_millis() as u64, "rate window full, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    fn time_until_rollover(&self) -> Duration {
        let now = self.clock.now();
        let state = self.state.lock();
        (state.started + self.window).saturating_duration_since(now)
    }
}

impl std::fmt::Debug for WindowLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowLimiter")
            .field("max_requests", &self.max_requests)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
