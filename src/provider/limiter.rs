//! Global concurrency gate for provider scrapes.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds how many provider calls run simultaneously across a whole
/// aggregation run.
///
/// Providers are distinct hosts, but they share egress capacity (the proxy
/// pool), so the bound is global rather than per-provider. Admission is
/// strictly in submission order - tokio's semaphore queues waiters FIFO -
/// with no priority and no revocation of queued work.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyLimiter {
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Wait for a slot. The returned permit releases the slot on drop.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .expect("scrape semaphore is never closed")
    }
}
