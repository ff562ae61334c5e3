//! Provider abstraction layer.
//!
//! Defines the capability trait an AVM data source must fulfill, plus the
//! machinery every source is driven through: bounded retries with linear
//! backoff, a global concurrency gate, and a windowed rate limiter.

mod dataset;
mod limiter;
mod rate;
mod retry;

pub use dataset::{DatasetProvider, DatasetProviderBuilder};
pub use limiter::ConcurrencyLimiter;
pub use rate::{Clock, SystemClock, WindowLimiter};
pub use retry::RetryPolicy;

use async_trait::async_trait;

use crate::domain::{NormalizedAddress, ProviderId, ProviderPayload};
use crate::error::ProviderError;

/// A single external AVM data source.
///
/// Implementations are stateless service objects: one instance per
/// configured source, freely shareable across runs. They report errors
/// through the `Result` - the retry controller converts anything that
/// escapes into a failed outcome, so a misbehaving source can never abort
/// an aggregation run.
#[async_trait]
pub trait AvmProvider: Send + Sync {
    /// Identifier unique among the configured sources.
    fn id(&self) -> ProviderId;

    /// Fetch this source's valuation for the property, within the source's
    /// own bounded I/O. The returned payload must carry a usable estimate;
    /// sources with nothing to report return [`ProviderError::NoData`].
    async fn scrape_avm(
        &self,
        address: &NormalizedAddress,
    ) -> Result<ProviderPayload, ProviderError>;
}
