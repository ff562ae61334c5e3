//! Aggregation orchestration: limiter-guarded fan-out across providers.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{AvmEstimate, NormalizedAddress, PropertyId, ProviderId, ProviderOutcome};
use crate::error::{Error, Result};
use crate::provider::{AvmProvider, ConcurrencyLimiter, RetryPolicy, WindowLimiter};
use crate::store::PropertyStore;

/// Fans one aggregation run out to every configured provider and joins on
/// all of them.
///
/// The run never aborts early because one provider failed or stalled: each
/// task is bounded independently by the retry controller's per-attempt
/// timeout, and the join waits for every task to reach a terminal state.
pub struct ScrapeOrchestrator {
    providers: Vec<Arc<dyn AvmProvider>>,
    limiter: ConcurrencyLimiter,
    rate: Arc<WindowLimiter>,
    retry: RetryPolicy,
    store: Arc<dyn PropertyStore>,
}

impl ScrapeOrchestrator {
    pub fn new(
        providers: Vec<Arc<dyn AvmProvider>>,
        limiter: ConcurrencyLimiter,
        rate: Arc<WindowLimiter>,
        retry: RetryPolicy,
        store: Arc<dyn PropertyStore>,
    ) -> Self {
        Self {
            providers,
            limiter,
            rate,
            retry,
            store,
        }
    }

    /// Scrape every configured provider for the property.
    ///
    /// Returns exactly one outcome per provider regardless of individual
    /// success or failure. Each successful outcome upserts its estimate
    /// before the join returns, so partial results stay durable even if a
    /// later stage fails. Errs with [`Error::NoSourceIdentified`] only when
    /// no provider produced a successful extraction.
    pub async fn scrape_all(
        &self,
        property_id: &PropertyId,
        address: &NormalizedAddress,
    ) -> Result<BTreeMap<ProviderId, ProviderOutcome>> {
        let tasks = self.providers.iter().map(|provider| {
            let provider = provider.clone();
            async move {
                // tasks queue here in submission order; completion order is
                // up to the network
                let _permit = self.limiter.acquire().await;
                let outcome = self
                    .retry
                    .execute(provider.as_ref(), address, Some(&self.rate))
                    .await;

                if let Some(payload) = &outcome.payload {
                    let estimate = AvmEstimate::from_payload(outcome.provider.clone(), payload);
                    if let Err(error) = self.store.upsert_estimate(property_id, estimate).await {
                        // durability is best-effort per provider; siblings
                        // keep running and the outcome stays successful
                        warn!(
                            provider = %outcome.provider,
                            error = %error,
                            "failed to persist estimate"
                        );
                    }
                }

                (outcome.provider.clone(), outcome)
            }
        });

        let outcomes: BTreeMap<ProviderId, ProviderOutcome> =
            futures_util::future::join_all(tasks).await.into_iter().collect();

        let succeeded = outcomes.values().filter(|o| o.succeeded()).count();
        info!(
            providers = outcomes.len(),
            succeeded,
            address = %address,
            "aggregation run settled"
        );

        if succeeded == 0 {
            return Err(Error::NoSourceIdentified {
                address: address.to_string(),
            });
        }

        Ok(outcomes)
    }
}
