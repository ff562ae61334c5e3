//! Bounded retry with linear backoff around a single provider call.

use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{AvmProvider, WindowLimiter};
use crate::domain::{NormalizedAddress, ProviderOutcome, ProviderPayload};
use crate::error::ProviderError;

/// Retry configuration for one provider call.
///
/// On failure the controller waits `base_delay x attempt_number` before the
/// next attempt (linear backoff), stopping on the first success. A call
/// exceeding `timeout` counts as a failed attempt and consumes a retry, so
/// a hung source can never stall the run's join point.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_millis(2000),
            timeout: Duration::from_millis(30_000),
        }
    }
}

impl RetryPolicy {
    /// Drive one provider to a terminal outcome.
    ///
    /// Never returns an error: failures, timeouts, and rejected payloads are
    /// all folded into a failed [`ProviderOutcome`] once attempts run out.
    /// When a rate limiter is supplied, each attempt waits for admission
    /// before touching the source.
    pub async fn execute(
        &self,
        provider: &dyn AvmProvider,
        address: &NormalizedAddress,
        rate: Option<&WindowLimiter>,
    ) -> ProviderOutcome {
        let id = provider.id();
        let started = Instant::now();
        let mut last_failure = String::new();

        for attempt in 1..=self.max_attempts.max(1) {
            if let Some(rate) = rate {
                rate.admit().await;
            }

            let result = tokio::time::timeout(self.timeout, provider.scrape_avm(address)).await;

            match result {
                Ok(Ok(payload)) => match validate(payload) {
                    Ok(payload) => {
                        debug!(provider = %id, attempt, "scrape succeeded");
                        return ProviderOutcome::success(
                            id,
                            payload,
                            attempt,
                            started.elapsed().as_millis() as u64,
                        );
                    }
                    Err(reason) => {
                        warn!(provider = %id, attempt, %reason, "scrape payload rejected");
                        last_failure = reason.to_string();
                    }
                },
                Ok(Err(error)) => {
                    warn!(provider = %id, attempt, error = %error, "scrape attempt failed");
                    last_failure = error.to_string();
                }
                Err(_) => {
                    let reason = ProviderError::Timeout {
                        elapsed_ms: self.timeout.as_millis() as u64,
                    };
                    warn!(provider = %id, attempt, error = %reason, "scrape attempt timed out");
                    last_failure = reason.to_string();
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.base_delay * attempt).await;
            }
        }

        ProviderOutcome::failure(
            id,
            last_failure,
            self.max_attempts.max(1),
            started.elapsed().as_millis() as u64,
        )
    }
}

/// Reject payloads that would poison the statistics downstream.
fn validate(payload: ProviderPayload) -> Result<ProviderPayload, ProviderError> {
    if payload.estimate <= Decimal::ZERO {
        return Err(ProviderError::InvalidPayload(format!(
            "non-positive estimate {}",
            payload.estimate
        )));
    }
    Ok(payload)
}
