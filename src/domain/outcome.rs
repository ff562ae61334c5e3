//! Terminal per-provider scrape outcomes.

use serde::Serialize;

use super::{ProviderId, ProviderPayload};

/// The terminal result of one provider's (possibly retried) scrape within
/// one aggregation run.
///
/// Created fresh per run per provider and immutable once produced; never
/// persisted directly (only the derived estimates are). `payload` is present
/// iff the scrape succeeded, `failure_reason` iff it did not - the
/// constructors are the only way to build one, so the invariant holds.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderOutcome {
    pub provider: ProviderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<ProviderPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Attempts consumed, 1..=max_attempts.
    pub attempts: u32,
    /// Wall-clock duration of the whole retry sequence.
    pub elapsed_ms: u64,
}

impl ProviderOutcome {
    pub fn success(
        provider: ProviderId,
        payload: ProviderPayload,
        attempts: u32,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            provider,
            payload: Some(payload),
            failure_reason: None,
            attempts,
            elapsed_ms,
        }
    }

    pub fn failure(
        provider: ProviderId,
        reason: impl Into<String>,
        attempts: u32,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            provider,
            payload: None,
            failure_reason: Some(reason.into()),
            attempts,
            elapsed_ms,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.payload.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn success_has_payload_and_no_reason() {
        let outcome = ProviderOutcome::success(
            ProviderId::new("zillow"),
            ProviderPayload::new(dec!(300000)),
            1,
            420,
        );
        assert!(outcome.succeeded());
        assert!(outcome.failure_reason.is_none());
    }

    #[test]
    fn failure_has_reason_and_no_payload() {
        let outcome =
            ProviderOutcome::failure(ProviderId::new("movoto"), "scrape timed out", 2, 8000);
        assert!(!outcome.succeeded());
        assert!(outcome.payload.is_none());
        assert_eq!(outcome.failure_reason.as_deref(), Some("scrape timed out"));
    }
}
