//! Mock [`AvmProvider`] implementations for testing.
//!
//! Three mock provider types for different testing needs:
//!
//! - [`StaticProvider`] — Always succeeds with a fixed payload.
//!   Best for: happy-path orchestration and reconciliation tests.
//!
//! - [`ScriptedProvider`] — Pre-loaded per-call results with an optional
//!   artificial delay. Best for: retry behavior, failure handling, timeout
//!   tests. Fails with `Unavailable` once the script is exhausted, so a
//!   provider with no script is an always-failing provider.
//!
//! - [`SlowProvider`] — Succeeds after a delay while tracking how many
//!   calls were in flight simultaneously. Best for: concurrency-bound
//!   assertions.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::{NormalizedAddress, ProviderId, ProviderPayload};
use crate::error::ProviderError;
use crate::provider::AvmProvider;

/// Shorthand payload with just an estimate.
pub fn payload(estimate: i64) -> ProviderPayload {
    ProviderPayload::new(Decimal::from(estimate))
}

/// A provider that always succeeds with the same payload.
pub struct StaticProvider {
    id: ProviderId,
    payload: ProviderPayload,
}

impl StaticProvider {
    pub fn new(id: impl Into<ProviderId>, payload: ProviderPayload) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

#[async_trait]
impl AvmProvider for StaticProvider {
    fn id(&self) -> ProviderId {
        self.id.clone()
    }

    async fn scrape_avm(
        &self,
        _address: &NormalizedAddress,
    ) -> Result<ProviderPayload, ProviderError> {
        Ok(self.payload.clone())
    }
}

/// A provider with scripted per-call results.
pub struct ScriptedProvider {
    id: ProviderId,
    script: Mutex<VecDeque<Result<ProviderPayload, ProviderError>>>,
    call_delay: Option<Duration>,
    calls: Arc<AtomicU32>,
}

impl ScriptedProvider {
    pub fn new(id: impl Into<ProviderId>) -> Self {
        Self {
            id: id.into(),
            script: Mutex::new(VecDeque::new()),
            call_delay: None,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn then_ok(self, payload: ProviderPayload) -> Self {
        self.script.lock().push_back(Ok(payload));
        self
    }

    pub fn then_err(self, error: ProviderError) -> Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Sleep this long before answering each call.
    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = Some(delay);
        self
    }

    /// How many times the provider was called.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Shared call counter, for asserting across moved providers.
    pub fn call_counter(&self) -> Arc<AtomicU32> {
        self.calls.clone()
    }
}

#[async_trait]
impl AvmProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        self.id.clone()
    }

    async fn scrape_avm(
        &self,
        _address: &NormalizedAddress,
    ) -> Result<ProviderPayload, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.call_delay {
            tokio::time::sleep(delay).await;
        }
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Unavailable("script exhausted".into())))
    }
}

/// A provider that succeeds slowly and records peak concurrency.
pub struct SlowProvider {
    id: ProviderId,
    payload: ProviderPayload,
    delay: Duration,
    in_flight: Arc<AtomicU32>,
    peak: Arc<AtomicU32>,
}

impl SlowProvider {
    /// `in_flight` and `peak` are shared across the provider set so the
    /// test can assert the global bound.
    pub fn new(
        id: impl Into<ProviderId>,
        payload: ProviderPayload,
        delay: Duration,
        in_flight: Arc<AtomicU32>,
        peak: Arc<AtomicU32>,
    ) -> Self {
        Self {
            id: id.into(),
            payload,
            delay,
            in_flight,
            peak,
        }
    }
}

#[async_trait]
impl AvmProvider for SlowProvider {
    fn id(&self) -> ProviderId {
        self.id.clone()
    }

    async fn scrape_avm(
        &self,
        _address: &NormalizedAddress,
    ) -> Result<ProviderPayload, ProviderError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.payload.clone())
    }
}
