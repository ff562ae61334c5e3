//! Valuation estimate types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProviderId;

/// The minimal structural contract a provider extraction must satisfy.
///
/// Providers surface whatever fields they can; only `estimate` is required,
/// and the retry controller rejects payloads without a positive one rather
/// than letting undefined-shaped data reach the statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderPayload {
    /// Point estimate of market value, in currency units.
    pub estimate: Decimal,
    /// Provider-reported confidence, 0-100, when the source exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_range: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_range: Option<Decimal>,
    /// Monthly rent estimate, when the source exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_estimate: Option<Decimal>,
}

impl ProviderPayload {
    pub fn new(estimate: Decimal) -> Self {
        Self {
            estimate,
            confidence: None,
            low_range: None,
            high_range: None,
            rent_estimate: None,
        }
    }

    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_range(mut self, low: Decimal, high: Decimal) -> Self {
        self.low_range = Some(low);
        self.high_range = Some(high);
        self
    }

    pub fn with_rent(mut self, rent: Decimal) -> Self {
        self.rent_estimate = Some(rent);
        self
    }
}

/// A single provider's current valuation for a property.
///
/// At most one per (property, provider) pair: upserts supersede, never
/// accumulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvmEstimate {
    pub provider: ProviderId,
    pub estimate: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_range: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_range: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_estimate: Option<Decimal>,
    pub last_updated: DateTime<Utc>,
}

impl AvmEstimate {
    /// Build the durable estimate from a fresh scrape payload.
    pub fn from_payload(provider: ProviderId, payload: &ProviderPayload) -> Self {
        Self {
            provider,
            estimate: payload.estimate,
            confidence: payload.confidence,
            low_range: payload.low_range,
            high_range: payload.high_range,
            rent_estimate: payload.rent_estimate,
            last_updated: Utc::now(),
        }
    }
}
