//! The externally visible result of one analysis run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{AvmEstimate, NormalizedAddress, PropertyId, ProviderId, ProviderOutcome};

/// Min/max over the valid estimate values, exact and unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EstimateRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl EstimateRange {
    pub const ZERO: Self = Self {
        min: Decimal::ZERO,
        max: Decimal::ZERO,
    };
}

/// Confidence figures: per-provider values plus the agreement-discounted
/// overall number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceReport {
    pub overall: u8,
    pub by_provider: BTreeMap<ProviderId, u8>,
}

impl ConfidenceReport {
    pub fn zero() -> Self {
        Self {
            overall: 0,
            by_provider: BTreeMap::new(),
        }
    }
}

/// Reconciled statistics over a property's current estimates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledStats {
    /// Arithmetic mean of valid estimates, rounded to the nearest unit.
    pub average_estimate: i64,
    pub estimate_range: EstimateRange,
    pub confidence: ConfidenceReport,
    /// Mean of the valid estimates' monthly rent figures, where present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rent: Option<Decimal>,
}

impl ReconciledStats {
    /// The degenerate result when no valid estimate exists.
    pub fn degenerate() -> Self {
        Self {
            average_estimate: 0,
            estimate_range: EstimateRange::ZERO,
            confidence: ConfidenceReport::zero(),
            average_rent: None,
        }
    }
}

/// Everything a caller learns from one analysis request. Transient:
/// recomputed on every request, never persisted as a unit.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateAnalysis {
    pub property_id: PropertyId,
    pub address: NormalizedAddress,
    /// Current estimates on record, most recently updated first.
    pub estimates: Vec<AvmEstimate>,
    pub average_estimate: i64,
    pub estimate_range: EstimateRange,
    pub confidence: ConfidenceReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rent: Option<Decimal>,
    /// Raw per-provider outcomes of the live run; empty when the analysis
    /// was recomputed from storage without scraping.
    pub outcomes: BTreeMap<ProviderId, ProviderOutcome>,
    pub generated_at: DateTime<Utc>,
}

impl AggregateAnalysis {
    pub fn new(
        property_id: PropertyId,
        address: NormalizedAddress,
        estimates: Vec<AvmEstimate>,
        stats: ReconciledStats,
        outcomes: BTreeMap<ProviderId, ProviderOutcome>,
    ) -> Self {
        Self {
            property_id,
            address,
            estimates,
            average_estimate: stats.average_estimate,
            estimate_range: stats.estimate_range,
            confidence: stats.confidence,
            average_rent: stats.average_rent,
            outcomes,
            generated_at: Utc::now(),
        }
    }
}
