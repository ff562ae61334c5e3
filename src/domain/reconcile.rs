//! Statistical reconciliation of divergent provider estimates.
//!
//! A naive average of provider estimates is misleading when providers wildly
//! disagree: one source reporting half the market value of another signals
//! unreliable data, not precision. The headline confidence number is
//! therefore discounted by the coefficient of variation across sources, so
//! it reflects agreement and not just average source trust.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use super::{AvmEstimate, ConfidenceReport, EstimateRange, ProviderId, ReconciledStats};

/// Confidence never drops below half strength no matter how much providers
/// disagree, and is never amplified above 1x.
const CONSISTENCY_FLOOR: f64 = 0.5;

/// Default-confidence table for estimates whose provider did not report one.
///
/// Values reflect observed source reliability, the big aggregators first.
#[derive(Debug, Clone)]
pub struct ReliabilityTable {
    providers: BTreeMap<ProviderId, u8>,
    /// Applied to any provider absent from the table.
    fallback: u8,
}

fn default_provider_confidence() -> BTreeMap<ProviderId, u8> {
    BTreeMap::from([
        (ProviderId::new("zillow"), 85),
        (ProviderId::new("redfin"), 80),
        (ProviderId::new("realtor"), 75),
        (ProviderId::new("homes"), 70),
        (ProviderId::new("movoto"), 65),
    ])
}

fn default_fallback_confidence() -> u8 {
    65
}

impl Default for ReliabilityTable {
    fn default() -> Self {
        Self {
            providers: default_provider_confidence(),
            fallback: default_fallback_confidence(),
        }
    }
}

impl ReliabilityTable {
    pub fn new(providers: BTreeMap<ProviderId, u8>, fallback: u8) -> Self {
        Self {
            providers,
            fallback,
        }
    }

    /// Replace the fallback applied to unlisted providers.
    pub fn with_fallback(mut self, fallback: u8) -> Self {
        self.fallback = fallback;
        self
    }

    /// Default confidence for a provider with no recorded value.
    pub fn confidence_for(&self, provider: &ProviderId) -> u8 {
        self.providers.get(provider).copied().unwrap_or(self.fallback)
    }

    /// Providers in descending reliability order, name-ordered on ties.
    ///
    /// The canonical precedence for any "pick one source" decision -
    /// deliberately independent of map iteration or completion order.
    pub fn precedence(&self) -> Vec<ProviderId> {
        let mut ordered: Vec<_> = self.providers.iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        ordered.into_iter().map(|(id, _)| id.clone()).collect()
    }
}

/// Reconciliation engine: turns the stored estimate set into one aggregate.
#[derive(Debug, Clone)]
pub struct Reconciler {
    /// Estimates at or above this are data-quality noise, not valuations.
    ceiling: Decimal,
    table: ReliabilityTable,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self {
            ceiling: Decimal::from(50_000_000u32),
            table: ReliabilityTable::default(),
        }
    }
}

impl Reconciler {
    pub fn new(ceiling: Decimal, table: ReliabilityTable) -> Self {
        Self { ceiling, table }
    }

    pub fn table(&self) -> &ReliabilityTable {
        &self.table
    }

    /// True when the estimate may participate in statistics.
    pub fn is_valid(&self, estimate: &AvmEstimate) -> bool {
        estimate.estimate > Decimal::ZERO && estimate.estimate < self.ceiling
    }

    /// Reconcile the full stored estimate set for a property.
    ///
    /// Operates over everything currently on record, not just a single run's
    /// fresh results, so a property with only some providers re-scraped
    /// still gets a sensible aggregate.
    pub fn reconcile(&self, estimates: &[AvmEstimate]) -> ReconciledStats {
        let valid: Vec<&AvmEstimate> = estimates
            .iter()
            .filter(|e| {
                let ok = self.is_valid(e);
                if !ok {
                    debug!(
                        provider = %e.provider,
                        estimate = %e.estimate,
                        "estimate outside valid range, excluded from statistics"
                    );
                }
                ok
            })
            .collect();

        if valid.is_empty() {
            return ReconciledStats::degenerate();
        }

        let count = Decimal::from(valid.len());
        let sum: Decimal = valid.iter().map(|e| e.estimate).sum();
        let average_estimate = (sum / count)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(0);

        let min = valid.iter().map(|e| e.estimate).min().unwrap_or_default();
        let max = valid.iter().map(|e| e.estimate).max().unwrap_or_default();

        let by_provider: BTreeMap<ProviderId, u8> = valid
            .iter()
            .map(|e| {
                let confidence = e
                    .confidence
                    .unwrap_or_else(|| self.table.confidence_for(&e.provider));
                (e.provider.clone(), confidence)
            })
            .collect();

        let raw_overall = valid
            .iter()
            .map(|e| {
                f64::from(
                    e.confidence
                        .unwrap_or_else(|| self.table.confidence_for(&e.provider)),
                )
            })
            .sum::<f64>()
            / valid.len() as f64;

        let multiplier = consistency_multiplier(&valid);
        let overall = (raw_overall * multiplier).round() as u8;

        let rents: Vec<Decimal> = valid.iter().filter_map(|e| e.rent_estimate).collect();
        let average_rent = if rents.is_empty() {
            None
        } else {
            Some(rents.iter().copied().sum::<Decimal>() / Decimal::from(rents.len()))
        };

        ReconciledStats {
            average_estimate,
            estimate_range: EstimateRange { min, max },
            confidence: ConfidenceReport {
                overall,
                by_provider,
            },
            average_rent,
        }
    }
}

/// `max(0.5, 1 - stddev/mean)` over the valid estimate values.
///
/// Population standard deviation: the valid set is the whole population of
/// current estimates, not a sample of one.
fn consistency_multiplier(valid: &[&AvmEstimate]) -> f64 {
    let values: Vec<f64> = valid
        .iter()
        .map(|e| e.estimate.to_f64().unwrap_or(0.0))
        .collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let cov = variance.sqrt() / mean;
    (1.0 - cov).clamp(CONSISTENCY_FLOOR, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn estimate(provider: &str, value: Decimal, confidence: Option<u8>) -> AvmEstimate {
        AvmEstimate {
            provider: ProviderId::new(provider),
            estimate: value,
            confidence,
            low_range: None,
            high_range: None,
            rent_estimate: None,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn reconciles_worked_example() {
        let reconciler = Reconciler::default();
        let estimates = vec![
            estimate("zillow", dec!(300000), Some(80)),
            estimate("redfin", dec!(310000), Some(85)),
            estimate("homes", dec!(290000), Some(70)),
        ];

        let stats = reconciler.reconcile(&estimates);

        assert_eq!(stats.average_estimate, 300000);
        assert_eq!(stats.estimate_range.min, dec!(290000));
        assert_eq!(stats.estimate_range.max, dec!(310000));
        // pre-adjustment mean 78.33; stddev ~8164.97 gives cov ~0.0272,
        // multiplier ~0.9728 and a final round(76.20) = 76
        assert_eq!(stats.confidence.overall, 76);
        assert_eq!(
            stats.confidence.by_provider.get(&ProviderId::new("redfin")),
            Some(&85)
        );
    }

    #[test]
    fn zero_valid_estimates_yield_degenerate_result() {
        let reconciler = Reconciler::default();
        let estimates = vec![
            estimate("zillow", dec!(0), None),
            estimate("redfin", dec!(60000000), Some(90)),
        ];

        let stats = reconciler.reconcile(&estimates);

        assert_eq!(stats.average_estimate, 0);
        assert_eq!(stats.estimate_range, EstimateRange::ZERO);
        assert_eq!(stats.confidence.overall, 0);
        assert!(stats.confidence.by_provider.is_empty());
        assert!(stats.average_rent.is_none());
    }

    #[test]
    fn unlisted_provider_defaults_to_65() {
        let reconciler = Reconciler::default();
        let estimates = vec![estimate("trulia", dec!(250000), None)];

        let stats = reconciler.reconcile(&estimates);

        assert_eq!(
            stats.confidence.by_provider.get(&ProviderId::new("trulia")),
            Some(&65)
        );
        // single estimate: no disagreement, no discount
        assert_eq!(stats.confidence.overall, 65);
    }

    #[test]
    fn recorded_confidence_beats_table_default() {
        let reconciler = Reconciler::default();
        let estimates = vec![estimate("movoto", dec!(250000), Some(95))];

        let stats = reconciler.reconcile(&estimates);

        assert_eq!(
            stats.confidence.by_provider.get(&ProviderId::new("movoto")),
            Some(&95)
        );
    }

    #[test]
    fn extreme_divergence_clamps_multiplier_at_half() {
        let reconciler = Reconciler::default();
        // cov = 400000/500000 = 0.8, so the unclamped multiplier would be 0.2
        let estimates = vec![
            estimate("zillow", dec!(100000), Some(80)),
            estimate("redfin", dec!(900000), Some(80)),
        ];

        let stats = reconciler.reconcile(&estimates);

        assert_eq!(stats.confidence.overall, 40);
    }

    #[test]
    fn single_estimate_keeps_full_confidence() {
        let reconciler = Reconciler::default();
        let estimates = vec![estimate("zillow", dec!(420000), Some(85))];

        let stats = reconciler.reconcile(&estimates);

        assert_eq!(stats.confidence.overall, 85);
        assert_eq!(stats.average_estimate, 420000);
        assert_eq!(stats.estimate_range.min, dec!(420000));
        assert_eq!(stats.estimate_range.max, dec!(420000));
    }

    #[test]
    fn invalid_estimates_are_excluded_not_fatal() {
        let reconciler = Reconciler::default();
        let estimates = vec![
            estimate("zillow", dec!(300000), Some(80)),
            estimate("movoto", dec!(-5), None),
        ];

        let stats = reconciler.reconcile(&estimates);

        assert_eq!(stats.average_estimate, 300000);
        assert!(!stats
            .confidence
            .by_provider
            .contains_key(&ProviderId::new("movoto")));
    }

    #[test]
    fn average_rent_covers_only_estimates_reporting_rent() {
        let reconciler = Reconciler::default();
        let mut with_rent = estimate("zillow", dec!(300000), Some(80));
        with_rent.rent_estimate = Some(dec!(1800));
        let estimates = vec![with_rent, estimate("redfin", dec!(310000), Some(85))];

        let stats = reconciler.reconcile(&estimates);

        assert_eq!(stats.average_rent, Some(dec!(1800)));
    }

    #[test]
    fn precedence_orders_by_reliability_then_name() {
        let table = ReliabilityTable::default();
        let order = table.precedence();
        assert_eq!(
            order,
            vec![
                ProviderId::new("zillow"),
                ProviderId::new("redfin"),
                ProviderId::new("realtor"),
                ProviderId::new("homes"),
                ProviderId::new("movoto"),
            ]
        );
    }
}
