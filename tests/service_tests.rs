//! End-to-end analysis service tests: live runs, stored-only reads, and
//! the reconciliation wired through real configuration.

use std::sync::Arc;

use rust_decimal_macros::dec;
use valorem::app::{build_service, AnalysisService};
use valorem::config::Config;
use valorem::domain::{NormalizedAddress, PropertyId, ProviderId};
use valorem::error::Error;
use valorem::provider::AvmProvider;
use valorem::store::{MemoryStore, PropertyStore};
use valorem::testkit::provider::{payload, ScriptedProvider, StaticProvider};

fn address() -> NormalizedAddress {
    NormalizedAddress::new("1841 Marks Ave", "Akron", "OH", "44305")
}

fn fast_config() -> Config {
    let mut config = Config::default();
    config.aggregation.base_backoff_ms = 0;
    config
}

fn service(providers: Vec<Arc<dyn AvmProvider>>, store: Arc<MemoryStore>) -> AnalysisService {
    build_service(&fast_config(), providers, store)
}

fn worked_example_providers() -> Vec<Arc<dyn AvmProvider>> {
    vec![
        Arc::new(StaticProvider::new(
            "zillow",
            payload(300_000).with_confidence(80),
        )),
        Arc::new(StaticProvider::new(
            "redfin",
            payload(310_000).with_confidence(85),
        )),
        Arc::new(StaticProvider::new(
            "homes",
            payload(290_000).with_confidence(70),
        )),
    ]
}

#[tokio::test]
async fn fresh_analysis_reconciles_the_worked_example() {
    let store = Arc::new(MemoryStore::new());
    let service = service(worked_example_providers(), store.clone());

    let analysis = service.analyze_property(&address()).await.unwrap();

    assert_eq!(analysis.property_id, address().property_id());
    assert_eq!(analysis.average_estimate, 300_000);
    assert_eq!(analysis.estimate_range.min, dec!(290000));
    assert_eq!(analysis.estimate_range.max, dec!(310000));
    assert_eq!(analysis.confidence.overall, 76);
    assert_eq!(analysis.estimates.len(), 3);
    assert_eq!(analysis.outcomes.len(), 3);
    assert!(analysis.outcomes.values().all(|o| o.succeeded()));
}

#[tokio::test]
async fn estimates_are_durable_after_the_run() {
    let store = Arc::new(MemoryStore::new());
    let service = service(worked_example_providers(), store.clone());

    let analysis = service.analyze_property(&address()).await.unwrap();

    let stored = store.list_estimates(&analysis.property_id).await.unwrap();
    assert_eq!(stored.len(), 3);
}

#[tokio::test]
async fn stored_analysis_reconciles_without_scraping() {
    let store = Arc::new(MemoryStore::new());
    let service = service(worked_example_providers(), store.clone());

    let fresh = service.analyze_property(&address()).await.unwrap();
    let stored = service
        .property_analysis(&fresh.property_id)
        .await
        .unwrap()
        .expect("property should be known after a fresh run");

    assert_eq!(stored.average_estimate, fresh.average_estimate);
    assert_eq!(stored.confidence.overall, fresh.confidence.overall);
    assert!(stored.outcomes.is_empty());
}

#[tokio::test]
async fn unknown_property_reads_as_none() {
    let store = Arc::new(MemoryStore::new());
    let service = service(worked_example_providers(), store);

    let result = service
        .property_analysis(&PropertyId::new("0000feedbeef0000"))
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn run_with_zero_successes_is_the_distinct_run_level_error() {
    let store = Arc::new(MemoryStore::new());
    let providers: Vec<Arc<dyn AvmProvider>> = vec![
        Arc::new(ScriptedProvider::new("zillow")),
        Arc::new(ScriptedProvider::new("redfin")),
        Arc::new(ScriptedProvider::new("homes")),
    ];
    let service = service(providers, store);

    let result = service.analyze_property(&address()).await;

    match result {
        Err(Error::NoSourceIdentified { address }) => {
            assert!(address.contains("1841 Marks Ave"));
        }
        other => panic!("expected NoSourceIdentified, got {other:?}"),
    }
}

#[tokio::test]
async fn out_of_range_estimates_reconcile_to_the_degenerate_result() {
    let store = Arc::new(MemoryStore::new());
    // scrape succeeds, but the value is above the sanity ceiling
    let providers: Vec<Arc<dyn AvmProvider>> =
        vec![Arc::new(StaticProvider::new("zillow", payload(60_000_000)))];
    let service = service(providers, store);

    let analysis = service.analyze_property(&address()).await.unwrap();

    assert_eq!(analysis.average_estimate, 0);
    assert_eq!(analysis.estimate_range.min, dec!(0));
    assert_eq!(analysis.estimate_range.max, dec!(0));
    assert_eq!(analysis.confidence.overall, 0);
    assert!(analysis.confidence.by_provider.is_empty());
    // the outcome itself is still a success; exclusion is statistical
    assert!(analysis.outcomes[&ProviderId::new("zillow")].succeeded());
}

#[tokio::test]
async fn reanalysis_supersedes_the_previous_estimate() {
    let store = Arc::new(MemoryStore::new());
    let scripted = ScriptedProvider::new("zillow")
        .then_ok(payload(300_000))
        .then_ok(payload(325_000));
    let providers: Vec<Arc<dyn AvmProvider>> = vec![Arc::new(scripted)];
    let service = service(providers, store.clone());

    let first = service.analyze_property(&address()).await.unwrap();
    assert_eq!(first.average_estimate, 300_000);

    let second = service.analyze_property(&address()).await.unwrap();
    assert_eq!(second.average_estimate, 325_000);
    assert_eq!(second.estimates.len(), 1);

    let stored = store.list_estimates(&second.property_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].estimate, dec!(325000));
}

#[tokio::test]
async fn unconfigured_provider_contributes_the_fallback_confidence() {
    let store = Arc::new(MemoryStore::new());
    // no recorded confidence and not in the reliability table
    let providers: Vec<Arc<dyn AvmProvider>> =
        vec![Arc::new(StaticProvider::new("trulia", payload(250_000)))];
    let service = service(providers, store);

    let analysis = service.analyze_property(&address()).await.unwrap();

    assert_eq!(
        analysis.confidence.by_provider.get(&ProviderId::new("trulia")),
        Some(&65)
    );
    assert_eq!(analysis.confidence.overall, 65);
}
