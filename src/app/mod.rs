//! Application wiring: the aggregation orchestrator and the analysis
//! service exposed to callers.

mod orchestrator;
mod service;

pub use orchestrator::ScrapeOrchestrator;
pub use service::AnalysisService;

use std::sync::Arc;

use crate::config::Config;
use crate::provider::{AvmProvider, ConcurrencyLimiter, WindowLimiter};
use crate::store::PropertyStore;

/// Assemble the analysis service from configuration, a provider set, and a
/// storage backend.
pub fn build_service(
    config: &Config,
    providers: Vec<Arc<dyn AvmProvider>>,
    store: Arc<dyn PropertyStore>,
) -> AnalysisService {
    let limiter = ConcurrencyLimiter::new(config.aggregation.max_concurrent_scrapes);
    let rate = Arc::new(WindowLimiter::new(
        config.rate_limit.max_requests,
        config.rate_limit.window(),
    ));
    let orchestrator = ScrapeOrchestrator::new(
        providers,
        limiter,
        rate,
        config.aggregation.retry_policy(),
        store.clone(),
    );
    AnalysisService::new(orchestrator, store, config.reconciler())
}
