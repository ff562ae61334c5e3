//! Analysis service: the assembler joining scrape outcomes, stored
//! estimates, and reconciled statistics into the externally consumed result.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use super::ScrapeOrchestrator;
use crate::domain::{
    AggregateAnalysis, AvmEstimate, NormalizedAddress, PropertyId, Reconciler,
};
use crate::error::Result;
use crate::store::PropertyStore;

/// Entry point consumed by the web/API layer and the CLI.
pub struct AnalysisService {
    orchestrator: ScrapeOrchestrator,
    store: Arc<dyn PropertyStore>,
    reconciler: Reconciler,
}

impl AnalysisService {
    pub fn new(
        orchestrator: ScrapeOrchestrator,
        store: Arc<dyn PropertyStore>,
        reconciler: Reconciler,
    ) -> Self {
        Self {
            orchestrator,
            store,
            reconciler,
        }
    }

    /// Run a full live scrape-and-reconcile cycle for an address.
    ///
    /// Fails with [`Error::NoSourceIdentified`](crate::error::Error::NoSourceIdentified)
    /// when every provider came up empty; any other provider trouble shows
    /// up in the per-provider outcomes, not as an error.
    pub async fn analyze_property(
        &self,
        address: &NormalizedAddress,
    ) -> Result<AggregateAnalysis> {
        // the property row anchors every estimate upsert, so this write is
        // the one store failure that aborts the run
        let property_id = self.store.upsert_property(address).await?;

        let outcomes = self.orchestrator.scrape_all(&property_id, address).await?;

        let estimates = self.stored_estimates(&property_id).await;
        let stats = self.reconciler.reconcile(&estimates);

        Ok(AggregateAnalysis::new(
            property_id,
            address.clone(),
            estimates,
            stats,
            outcomes,
        ))
    }

    /// Recompute the analysis from whatever is currently stored, without
    /// touching the network. `None` when the property is unknown.
    pub async fn property_analysis(
        &self,
        property_id: &PropertyId,
    ) -> Result<Option<AggregateAnalysis>> {
        let record = match self.store.property(property_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(None),
            Err(error) => {
                warn!(property = %property_id, error = %error, "property lookup failed");
                return Ok(None);
            }
        };

        let estimates = self.stored_estimates(property_id).await;
        let stats = self.reconciler.reconcile(&estimates);

        Ok(Some(AggregateAnalysis::new(
            record.id,
            record.address,
            estimates,
            stats,
            BTreeMap::new(),
        )))
    }

    /// Read the current estimate set, degrading a failed read to an empty
    /// list (which reconciles to the degenerate zero-confidence result)
    /// rather than failing the analysis.
    async fn stored_estimates(&self, property_id: &PropertyId) -> Vec<AvmEstimate> {
        match self.store.list_estimates(property_id).await {
            Ok(estimates) => estimates,
            Err(error) => {
                warn!(property = %property_id, error = %error, "estimate read failed");
                Vec::new()
            }
        }
    }
}
