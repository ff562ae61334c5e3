//! In-memory store implementation.
//!
//! Reference backend for tests and single-shot CLI runs; a deployment
//! would swap in a database-backed implementation of [`PropertyStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::{PropertyRecord, PropertyStore};
use crate::domain::{AvmEstimate, NormalizedAddress, PropertyId, ProviderId};
use crate::error::StoreError;

/// In-memory property/estimate store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    properties: RwLock<HashMap<PropertyId, PropertyRecord>>,
    estimates: RwLock<HashMap<PropertyId, HashMap<ProviderId, AvmEstimate>>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PropertyStore for MemoryStore {
    async fn upsert_property(
        &self,
        address: &NormalizedAddress,
    ) -> Result<PropertyId, StoreError> {
        let id = address.property_id();
        self.properties
            .write()
            .entry(id.clone())
            .or_insert_with(|| PropertyRecord {
                id: id.clone(),
                address: address.clone(),
                created_at: Utc::now(),
            });
        Ok(id)
    }

    async fn upsert_estimate(
        &self,
        property: &PropertyId,
        estimate: AvmEstimate,
    ) -> Result<(), StoreError> {
        self.estimates
            .write()
            .entry(property.clone())
            .or_default()
            .insert(estimate.provider.clone(), estimate);
        Ok(())
    }

    async fn list_estimates(&self, property: &PropertyId) -> Result<Vec<AvmEstimate>, StoreError> {
        let estimates = self.estimates.read();
        let mut current: Vec<AvmEstimate> = estimates
            .get(property)
            .map(|per_provider| per_provider.values().cloned().collect())
            .unwrap_or_default();
        current.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(current)
    }

    async fn property(&self, id: &PropertyId) -> Result<Option<PropertyRecord>, StoreError> {
        Ok(self.properties.read().get(id).cloned())
    }
}
