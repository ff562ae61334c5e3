//! Persistence layer with pluggable storage backends.
//!
//! The store is an external collaborator: an opaque property/estimate
//! keyspace behind save/fetch operations. Each upsert is atomic per key;
//! no transaction ever spans providers.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{AvmEstimate, NormalizedAddress, PropertyId};
use crate::error::StoreError;

/// A property known to the store.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyRecord {
    pub id: PropertyId,
    pub address: NormalizedAddress,
    pub created_at: DateTime<Utc>,
}

/// Storage operations for properties and their current estimates.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Create or refresh the property row; idempotent on the normalized
    /// address components.
    async fn upsert_property(&self, address: &NormalizedAddress)
        -> Result<PropertyId, StoreError>;

    /// Create-or-replace-current semantics keyed by (property, provider).
    async fn upsert_estimate(
        &self,
        property: &PropertyId,
        estimate: AvmEstimate,
    ) -> Result<(), StoreError>;

    /// Current estimates for the property, most recently updated first.
    async fn list_estimates(&self, property: &PropertyId) -> Result<Vec<AvmEstimate>, StoreError>;

    /// Look up a property; `None` when unknown.
    async fn property(&self, id: &PropertyId) -> Result<Option<PropertyRecord>, StoreError>;
}
