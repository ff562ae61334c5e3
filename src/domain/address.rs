//! Normalized street addresses and stable property identity.
//!
//! Address-string normalization (regex heuristics over free-form input)
//! happens upstream; this type only carries the already-split components
//! and derives the identity used to key storage.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::PropertyId;

/// A street address split into its components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl NormalizedAddress {
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
            state: state.into(),
            zip: zip.into(),
        }
    }

    /// Derive the stable property identifier for this address.
    ///
    /// SHA-256 over the lowercased, whitespace-collapsed components, so the
    /// same property always maps to the same stored entity regardless of
    /// letter case or incidental spacing. Truncated to 32 hex chars; the
    /// keyspace (a few hundred million US parcels) is nowhere near collision
    /// territory at 128 bits.
    pub fn property_id(&self) -> PropertyId {
        let mut hasher = Sha256::new();
        hasher.update(canonical(&self.street));
        hasher.update("|");
        hasher.update(canonical(&self.city));
        hasher.update("|");
        hasher.update(canonical(&self.state));
        hasher.update("|");
        hasher.update(canonical(&self.zip));
        let digest = hasher.finalize();
        PropertyId::new(hex::encode(&digest[..16]))
    }
}

impl fmt::Display for NormalizedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {} {}",
            self.street, self.city, self.state, self.zip
        )
    }
}

/// Lowercase and collapse whitespace runs to a single space.
fn canonical(component: &str) -> String {
    component
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
