//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Provider identifier - newtype for type safety.
///
/// The inner String is private to ensure all construction goes through
/// the defined constructors. Comparison is case-sensitive; configuration
/// is expected to use lowercase names ("zillow", "redfin", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    /// Create a new ProviderId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the provider ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProviderId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Stable property identifier derived from a normalized address.
///
/// Constructed through [`NormalizedAddress::property_id`](super::NormalizedAddress::property_id)
/// or parsed back from its hex form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(String);

impl PropertyId {
    /// Wrap an already-derived identifier (e.g. one read back from storage
    /// or received from an API caller).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the property ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PropertyId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for PropertyId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_id_new_and_as_str() {
        let id = ProviderId::new("zillow");
        assert_eq!(id.as_str(), "zillow");
    }

    #[test]
    fn provider_id_display() {
        let id = ProviderId::new("redfin");
        assert_eq!(format!("{}", id), "redfin");
    }

    #[test]
    fn property_id_from_str() {
        let id = PropertyId::from("abcd1234");
        assert_eq!(id.as_str(), "abcd1234");
    }
}
