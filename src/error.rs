use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// A single provider attempt failing. Recoverable: the retry controller
/// absorbs these into a terminal [`ProviderOutcome`](crate::domain::ProviderOutcome)
/// and they never escape the orchestrator.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("scrape timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider returned no usable data: {0}")]
    NoData(String),

    #[error("provider payload rejected: {0}")]
    InvalidPayload(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Persistence errors. Reads degrade (logged, empty result); the property
/// upsert that anchors a fresh analysis run is surfaced.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to persist property: {0}")]
    PropertyWrite(String),

    #[error("failed to persist estimate from {provider}: {reason}")]
    EstimateWrite { provider: String, reason: String },

    #[error("failed to read from store: {0}")]
    Read(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Every configured provider failed to identify the property. The one
    /// run-level failure: callers treat it as "property not found", not as
    /// a transient fault.
    #[error("no source identified property at {address}")]
    NoSourceIdentified { address: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
