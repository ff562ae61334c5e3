//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file with environment variable
//! overrides for sensitive values like `DATASET_API_TOKEN`. Every tunable
//! has a default matching the observed production settings, so an absent
//! file or section still yields a runnable config.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::domain::{ProviderId, Reconciler, ReliabilityTable};
use crate::error::{ConfigError, Result};
use crate::provider::RetryPolicy;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub confidence: ConfidenceConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Tunables of the aggregation pipeline itself.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregationConfig {
    /// Global bound on simultaneously in-flight provider calls.
    #[serde(default = "default_max_concurrent_scrapes")]
    pub max_concurrent_scrapes: usize,
    /// Attempts per provider, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Linear backoff base: wait `base x attempt_number` between attempts.
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    /// Per-attempt deadline on one provider call.
    #[serde(default = "default_scrape_timeout_ms")]
    pub scrape_timeout_ms: u64,
    /// Estimates at or above this are excluded from statistics.
    #[serde(default = "default_valid_estimate_ceiling")]
    pub valid_estimate_ceiling: Decimal,
}

fn default_max_concurrent_scrapes() -> usize {
    2
}

fn default_max_attempts() -> u32 {
    2
}

fn default_base_backoff_ms() -> u64 {
    2000
}

fn default_scrape_timeout_ms() -> u64 {
    30_000
}

fn default_valid_estimate_ceiling() -> Decimal {
    Decimal::from(50_000_000u32)
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_scrapes: default_max_concurrent_scrapes(),
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            scrape_timeout_ms: default_scrape_timeout_ms(),
            valid_estimate_ceiling: default_valid_estimate_ceiling(),
        }
    }
}

impl AggregationConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_backoff_ms),
            timeout: Duration::from_millis(self.scrape_timeout_ms),
        }
    }
}

/// Shared-egress rate limit applied around each provider attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_rate_window_ms")]
    pub window_ms: u64,
}

fn default_rate_max_requests() -> u32 {
    10
}

fn default_rate_window_ms() -> u64 {
    60_000
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_rate_max_requests(),
            window_ms: default_rate_window_ms(),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Per-provider default confidence for estimates that arrive without one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfidenceConfig {
    #[serde(default)]
    pub providers: BTreeMap<ProviderId, u8>,
    #[serde(default)]
    pub fallback: Option<u8>,
}

impl ConfidenceConfig {
    pub fn table(&self) -> ReliabilityTable {
        match (self.providers.is_empty(), self.fallback) {
            (true, None) => ReliabilityTable::default(),
            (true, Some(fallback)) => ReliabilityTable::default().with_fallback(fallback),
            (false, fallback) => {
                ReliabilityTable::new(self.providers.clone(), fallback.unwrap_or(65))
            }
        }
    }
}

/// Which sources participate in a run.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_enabled_providers")]
    pub enabled: Vec<String>,
}

fn default_enabled_providers() -> Vec<String> {
    ["homes", "zillow", "movoto", "redfin", "realtor"]
        .map(String::from)
        .to_vec()
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_providers(),
        }
    }
}

/// Dataset-scrape API settings. The bearer token is loaded from the
/// `DATASET_API_TOKEN` env var at runtime, never from the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_dataset_api_base")]
    pub api_base: String,
    #[serde(skip)]
    pub api_token: Option<String>,
    /// Dataset id per provider; providers without one cannot be scraped
    /// through the dataset API.
    #[serde(default = "default_dataset_ids")]
    pub datasets: BTreeMap<String, String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_poll_deadline_ms")]
    pub poll_deadline_ms: u64,
}

fn default_dataset_api_base() -> String {
    "https://api.brightdata.com/datasets/v3".to_string()
}

fn default_dataset_ids() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("zillow".to_string(), "gd_lfqkr8wm13ixtbd8f5".to_string()),
        ("realtor".to_string(), "gd_m517agnc1jppzwgtmw".to_string()),
    ])
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_poll_deadline_ms() -> u64 {
    30_000
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            api_base: default_dataset_api_base(),
            api_token: None,
            datasets: default_dataset_ids(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_deadline_ms: default_poll_deadline_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;

        let mut config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;

        config.dataset.api_token = std::env::var("DATASET_API_TOKEN").ok();

        config.validate()?;

        Ok(config)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            let mut config = Self::default();
            config.dataset.api_token = std::env::var("DATASET_API_TOKEN").ok();
            Ok(config)
        }
    }

    fn validate(&self) -> Result<()> {
        if self.aggregation.max_concurrent_scrapes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_concurrent_scrapes",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if self.aggregation.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_attempts",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if self.aggregation.valid_estimate_ceiling <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "valid_estimate_ceiling",
                reason: "must be positive".into(),
            }
            .into());
        }
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_requests",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if self.providers.enabled.is_empty() {
            return Err(ConfigError::MissingField {
                field: "providers.enabled",
            }
            .into());
        }
        Ok(())
    }

    /// Reconciliation engine configured with this config's ceiling and
    /// confidence table.
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(
            self.aggregation.valid_estimate_ceiling,
            self.confidence.table(),
        )
    }

    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}
