//! Configuration loading, defaults, and validation.

use std::io::Write;

use rust_decimal_macros::dec;
use valorem::config::Config;
use valorem::domain::ProviderId;
use valorem::error::{ConfigError, Error};

fn load(toml: &str) -> Result<Config, Error> {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(toml.as_bytes()).unwrap();
    Config::load(file.path())
}

#[test]
fn defaults_match_observed_production_settings() {
    let config = Config::default();

    assert_eq!(config.aggregation.max_concurrent_scrapes, 2);
    assert_eq!(config.aggregation.max_attempts, 2);
    assert_eq!(config.aggregation.base_backoff_ms, 2000);
    assert_eq!(config.aggregation.valid_estimate_ceiling, dec!(50000000));
    assert_eq!(
        config.providers.enabled,
        vec!["homes", "zillow", "movoto", "redfin", "realtor"]
    );
}

#[test]
fn empty_file_yields_defaults() {
    let config = load("").unwrap();
    assert_eq!(config.aggregation.max_concurrent_scrapes, 2);
    assert_eq!(config.rate_limit.max_requests, 10);
}

#[test]
fn sections_override_defaults() {
    let config = load(
        r#"
[aggregation]
max_concurrent_scrapes = 4
max_attempts = 3
base_backoff_ms = 500

[rate_limit]
max_requests = 30
window_ms = 10000

[providers]
enabled = ["zillow", "redfin"]

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    assert_eq!(config.aggregation.max_concurrent_scrapes, 4);
    assert_eq!(config.aggregation.max_attempts, 3);
    assert_eq!(config.aggregation.base_backoff_ms, 500);
    assert_eq!(config.rate_limit.max_requests, 30);
    assert_eq!(config.providers.enabled, vec!["zillow", "redfin"]);
    assert_eq!(config.logging.format, "json");
}

#[test]
fn confidence_table_overrides_apply() {
    let config = load(
        r#"
[confidence]
fallback = 50

[confidence.providers]
zillow = 90
"#,
    )
    .unwrap();

    let table = config.confidence.table();
    assert_eq!(table.confidence_for(&ProviderId::new("zillow")), 90);
    assert_eq!(table.confidence_for(&ProviderId::new("anything")), 50);
}

#[test]
fn fallback_only_override_keeps_default_table() {
    let config = load(
        r#"
[confidence]
fallback = 40
"#,
    )
    .unwrap();

    let table = config.confidence.table();
    assert_eq!(table.confidence_for(&ProviderId::new("zillow")), 85);
    assert_eq!(table.confidence_for(&ProviderId::new("unknown")), 40);
}

#[test]
fn zero_concurrency_is_rejected() {
    let result = load(
        r#"
[aggregation]
max_concurrent_scrapes = 0
"#,
    );

    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidValue {
            field: "max_concurrent_scrapes",
            ..
        }))
    ));
}

#[test]
fn zero_attempts_is_rejected() {
    let result = load(
        r#"
[aggregation]
max_attempts = 0
"#,
    );

    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidValue {
            field: "max_attempts",
            ..
        }))
    ));
}

#[test]
fn empty_provider_list_is_rejected() {
    let result = load(
        r#"
[providers]
enabled = []
"#,
    );

    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::MissingField {
            field: "providers.enabled"
        }))
    ));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let result = load("this is not toml [");
    assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));
}
