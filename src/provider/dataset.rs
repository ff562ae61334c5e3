//! Dataset-scrape API provider.
//!
//! Drives a hosted scraping service's dataset API: trigger a collection run
//! for the property's listing URL, poll the snapshot until it is ready, then
//! pull the estimate fields out of the returned JSON records. No HTML is
//! ever parsed here; the service returns structured data.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::AvmProvider;
use crate::domain::{NormalizedAddress, ProviderId, ProviderPayload};
use crate::error::ProviderError;

/// Candidate field names per extracted value; sources disagree on naming,
/// so the first present field wins.
const ESTIMATE_FIELDS: &[&str] = &["price", "zestimate", "estimate", "list_price", "avm_value"];
const RENT_FIELDS: &[&str] = &["rentZestimate", "rent_estimate", "rentEstimate", "rent"];
const LOW_FIELDS: &[&str] = &["estimate_low", "low_estimate", "valuation_low"];
const HIGH_FIELDS: &[&str] = &["estimate_high", "high_estimate", "valuation_high"];

/// One dataset-backed AVM source.
pub struct DatasetProvider {
    id: ProviderId,
    dataset_id: String,
    api_base: Url,
    token: String,
    client: Client,
    poll_interval: Duration,
    poll_deadline: Duration,
}

/// Builder for [`DatasetProvider`]; everything except identity has a
/// sensible default.
pub struct DatasetProviderBuilder {
    id: ProviderId,
    dataset_id: String,
    api_base: String,
    token: String,
    poll_interval: Duration,
    poll_deadline: Duration,
}

impl DatasetProviderBuilder {
    pub fn new(
        id: impl Into<ProviderId>,
        dataset_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            dataset_id: dataset_id.into(),
            api_base: "https://api.brightdata.com/datasets/v3".to_string(),
            token: token.into(),
            poll_interval: Duration::from_millis(5000),
            poll_deadline: Duration::from_millis(30_000),
        }
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn poll_deadline(mut self, deadline: Duration) -> Self {
        self.poll_deadline = deadline;
        self
    }

    pub fn build(self) -> Result<DatasetProvider, url::ParseError> {
        Ok(DatasetProvider {
            id: self.id,
            dataset_id: self.dataset_id,
            api_base: Url::parse(&self.api_base)?,
            token: self.token,
            client: Client::new(),
            poll_interval: self.poll_interval,
            poll_deadline: self.poll_deadline,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TriggerResponse {
    snapshot_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProgressResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    records: Option<u64>,
}

impl DatasetProvider {
    /// Listing URL for the property on this source's site.
    fn listing_url(&self, address: &NormalizedAddress) -> String {
        let dash = |s: &str| s.split_whitespace().collect::<Vec<_>>().join("-");
        match self.id.as_str() {
            "zillow" => format!(
                "https://www.zillow.com/homes/{}-{}-{}-{}_rb/",
                dash(&address.street),
                dash(&address.city),
                address.state,
                address.zip
            ),
            "realtor" => format!(
                "https://www.realtor.com/realestateandhomes-detail/{}_{}_{}_{}",
                dash(&address.street).to_lowercase(),
                dash(&address.city).to_lowercase(),
                address.state.to_lowercase(),
                address.zip
            ),
            other => format!(
                "https://www.{}.com/search/?q={}%20{}%20{}%20{}",
                other,
                dash(&address.street),
                dash(&address.city),
                address.state,
                address.zip
            ),
        }
    }

    async fn trigger(&self, listing_url: &str) -> Result<String, ProviderError> {
        let mut endpoint = self.api_base.clone();
        endpoint
            .path_segments_mut()
            .map_err(|_| ProviderError::Unavailable("dataset API base cannot be a base".into()))?
            .push("trigger");
        endpoint
            .query_pairs_mut()
            .append_pair("dataset_id", &self.dataset_id)
            .append_pair("format", "json");

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&self.token)
            .json(&serde_json::json!([{ "url": listing_url }]))
            .send()
            .await?
            .error_for_status()?;

        let body: TriggerResponse = response.json().await?;
        body.snapshot_id
            .ok_or_else(|| ProviderError::NoData("trigger returned no snapshot id".into()))
    }

    async fn wait_for_completion(&self, snapshot_id: &str) -> Result<(), ProviderError> {
        let deadline = tokio::time::Instant::now() + self.poll_deadline;

        loop {
            let mut endpoint = self.api_base.clone();
            endpoint
                .path_segments_mut()
                .map_err(|_| {
                    ProviderError::Unavailable("dataset API base cannot be a base".into())
                })?
                .push("progress")
                .push(snapshot_id);

            match self
                .client
                .get(endpoint)
                .bearer_auth(&self.token)
                .send()
                .await
            {
                Ok(response) => {
                    let progress: ProgressResponse = response.json().await?;
                    debug!(
                        provider = %self.id,
                        snapshot = snapshot_id,
                        status = %progress.status,
                        records = progress.records,
                        "snapshot progress"
                    );
                    match progress.status.as_str() {
                        "ready" | "completed" => return Ok(()),
                        "failed" => {
                            return Err(ProviderError::Unavailable(format!(
                                "snapshot {snapshot_id} failed"
                            )))
                        }
                        _ => {}
                    }
                }
                Err(error) => {
                    // transient progress-check failures just wait for the next poll
                    warn!(provider = %self.id, error = %error, "progress check failed");
                }
            }

            if tokio::time::Instant::now() + self.poll_interval > deadline {
                return Err(ProviderError::Timeout {
                    elapsed_ms: self.poll_deadline.as_millis() as u64,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn snapshot(&self, snapshot_id: &str) -> Result<serde_json::Value, ProviderError> {
        let mut endpoint = self.api_base.clone();
        endpoint
            .path_segments_mut()
            .map_err(|_| ProviderError::Unavailable("dataset API base cannot be a base".into()))?
            .push("snapshot")
            .push(snapshot_id);
        endpoint.query_pairs_mut().append_pair("format", "json");

        let response = self
            .client
            .get(endpoint)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

#[async_trait]
impl AvmProvider for DatasetProvider {
    fn id(&self) -> ProviderId {
        self.id.clone()
    }

    async fn scrape_avm(
        &self,
        address: &NormalizedAddress,
    ) -> Result<ProviderPayload, ProviderError> {
        let listing_url = self.listing_url(address);
        debug!(provider = %self.id, url = %listing_url, "triggering dataset scrape");

        let snapshot_id = self.trigger(&listing_url).await?;
        self.wait_for_completion(&snapshot_id).await?;
        let data = self.snapshot(&snapshot_id).await?;

        extract_payload(&data)
    }
}

/// Pull the payload out of a snapshot body (a record array or bare record).
fn extract_payload(data: &serde_json::Value) -> Result<ProviderPayload, ProviderError> {
    let record = match data {
        serde_json::Value::Array(records) => records
            .first()
            .ok_or_else(|| ProviderError::NoData("snapshot returned no records".into()))?,
        other => other,
    };

    let estimate = extract_money(record, ESTIMATE_FIELDS)
        .ok_or_else(|| ProviderError::NoData("record carries no estimate field".into()))?;

    let mut payload = ProviderPayload::new(estimate);
    payload.rent_estimate = extract_money(record, RENT_FIELDS);
    payload.low_range = extract_money(record, LOW_FIELDS);
    payload.high_range = extract_money(record, HIGH_FIELDS);
    Ok(payload)
}

/// First present candidate field, parsed as money.
fn extract_money(record: &serde_json::Value, fields: &[&str]) -> Option<Decimal> {
    fields
        .iter()
        .filter_map(|field| record.get(field))
        .find_map(parse_money)
}

/// Accept both JSON numbers and dirty display strings ("$1,234/mo").
fn parse_money(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().and_then(Decimal::from_f64_retain),
        serde_json::Value::String(s) => {
            let cleaned = s
                .replace(['$', ','], "")
                .split(['/', ' '])
                .next()?
                .to_string();
            cleaned.parse().ok()
        }
        _ => None,
    }
}
