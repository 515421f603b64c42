//! HTTP client for the venue's public REST endpoints.

use crate::error::{RegistryError, RegistryResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Public REST base URL.
pub const DEFAULT_REST_URL: &str = "https://www.okx.com";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Recent traded volume lookup.
#[async_trait]
pub trait VolumeSource: Send + Sync {
    /// 24h traded volume for `inst_id`.
    async fn volume_24h(&self, inst_id: &str) -> RegistryResult<f64>;
}

/// Response envelope shared by the v5 endpoints.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct RawTicker {
    #[serde(rename = "vol24h", default)]
    vol_24h: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawInstrument {
    #[serde(rename = "instId")]
    inst_id: String,
    #[serde(default)]
    state: String,
}

/// Client for instrument and ticker metadata.
pub struct MarketClient {
    client: Client,
    base_url: String,
}

impl MarketClient {
    /// Create a client with the default 2 s timeout.
    pub fn new(base_url: impl Into<String>) -> RegistryResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> RegistryResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegistryError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Identifiers of live instruments of `inst_type` (e.g. "SPOT").
    pub async fn fetch_instruments(&self, inst_type: &str) -> RegistryResult<Vec<String>> {
        let url = format!("{}/api/v5/public/instruments", self.base_url);
        info!(%url, inst_type, "Fetching instruments");

        let raw: Vec<RawInstrument> = self.get(&url, &[("instType", inst_type)]).await?;
        let live = live_instruments(raw);

        info!(count = live.len(), "Fetched live instruments");
        Ok(live)
    }

    /// 24h traded volume from the ticker endpoint.
    pub async fn fetch_volume_24h(&self, inst_id: &str) -> RegistryResult<f64> {
        let url = format!("{}/api/v5/market/ticker", self.base_url);
        let raw: Vec<RawTicker> = self.get(&url, &[("instId", inst_id)]).await?;
        let volume = ticker_volume(raw)?;
        debug!(inst_id, volume, "Fetched 24h volume");
        Ok(volume)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> RegistryResult<Vec<T>> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| RegistryError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::HttpClient(format!("HTTP {status}: {body}")));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RegistryError::HttpClient(format!("Failed to parse response: {e}")))?;

        unwrap_envelope(body)
    }
}

#[async_trait]
impl VolumeSource for MarketClient {
    async fn volume_24h(&self, inst_id: &str) -> RegistryResult<f64> {
        self.fetch_volume_24h(inst_id).await
    }
}

fn unwrap_envelope<T: DeserializeOwned>(body: serde_json::Value) -> RegistryResult<Vec<T>> {
    let envelope: Envelope<T> = serde_json::from_value(body)?;
    if envelope.code != "0" {
        return Err(RegistryError::Api {
            code: envelope.code,
            msg: envelope.msg,
        });
    }
    Ok(envelope.data)
}

fn live_instruments(raw: Vec<RawInstrument>) -> Vec<String> {
    raw.into_iter()
        .filter(|i| i.state == "live")
        .map(|i| i.inst_id)
        .collect()
}

fn ticker_volume(raw: Vec<RawTicker>) -> RegistryResult<f64> {
    let value = raw
        .into_iter()
        .next()
        .and_then(|t| t.vol_24h)
        .ok_or(RegistryError::MissingField("vol24h"))?;

    let volume: f64 = value
        .trim()
        .parse()
        .map_err(|e| RegistryError::ParseError(format!("vol24h '{value}': {e}")))?;

    if !(volume >= 0.0 && volume.is_finite()) {
        return Err(RegistryError::ParseError(format!("vol24h out of range: {volume}")));
    }
    Ok(volume)
}
