use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, StatusCode};
use serde::Deserialize;

/* API contains the logic for calling the MoneroBlocks statistics API.
 * Links the bot's logic with the live network data it reports on.
 * Called and used by the Processor only.
 * Every call is a single round trip: no retries, no caching.
 */

const STATS_PATH: &str = "get_stats/";
const BLOCK_HEADER_PATH: &str = "get_block_header/";

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: StatusCode },
    #[error("Malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Requested block header {requested}, received {received}")]
    HeightMismatch { requested: u64, received: u64 },
}

// One sample of network-wide statistics.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NetworkSnapshot {
    pub height: u64,
    #[serde(rename = "hashrate")]
    pub hashrate_raw: u64,
    // Exceeds u64 once emission passes ~18.4M XMR.
    #[serde(rename = "total_emission")]
    pub total_emission_raw: u128,
    #[serde(rename = "last_reward")]
    pub last_reward_raw: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockHeader {
    pub height: u64,
    #[serde(rename = "num_txes")]
    pub num_transactions: u64,
}

#[derive(Deserialize)]
struct BlockHeaderEnvelope {
    block_header: BlockHeader,
}

/* Source of network statistics.
 * Implemented by StatsClient; the Processor depends only on this seam.
 */
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<NetworkSnapshot, FetchError>;
    async fn fetch_block_header(&self, height: u64) -> Result<BlockHeader, FetchError>;
}

#[derive(Clone, Debug)]
pub struct StatsClient {
    client: reqwest::Client,
    base_url: String,
}

impl StatsClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<StatsClient, reqwest::Error> {
        let mut h = header::HeaderMap::new();
        h.insert(
            "Accept",
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(h)
            .timeout(timeout)
            .build()?;

        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        Ok(StatsClient { client, base_url })
    }

    // Issues a GET and returns the body of a 200 response.
    async fn get_body(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let body = self.get_body(url).await?;
        serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl StatsSource for StatsClient {
    async fn fetch_snapshot(&self) -> Result<NetworkSnapshot, FetchError> {
        let url = format!("{}{STATS_PATH}", self.base_url);
        self.get_json(&url).await
    }

    async fn fetch_block_header(&self, height: u64) -> Result<BlockHeader, FetchError> {
        let url = format!("{}{BLOCK_HEADER_PATH}{height}", self.base_url);
        let envelope: BlockHeaderEnvelope = self.get_json(&url).await?;
        let header = envelope.block_header;

        if header.height != height {
            return Err(FetchError::HeightMismatch {
                requested: height,
                received: header.height,
            });
        }

        Ok(header)
    }
}
