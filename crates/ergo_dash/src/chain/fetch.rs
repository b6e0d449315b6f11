//! Ergo explorer and price oracle API client. One attempt per call, bounded by
//! the client timeout.

use crate::chain::normalize::{decode_quoted_json, ListOrEnvelope, NormalizeError};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

const DEFAULT_EXPLORER_URL: &str = "https://api.ergoplatform.com";
const DEFAULT_PRICE_URL: &str = "https://erg-oracle-ergusd.spirepools.com/frontendData";
const TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub explorer_url: String,
    pub price_url: String,
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
            price_url: DEFAULT_PRICE_URL.to_string(),
            timeout_secs: TIMEOUT_SECS,
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("url: {0}")]
    Url(#[from] url::ParseError),
    #[error("normalize: {0}")]
    Normalize(#[from] NormalizeError),
    #[error("api error: status {0} body {1}")]
    Api(u16, String),
    #[error("decode {0}: {1}")]
    Decode(&'static str, serde_json::Error),
}

/// Miner as reported in the blocks listing.
#[derive(Clone, Debug, Deserialize)]
pub struct ExplorerMiner {
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One entry of `GET /api/v1/blocks`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerBlock {
    pub id: String,
    pub height: u64,
    pub timestamp: i64,
    pub transactions_count: u64,
    pub miner: ExplorerMiner,
    pub size: u64,
    pub miner_reward: u64,
}

/// Token attached to a box.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerAsset {
    #[serde(default)]
    pub token_id: String,
    #[serde(default)]
    pub amount: u64,
}

/// Box reference in a transaction (input or output). Every field is optional
/// upstream, so decoding never fails on a thin record.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExplorerBox {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub value: Option<u64>,
    #[serde(default)]
    pub assets: Option<Vec<ExplorerAsset>>,
}

impl ExplorerBox {
    pub fn value_nano(&self) -> u64 {
        self.value.unwrap_or(0)
    }

    pub fn has_assets(&self) -> bool {
        self.assets.as_ref().is_some_and(|a| !a.is_empty())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BlockTransaction {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub outputs: Option<Vec<ExplorerBox>>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDetailInner {
    #[serde(default)]
    pub block_transactions: Option<Vec<BlockTransaction>>,
}

/// `GET /api/v1/blocks/{id}`. Only the transactions are read.
#[derive(Clone, Debug, Deserialize)]
pub struct BlockDetail {
    #[serde(default)]
    pub block: Option<BlockDetailInner>,
}

/// One entry of `GET /transactions/unconfirmed`.
#[derive(Clone, Debug, Deserialize)]
pub struct UnconfirmedTx {
    pub id: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub inputs: Option<Vec<ExplorerBox>>,
    #[serde(default)]
    pub outputs: Option<Vec<ExplorerBox>>,
}

fn decode_blocks(raw: Vec<serde_json::Value>) -> Vec<ExplorerBlock> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(i, record)| match serde_json::from_value(record) {
            Ok(block) => Some(block),
            Err(e) => {
                warn!(index = i, error = %e, "skipping malformed block");
                None
            }
        })
        .collect()
}

/// Sort and paging passed through to the unconfirmed-transactions listing.
#[derive(Clone, Debug)]
pub struct TxQuery {
    pub limit: u32,
    pub offset: u32,
    pub sort_by: String,
    pub sort_direction: String,
}

impl Default for TxQuery {
    fn default() -> Self {
        Self {
            limit: 500,
            offset: 0,
            sort_by: "size".to_string(),
            sort_direction: "desc".to_string(),
        }
    }
}

/// Shared HTTP client for every upstream.
pub struct Fetcher {
    config: FetchConfig,
    client: reqwest::Client,
    request_count: AtomicU64,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            config,
            client,
            request_count: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn explorer_endpoint(&self, path: &str) -> Result<Url, FetchError> {
        let base = format!("{}/", self.config.explorer_url.trim_end_matches('/'));
        Ok(Url::parse(&base)?.join(path.trim_start_matches('/'))?)
    }

    async fn get_text(&self, url: Url, query: &[(&str, String)]) -> Result<String, FetchError> {
        debug!(%url, "GET");
        let res = self.client.get(url).query(query).send().await?;
        self.request_count.fetch_add(1, Ordering::Relaxed);
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(FetchError::Api(status.as_u16(), body));
        }
        Ok(body)
    }

    /// Most recent blocks, newest first. Records that do not decode are
    /// skipped; the rest of the listing is kept.
    pub async fn blocks(&self, limit: u32) -> Result<Vec<ExplorerBlock>, FetchError> {
        let url = self.explorer_endpoint("/api/v1/blocks")?;
        let body = self.get_text(url, &[("limit", limit.to_string())]).await?;
        let parsed: ListOrEnvelope<serde_json::Value> =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode("blocks", e))?;
        Ok(decode_blocks(parsed.into_items()))
    }

    /// Full block with its transactions and outputs.
    pub async fn block_detail(&self, block_id: &str) -> Result<BlockDetail, FetchError> {
        let path = format!("/api/v1/blocks/{}", urlencoding::encode(block_id));
        let url = self.explorer_endpoint(&path)?;
        let body = self.get_text(url, &[]).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode("block detail", e))
    }

    /// Raw unconfirmed transaction records. Each record is decoded separately
    /// by the caller so one bad record does not sink the page.
    pub async fn unconfirmed_transactions(
        &self,
        query: &TxQuery,
    ) -> Result<Vec<serde_json::Value>, FetchError> {
        let url = self.explorer_endpoint("/transactions/unconfirmed")?;
        let params = [
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
            ("sortBy", query.sort_by.clone()),
            ("sortDirection", query.sort_direction.clone()),
        ];
        let body = self.get_text(url, &params).await?;
        let parsed: ListOrEnvelope<serde_json::Value> = serde_json::from_str(&body)
            .map_err(|e| FetchError::Decode("unconfirmed transactions", e))?;
        Ok(parsed.into_items())
    }

    /// Price oracle payload, unwrapped from its string encoding.
    pub async fn price_feed(&self) -> Result<serde_json::Value, FetchError> {
        let url = Url::parse(&self.config.price_url)?;
        let body = self.get_text(url, &[]).await?;
        Ok(decode_quoted_json(&body)?)
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }
}
