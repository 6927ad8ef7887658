//! Client for the read-only info endpoint.
//!
//! Fetches perp metadata, mid prices and per-user clearinghouse state via
//! POST requests with a JSON `{"type": ...}` body.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use updown_core::{AssetConfig, Network, Price};

use crate::error::{ExchangeError, ExchangeResult};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Request body for info queries without parameters.
#[derive(Debug, Serialize)]
struct InfoRequest {
    #[serde(rename = "type")]
    request_type: String,
}

/// Request body for user-scoped info queries.
#[derive(Debug, Serialize)]
struct InfoRequestWithUser {
    #[serde(rename = "type")]
    request_type: String,
    /// User address (0x...).
    user: String,
}

/// One perp entry in the meta universe.
#[derive(Debug, Deserialize)]
struct RawUniverseEntry {
    name: String,
    #[serde(rename = "szDecimals")]
    sz_decimals: u32,
    #[serde(rename = "maxLeverage", default = "default_max_leverage")]
    max_leverage: u32,
    #[serde(rename = "isDelisted", default)]
    is_delisted: bool,
}

fn default_max_leverage() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
struct RawMetaResponse {
    universe: Vec<RawUniverseEntry>,
}

#[derive(Debug, Deserialize)]
struct RawClearinghouseState {
    #[serde(rename = "marginSummary")]
    margin_summary: Option<RawMarginSummary>,
    #[serde(default)]
    withdrawable: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMarginSummary {
    #[serde(rename = "accountValue")]
    account_value: String,
}

/// Parsed per-user account snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountState {
    pub account_value: Decimal,
    pub withdrawable: Decimal,
}

impl AccountState {
    /// Whether the account exists on the exchange with any funds.
    ///
    /// A never-funded address reports zeroes across the board, which is the
    /// signal to ask the user for a deposit before approving a delegate.
    pub fn is_funded(&self) -> bool {
        self.account_value > Decimal::ZERO || self.withdrawable > Decimal::ZERO
    }
}

/// Client for the info endpoint.
pub struct InfoClient {
    client: Client,
    info_url: String,
}

impl InfoClient {
    pub fn new(network: Network) -> ExchangeResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ExchangeError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            info_url: network.info_url().to_string(),
        })
    }

    /// Fetch perp metadata and index every listed asset by universe position.
    pub async fn fetch_meta(&self) -> ExchangeResult<Vec<AssetConfig>> {
        info!(url = %self.info_url, "Fetching perp metadata");

        let meta: RawMetaResponse = self.post_info(&InfoRequest {
            request_type: "meta".to_string(),
        })
        .await?;

        let mut assets = Vec::with_capacity(meta.universe.len());
        for (index, entry) in meta.universe.into_iter().enumerate() {
            if entry.is_delisted {
                debug!(asset = %entry.name, "Skipping delisted asset");
                continue;
            }
            assets.push(AssetConfig {
                name: entry.name,
                asset_index: index as u32,
                sz_decimals: entry.sz_decimals,
                max_leverage: entry.max_leverage,
            });
        }

        info!(asset_count = assets.len(), "Fetched perp metadata");
        Ok(assets)
    }

    /// Fetch mid prices for all assets.
    pub async fn fetch_all_mids(&self) -> ExchangeResult<HashMap<String, Price>> {
        debug!(url = %self.info_url, "Fetching mid prices");

        let raw: HashMap<String, String> = self.post_info(&InfoRequest {
            request_type: "allMids".to_string(),
        })
        .await?;

        let mut mids = HashMap::with_capacity(raw.len());
        for (asset, value) in raw {
            match value.parse::<Decimal>() {
                Ok(px) => {
                    mids.insert(asset, Price::new(px));
                }
                Err(_) => warn!(asset = %asset, value = %value, "Unparseable mid price"),
            }
        }
        Ok(mids)
    }

    /// Fetch the mid price for a single asset.
    pub async fn fetch_mid(&self, asset: &str) -> ExchangeResult<Option<Price>> {
        let mids = self.fetch_all_mids().await?;
        Ok(mids.get(asset).copied())
    }

    /// Fetch clearinghouse state (account value and withdrawable) for a user.
    pub async fn fetch_account_state(&self, user_address: &str) -> ExchangeResult<AccountState> {
        debug!(user = %user_address, "Fetching clearinghouse state");

        let state: RawClearinghouseState = self.post_info(&InfoRequestWithUser {
            request_type: "clearinghouseState".to_string(),
            user: user_address.to_string(),
        })
        .await?;

        let account_value = state
            .margin_summary
            .as_ref()
            .and_then(|s| s.account_value.parse().ok())
            .unwrap_or(Decimal::ZERO);
        let withdrawable = state
            .withdrawable
            .as_deref()
            .and_then(|w| w.parse().ok())
            .unwrap_or(Decimal::ZERO);

        Ok(AccountState {
            account_value,
            withdrawable,
        })
    }

    async fn post_info<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        body: &B,
    ) -> ExchangeResult<T> {
        let response = self
            .client
            .post(&self.info_url)
            .json(body)
            .send()
            .await
            .map_err(|e| ExchangeError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::HttpClient(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| ExchangeError::HttpClient(format!("Failed to parse response: {e}")))
    }
}
