//! Coinbase Exchange (formerly GDAX) public REST client
//!
//! Only the unauthenticated market-data endpoints are used:
//! `GET /products/{id}/trades` and `GET /products/{id}/candles`.

use super::{Exchange, ExchangeError, RawCandle, RawTrade};
use crate::config::ExchangeConfig;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Coinbase Exchange REST base URL
pub const COINBASE_API_URL: &str = "https://api.exchange.coinbase.com";

/// Configuration for the Coinbase client
#[derive(Debug, Clone)]
pub struct CoinbaseConfig {
    /// Base URL for the REST API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for CoinbaseConfig {
    fn default() -> Self {
        Self::from(&ExchangeConfig::default())
    }
}

impl From<&ExchangeConfig> for CoinbaseConfig {
    fn from(config: &ExchangeConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Error body returned by the exchange on non-success statuses
#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

/// Client for the Coinbase Exchange public market-data API
pub struct CoinbaseClient {
    config: CoinbaseConfig,
    base_url: Url,
    client: Client,
}

impl CoinbaseClient {
    /// Create a new client with custom configuration
    pub fn with_config(config: CoinbaseConfig) -> Result<Self, ExchangeError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ExchangeError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ExchangeError::InvalidUrl(config.base_url.clone()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    /// Build `{base}/products/{product_id}/{endpoint}` with the product id escaped
    fn product_url(&self, product_id: &str, endpoint: &str) -> Result<Url, ExchangeError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ExchangeError::InvalidUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend(["products", product_id, endpoint]);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, ExchangeError> {
        tracing::debug!(url = %url, "Requesting exchange data");

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiMessage>(&body)
                .map(|m| m.message)
                .unwrap_or(body);
            return Err(ExchangeError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn iso8601(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl Exchange for CoinbaseClient {
    async fn fetch_trades(&self, product_id: &str) -> Result<Vec<RawTrade>, ExchangeError> {
        let url = self.product_url(product_id, "trades")?;
        let trades: Vec<RawTrade> = self.get_json(url, &[]).await?;

        tracing::debug!(prod_id = %product_id, count = trades.len(), "Fetched trades");
        Ok(trades)
    }

    async fn fetch_historic_rates(
        &self,
        product_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Duration,
    ) -> Result<Vec<RawCandle>, ExchangeError> {
        let url = self.product_url(product_id, "candles")?;
        let query = [
            ("start", iso8601(start)),
            ("end", iso8601(end)),
            ("granularity", granularity.as_secs().to_string()),
        ];
        let rows: Vec<RawCandle> = self.get_json(url, &query).await?;

        tracing::debug!(prod_id = %product_id, count = rows.len(), "Fetched historic rates");
        Ok(rows)
    }
}
