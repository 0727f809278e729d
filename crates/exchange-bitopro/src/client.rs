//! BitoPro public REST API client with rate limiting.
//!
//! The client performs no validation of pairs, resolutions or timestamps:
//! the test suite probes the server's own validation, so every request goes
//! out exactly as given.
//!
//! # Example
//!
//! ```ignore
//! use bito_qa_bitopro::BitoProClient;
//! use bito_qa_core::ExchangeConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = BitoProClient::new(&ExchangeConfig::default())?;
//!     let (body, record) = client
//!         .get_ohlc_data("btc_twd", "1h", 1_609_459_200, 1_609_545_600)
//!         .await?;
//!     println!("{} -> {:?}", record.request.url, body["data"].as_array().map(Vec::len));
//!     Ok(())
//! }
//! ```

use crate::error::{BitoProError, ErrorBody, Result};
use crate::record::{header_map, ExchangeRecord, RequestRecord};
use crate::types::{LimitationsAndFees, OhlcQuery};
use bito_qa_core::ExchangeConfig;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Constants
// =============================================================================

/// BitoPro v3 public API base URL.
pub const BITOPRO_API_URL: &str = "https://api.bitopro.com/v3";

const DEFAULT_REQUESTS_PER_MINUTE: NonZeroU32 = nonzero!(600u32);

// =============================================================================
// BitoProClient
// =============================================================================

/// BitoPro public API client.
///
/// Cheap to clone; clones share the HTTP connection pool and rate limiter.
#[derive(Clone)]
pub struct BitoProClient {
    base_url: String,
    locale: String,
    http: Client,
    rate_limiter: Arc<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
}

impl std::fmt::Debug for BitoProClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitoProClient")
            .field("base_url", &self.base_url)
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

impl BitoProClient {
    /// Creates a client from the exchange section of the configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                BitoProError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        let per_minute =
            NonZeroU32::new(config.requests_per_minute).unwrap_or(DEFAULT_REQUESTS_PER_MINUTE);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            locale: config.locale.clone(),
            http,
            rate_limiter,
        })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =========================================================================
    // Market data
    // =========================================================================

    /// Fetches OHLC candles for a pair.
    ///
    /// # Arguments
    /// * `pair` - Trading pair such as `btc_twd`, sent as-is
    /// * `resolution` - Candle resolution such as `1h`, sent as-is
    /// * `from` / `to` - Unix timestamps in seconds
    ///
    /// # Errors
    /// Returns [`BitoProError::Api`] with the captured exchange on a non-2xx
    /// response, or a transport error if no response arrived.
    pub async fn get_ohlc_data(
        &self,
        pair: &str,
        resolution: &str,
        from: i64,
        to: i64,
    ) -> Result<(Value, ExchangeRecord)> {
        self.get_ohlc(&OhlcQuery::new(pair, resolution, from, to))
            .await
    }

    /// Fetches OHLC candles for an arbitrary query, including out-of-range or absent bounds.
    ///
    /// # Errors
    /// Same as [`Self::get_ohlc_data`].
    pub async fn get_ohlc(&self, query: &OhlcQuery) -> Result<(Value, ExchangeRecord)> {
        self.get_json(&ohlc_path(&query.pair), query.params()).await
    }

    // =========================================================================
    // Provisioning
    // =========================================================================

    /// Fetches the fee schedule and order limits published for the configured locale.
    ///
    /// # Errors
    /// Returns an API or transport error, or a serialization error if the
    /// payload does not have the expected shape.
    pub async fn get_limitations_and_fees(&self) -> Result<(LimitationsAndFees, ExchangeRecord)> {
        let params = vec![("locale".to_string(), self.locale.clone())];
        let (body, record) = self
            .get_json("/provisioning/limitations-and-fees", params)
            .await?;
        let payload: LimitationsAndFees = serde_json::from_value(body)?;

        tracing::info!(
            trading_fee_rate = payload.trading_fee_rate.len(),
            order_limits = payload.order_fees_and_limitations.len(),
            withdrawal_fees = payload.restrictions_of_withdrawal_fees.len(),
            "Fetched limitations and fees"
        );

        Ok((payload, record))
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Waits for the rate limiter, issues a GET and captures the exchange.
    async fn get_json(
        &self,
        path: &str,
        params: Vec<(String, String)>,
    ) -> Result<(Value, ExchangeRecord)> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        let mut record = ExchangeRecord::new(RequestRecord::get(&url, params.clone()));

        tracing::info!(url = %url, params = ?params, "GET");

        let response = match self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .query(&params)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Request failed");
                return Err(e.into());
            }
        };

        let status = response.status();
        record.response.status = Some(status.as_u16());
        record.response.headers = header_map(response.headers());
        record.response.url = Some(response.url().to_string());

        if !status.is_success() {
            let body = match response.text().await {
                Ok(text) => ErrorBody::from_text(text),
                Err(_) => ErrorBody::Unavailable,
            };
            record.response.body = Some(body.to_value());
            tracing::error!(url = %url, status = status.as_u16(), body = %body, "API error response");
            return Err(BitoProError::api(status.as_u16(), body, record));
        }

        let text = response.text().await?;
        let body: Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Response body is not JSON");
                return Err(e.into());
            }
        };

        tracing::debug!(url = %url, body = %body, "Received response");
        record.response.body = Some(body.clone());

        Ok((body, record))
    }
}

/// Path for the OHLC endpoint; the pair is percent-encoded into one segment.
fn ohlc_path(pair: &str) -> String {
    format!("/trading-history/{}", urlencoding::encode(pair))
}
