use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::config::UpstreamConfig;
use crate::constants::CATALOG_API;
use crate::error::{Result, ScraperError};
use crate::observability::metrics;
use crate::types::CatalogApi;

/// Client for the retailer's product-listing search endpoint.
///
/// Sends one POST per fetch with a single bounded timeout and no retries.
pub struct SearchApiClient {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl SearchApiClient {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain;charset=UTF-8"));
        let agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| ScraperError::Config(format!("Invalid user agent: {}", e)))?;
        headers.insert(USER_AGENT, agent);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    /// Search request body for the configured category and page window.
    pub fn request_body(&self) -> Value {
        json!({
            "searchParameters": {
                "input": self.config.category,
                "type": "CATEGORY"
            },
            "isUserLoggedIn": false,
            "components": [{
                "component": "PRIMARY_AREA",
                "columns": 4,
                "types": {
                    "main": "PRODUCT",
                    "breakouts": ["PLANNER", "LOGIN_REMINDER", "MATTRESS_WARRANTY"]
                },
                "filterConfig": { "max-num-filters": 2 },
                "sort": "RELEVANCE",
                "window": {
                    "offset": self.config.window_offset,
                    "size": self.config.window_size
                }
            }]
        })
    }

    async fn post_search(&self) -> Result<(Value, usize)> {
        // The endpoint expects a JSON document sent as text/plain.
        let body = serde_json::to_string(&self.request_body())?;
        let response = self.client.post(&self.config.url).body(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::Api {
                message: format!("search endpoint returned HTTP {}", status),
            });
        }
        let bytes = response.bytes().await?;
        debug!("Received {} bytes from search endpoint", bytes.len());
        Ok((serde_json::from_slice(&bytes)?, bytes.len()))
    }
}

#[async_trait::async_trait]
impl CatalogApi for SearchApiClient {
    fn api_name(&self) -> &'static str {
        CATALOG_API
    }

    #[instrument(skip(self), fields(url = %self.config.url, category = %self.config.category))]
    async fn fetch_payload(&self) -> Result<Value> {
        let started = Instant::now();
        match self.post_search().await {
            Ok((payload, size)) => {
                let elapsed = started.elapsed().as_secs_f64();
                metrics::upstream::request_success(CATALOG_API, elapsed, size);
                info!("Fetched catalog page in {:.2}s", elapsed);
                Ok(payload)
            }
            Err(e) => {
                metrics::upstream::request_error(CATALOG_API);
                warn!("Catalog fetch failed: {}", e);
                Err(e)
            }
        }
    }
}
