//! Remote price catalog API client
//!
//! Thin wrapper over the four read-only catalog endpoints. No retries and
//! no backoff: a non-2xx response or transport failure surfaces
//! immediately and callers decide on fallback. Requests are spaced by an
//! interval rate limiter to stay inside the public-tier request budget.

use crate::models::{CatalogItem, PriceDetail};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

const DEFAULT_BASE_URL: &str = "https://fipe.parallelum.com.br/api/v2";
const DEFAULT_VEHICLE_TYPE: &str = "cars";
const USER_AGENT: &str = "garagem/0.1.0 (https://github.com/garagem/garagem)";
const SUBSCRIPTION_TOKEN_HEADER: &str = "X-Subscription-Token";
const RATE_LIMIT_MS: u64 = 350;

/// Catalog client errors
#[derive(Debug, Error)]
pub enum FipeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Catalog resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Read-only view of the remote price catalog
///
/// `FipeClient` is the production implementation; tests substitute a stub.
pub trait CatalogSource: Send + Sync {
    fn brands(&self) -> BoxFuture<'_, Result<Vec<CatalogItem>, FipeError>>;

    fn models<'a>(&'a self, brand_code: &'a str)
        -> BoxFuture<'a, Result<Vec<CatalogItem>, FipeError>>;

    fn years<'a>(
        &'a self,
        brand_code: &'a str,
        model_code: &'a str,
    ) -> BoxFuture<'a, Result<Vec<CatalogItem>, FipeError>>;

    fn price<'a>(
        &'a self,
        brand_code: &'a str,
        model_code: &'a str,
        year_code: &'a str,
    ) -> BoxFuture<'a, Result<PriceDetail, FipeError>>;
}

/// Interval rate limiter spacing consecutive requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with the request spacing
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Catalog rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Price catalog API client
pub struct FipeClient {
    http_client: reqwest::Client,
    base_url: String,
    vehicle_type: String,
    token: Option<String>,
    rate_limiter: Arc<RateLimiter>,
}

impl FipeClient {
    /// Build a client against the default public catalog endpoint
    pub fn new(token: Option<String>) -> Result<Self, FipeError> {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), token)
    }

    /// Build a client against a specific base URL (config override, tests)
    pub fn with_base_url(base_url: String, token: Option<String>) -> Result<Self, FipeError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FipeError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            vehicle_type: DEFAULT_VEHICLE_TYPE.to_string(),
            token,
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
        })
    }

    /// List all brands
    pub async fn fetch_brands(&self) -> Result<Vec<CatalogItem>, FipeError> {
        let url = format!("{}/{}/brands", self.base_url, self.vehicle_type);
        self.get_json(&url).await
    }

    /// List models of one brand
    pub async fn fetch_models(&self, brand_code: &str) -> Result<Vec<CatalogItem>, FipeError> {
        let url = format!(
            "{}/{}/brands/{}/models",
            self.base_url, self.vehicle_type, brand_code
        );
        self.get_json(&url).await
    }

    /// List year/version entries of one model
    pub async fn fetch_years(
        &self,
        brand_code: &str,
        model_code: &str,
    ) -> Result<Vec<CatalogItem>, FipeError> {
        let url = format!(
            "{}/{}/brands/{}/models/{}/years",
            self.base_url, self.vehicle_type, brand_code, model_code
        );
        self.get_json(&url).await
    }

    /// Price detail for a fully-qualified selection
    pub async fn fetch_price(
        &self,
        brand_code: &str,
        model_code: &str,
        year_code: &str,
    ) -> Result<PriceDetail, FipeError> {
        let url = format!(
            "{}/{}/brands/{}/models/{}/years/{}",
            self.base_url, self.vehicle_type, brand_code, model_code, year_code
        );
        self.get_json(&url).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FipeError> {
        self.rate_limiter.wait().await;

        tracing::debug!(url = %url, "Querying price catalog API");

        let mut request = self.http_client.get(url);
        if let Some(token) = &self.token {
            request = request.header(SUBSCRIPTION_TOKEN_HEADER, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FipeError::Network(e.to_string()))?;

        let status = response.status();

        if status == 404 {
            return Err(FipeError::NotFound(url.to_string()));
        }

        if status == 429 {
            return Err(FipeError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FipeError::Api(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| FipeError::Parse(e.to_string()))
    }
}

impl CatalogSource for FipeClient {
    fn brands(&self) -> BoxFuture<'_, Result<Vec<CatalogItem>, FipeError>> {
        Box::pin(self.fetch_brands())
    }

    fn models<'a>(
        &'a self,
        brand_code: &'a str,
    ) -> BoxFuture<'a, Result<Vec<CatalogItem>, FipeError>> {
        Box::pin(self.fetch_models(brand_code))
    }

    fn years<'a>(
        &'a self,
        brand_code: &'a str,
        model_code: &'a str,
    ) -> BoxFuture<'a, Result<Vec<CatalogItem>, FipeError>> {
        Box::pin(self.fetch_years(brand_code, model_code))
    }

    fn price<'a>(
        &'a self,
        brand_code: &'a str,
        model_code: &'a str,
        year_code: &'a str,
    ) -> BoxFuture<'a, Result<PriceDetail, FipeError>> {
        Box::pin(self.fetch_price(brand_code, model_code, year_code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = FipeClient::new(None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            FipeClient::with_base_url("https://fipe.example.com/api/v2/".to_string(), None)
                .unwrap();
        assert_eq!(client.base_url, "https://fipe.example.com/api/v2");
    }

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(350);
        assert_eq!(limiter.min_interval, Duration::from_millis(350));
    }

    #[tokio::test]
    async fn test_rate_limiter_timing() {
        let limiter = RateLimiter::new(100);

        let start = Instant::now();

        // First request passes immediately
        limiter.wait().await;
        let first_elapsed = start.elapsed();

        // Second request waits out the interval
        limiter.wait().await;
        let second_elapsed = start.elapsed();

        assert!(first_elapsed < Duration::from_millis(50));
        assert!(second_elapsed >= Duration::from_millis(90));
    }
}
