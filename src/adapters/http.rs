//! Marketplace HTTP Client - Rate-limited REST Client
//!
//! Wraps reqwest with request pacing, bounded concurrency, API-key
//! rotation, and one shared retry policy (max attempts, exponential
//! backoff with jitter, explicit retryable-vs-terminal
//! classification). Every exchange adapter goes through this client
//! instead of rolling its own retry loop.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::FetchError;

/// Configuration for one marketplace's HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
  /// Base URL for the marketplace API.
  pub base_url: String,
  /// Request timeout.
  pub timeout: Duration,
  /// Maximum concurrent requests.
  pub max_concurrent: usize,
  /// Maximum retries on transient errors.
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
  /// Outbound request budget per second.
  pub requests_per_second: u32,
}

impl Default for HttpClientConfig {
  fn default() -> Self {
    Self {
      base_url: String::new(),
      timeout: Duration::from_secs(30),
      max_concurrent: 10,
      max_retries: 3,
      retry_base_delay: Duration::from_millis(200),
      requests_per_second: 5,
    }
  }
}

/// Round-robin API key ring.
///
/// Rotating through multiple keys spreads load across rate budgets;
/// this is adapter-local and invisible to the aggregator.
#[derive(Debug)]
pub struct ApiKeyRing {
  /// Header the marketplace expects the key in.
  header: String,
  keys: Vec<String>,
  cursor: AtomicUsize,
}

impl ApiKeyRing {
  pub fn new(header: impl Into<String>, keys: Vec<String>) -> Self {
    Self {
      header: header.into(),
      keys,
      cursor: AtomicUsize::new(0),
    }
  }

  /// Next (header, key) pair, or `None` when no keys are configured.
  pub fn next(&self) -> Option<(&str, &str)> {
    if self.keys.is_empty() {
      return None;
    }
    let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.keys.len();
    Some((self.header.as_str(), self.keys[idx].as_str()))
  }
}

/// Rate-limited HTTP client shared by the exchange adapters.
pub struct MarketplaceHttp {
  http: Client,
  config: HttpClientConfig,
  keys: Option<ApiKeyRing>,
  semaphore: Arc<Semaphore>,
  limiter: DefaultDirectRateLimiter,
}

impl MarketplaceHttp {
  /// Create a new client for one marketplace.
  pub fn new(config: HttpClientConfig, keys: Option<ApiKeyRing>) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(5)
      .build()
      .context("Failed to build HTTP client")?;

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent));
    let rps = NonZeroU32::new(config.requests_per_second.max(1))
      .unwrap_or(NonZeroU32::MIN);
    let limiter = RateLimiter::direct(Quota::per_second(rps));

    Ok(Self {
      http,
      config,
      keys,
      semaphore,
      limiter,
    })
  }

  pub fn base_url(&self) -> &str {
    &self.config.base_url
  }

  /// GET a JSON document with pacing, key rotation, and retries.
  ///
  /// Classification:
  /// - 2xx: decoded into `T` (decode failure => `FetchError::Schema`)
  /// - 429 / 5xx / transport failure: retried with backoff, then
  ///   `FetchError::Transient`
  /// - other 4xx: `FetchError::Api`, terminal
  pub async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T, FetchError> {
    let _permit = self
      .semaphore
      .acquire()
      .await
      .map_err(|_| FetchError::Transient("client shut down".into()))?;

    let url = format!("{}{}", self.config.base_url, path);
    let mut last_error = String::new();

    for attempt in 0..=self.config.max_retries {
      if attempt > 0 {
        let backoff = self.config.retry_base_delay * 2u32.pow(attempt - 1);
        let jitter_ms = {
          use rand::Rng;
          rand::thread_rng()
            .gen_range(0..=self.config.retry_base_delay.as_millis() as u64)
        };
        let delay = backoff + Duration::from_millis(jitter_ms);
        debug!(attempt, delay_ms = delay.as_millis() as u64, url = %url, "Retrying request");
        sleep(delay).await;
      }

      self.limiter.until_ready().await;

      let mut request = self.http.get(&url).query(query);
      if let Some(ring) = &self.keys {
        if let Some((header, key)) = ring.next() {
          request = request.header(header, key);
        }
      }

      match request.send().await {
        Ok(response) => {
          let status = response.status();
          if status.is_success() {
            return response
              .json::<T>()
              .await
              .map_err(|e| FetchError::Schema(e.to_string()));
          }
          if status.as_u16() == 429 || status.is_server_error() {
            warn!(status = %status, url = %url, attempt, "Marketplace error, retrying");
            last_error = format!("status {status}");
            continue;
          }
          // Remaining 4xx: "no matching orders", terminal.
          return Err(FetchError::Api {
            status: status.as_u16(),
          });
        }
        Err(e) => {
          warn!(error = %e, url = %url, attempt, "Request failed");
          last_error = e.to_string();
          continue;
        }
      }
    }

    Err(FetchError::Transient(last_error))
  }
}
