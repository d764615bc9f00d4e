//! NFTPort Adapter - Token Metadata and Collection Statistics
//!
//! NFTPort is not an order book; it backs the metadata and stats
//! lookups with its own cache policy (details for ten minutes, stats
//! for an hour). Lookups degrade to `None` rather than failing the
//! caller.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::adapters::http::{ApiKeyRing, HttpClientConfig, MarketplaceHttp};
use crate::config::AppConfig;
use crate::error::FetchError;
use crate::ports::cache::{CacheKey, CacheStore};

const DETAIL_TTL: Duration = Duration::from_secs(600);

/// Token-level metadata as served by the `/nfts/{contract}/{token}`
/// endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftDetails {
  pub metadata_url: Option<String>,
  pub cached_file_url: Option<String>,
  pub status_message: Option<String>,
}

/// Collection trading statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractStatistics {
  pub one_day_volume: Option<f64>,
  pub one_day_sales: Option<u64>,
  pub seven_day_volume: Option<f64>,
  pub thirty_day_volume: Option<f64>,
  pub total_volume: Option<f64>,
  pub total_sales: Option<u64>,
  pub floor_price: Option<f64>,
  pub average_price: Option<f64>,
  pub total_supply: Option<u64>,
  pub num_owners: Option<u64>,
  pub market_cap: Option<f64>,
}

// ---- Wire schema ----

#[derive(Debug, Deserialize)]
struct NftDetailResponse {
  response: Option<String>,
  nft: Option<NftDetailDoc>,
}

#[derive(Debug, Deserialize)]
struct NftDetailDoc {
  metadata_url: Option<String>,
  cached_file_url: Option<String>,
  status_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatisticsResponse {
  response: Option<String>,
  statistics: Option<ContractStatistics>,
}

/// Client for the NFTPort REST API.
pub struct NftPortClient {
  http: MarketplaceHttp,
  cache: Arc<dyn CacheStore>,
  detail_ttl: Duration,
  stats_ttl: Duration,
}

impl NftPortClient {
  pub fn new(config: &AppConfig, cache: Arc<dyn CacheStore>) -> anyhow::Result<Self> {
    let http = MarketplaceHttp::new(
      HttpClientConfig {
        base_url: config.api.nftport_url.clone(),
        timeout: Duration::from_secs(config.api.timeout_seconds),
        max_concurrent: config.api.max_concurrent,
        max_retries: config.api.max_retries,
        retry_base_delay: Duration::from_millis(config.api.retry_base_delay_ms),
        requests_per_second: config.api.requests_per_second,
      },
      (!config.keys.nftport.is_empty())
        .then(|| ApiKeyRing::new("Authorization", config.keys.nftport.clone())),
    )?;

    Ok(Self {
      http,
      cache,
      detail_ttl: DETAIL_TTL,
      stats_ttl: Duration::from_secs(config.cache.stats_ttl_seconds),
    })
  }

  /// Map a chain id onto the `chain` query value NFTPort expects.
  fn chain_from_id(chain_id: &str) -> Option<&'static str> {
    match chain_id {
      "1" => Some("ethereum"),
      "5" => Some("goerli"),
      "137" => Some("polygon"),
      _ => None,
    }
  }

  /// NFTPort addresses tokens in decimal, not hex.
  fn token_id_decimal(token_id: &str) -> Option<String> {
    let value = if let Some(hex) = token_id.strip_prefix("0x") {
      U256::from_str_radix(hex, 16).ok()?
    } else {
      U256::from_str_radix(token_id, 10).ok()?
    };
    Some(value.to_string())
  }

  /// Token metadata, cached for ten minutes.
  pub async fn nft_details(
    &self,
    contract: &str,
    token_id: &str,
    chain_id: &str,
  ) -> Option<NftDetails> {
    let chain = Self::chain_from_id(chain_id)?;
    let token_decimal = Self::token_id_decimal(token_id)?;
    let cache_key = format!(
      "{}_{chain_id}_{}_{}",
      CacheKey::NftDetail.prefix(),
      contract.to_lowercase(),
      token_decimal,
    );

    if let Some(cached) = self.cache.get(&cache_key).await {
      if let Ok(details) = serde_json::from_str::<NftDetails>(&cached) {
        return Some(details);
      }
    }

    let path = format!("/nfts/{contract}/{token_decimal}");
    let query = vec![("chain", chain.to_string())];
    let body: NftDetailResponse = match self.http.get_json(&path, &query).await {
      Ok(body) => body,
      Err(FetchError::Api { status }) => {
        debug!(status, contract, token_id, "NFTPort has no record of this token");
        return None;
      }
      Err(e) => {
        warn!(error = %e, contract, token_id, "NFTPort detail lookup failed");
        return None;
      }
    };

    if body.response.as_deref().is_some_and(|r| r != "OK") {
      return None;
    }
    let doc = body.nft?;
    let details = NftDetails {
      metadata_url: doc.metadata_url,
      cached_file_url: doc.cached_file_url,
      status_message: doc.status_message,
    };

    if let Ok(serialized) = serde_json::to_string(&details) {
      self.cache.set(&cache_key, &serialized, self.detail_ttl).await;
    }
    Some(details)
  }

  /// Collection trading statistics, cached for an hour.
  pub async fn contract_statistics(
    &self,
    contract: &str,
    chain_id: &str,
  ) -> Option<ContractStatistics> {
    let chain = Self::chain_from_id(chain_id)?;
    let cache_key = format!(
      "{}_{chain_id}_{}",
      CacheKey::CollectionStats.prefix(),
      contract.to_lowercase(),
    );

    if let Some(cached) = self.cache.get(&cache_key).await {
      if let Ok(stats) = serde_json::from_str::<ContractStatistics>(&cached) {
        return Some(stats);
      }
    }

    let path = format!("/transactions/stats/{contract}");
    let query = vec![("chain", chain.to_string())];
    let body: StatisticsResponse = match self.http.get_json(&path, &query).await {
      Ok(body) => body,
      Err(FetchError::Api { status }) => {
        debug!(status, contract, "NFTPort has no statistics for this contract");
        return None;
      }
      Err(e) => {
        warn!(error = %e, contract, "NFTPort statistics lookup failed");
        return None;
      }
    };

    if body.response.as_deref().is_some_and(|r| r != "OK") {
      return None;
    }
    let stats = body.statistics?;

    if let Ok(serialized) = serde_json::to_string(&stats) {
      self.cache.set(&cache_key, &serialized, self.stats_ttl).await;
    }
    Some(stats)
  }
}
