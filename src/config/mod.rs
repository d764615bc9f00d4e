//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml`. All
//! marketplace endpoints, API keys, TTLs, and the marketplace
//! contract address are externalized here - nothing is hardcoded in
//! the domain layer.

pub mod loader;

use serde::Deserialize;

/// Top-level configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before any component is constructed.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and logging.
  pub service: ServiceConfig,
  /// Marketplace API endpoints and HTTP behavior.
  pub api: ApiConfig,
  /// Per-marketplace API key rings.
  #[serde(default)]
  pub keys: ApiKeyConfig,
  /// Cache TTLs.
  #[serde(default)]
  pub cache: CacheConfig,
  /// Chain RPC and marketplace contract.
  pub chain: ChainConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// Human-readable service name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// Marketplace API endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// OpenSea v2 REST base URL.
  #[serde(default = "default_opensea_url")]
  pub opensea_url: String,
  /// OpenSea testnet base URL (goerli and friends).
  #[serde(default = "default_opensea_testnet_url")]
  pub opensea_testnet_url: String,
  /// LooksRare REST base URL.
  #[serde(default = "default_looksrare_url")]
  pub looksrare_url: String,
  /// LooksRare testnet base URL.
  #[serde(default = "default_looksrare_testnet_url")]
  pub looksrare_testnet_url: String,
  /// X2Y2 REST base URL.
  #[serde(default = "default_x2y2_url")]
  pub x2y2_url: String,
  /// X2Y2 testnet base URL.
  #[serde(default = "default_x2y2_testnet_url")]
  pub x2y2_testnet_url: String,
  /// NFTPort metadata/statistics base URL.
  #[serde(default = "default_nftport_url")]
  pub nftport_url: String,
  /// Per-request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
  /// Maximum retries on transient errors.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  #[serde(default = "default_retry_base_delay")]
  pub retry_base_delay_ms: u64,
  /// Maximum concurrent requests per marketplace.
  #[serde(default = "default_max_concurrent")]
  pub max_concurrent: usize,
  /// Outbound request budget per second per marketplace.
  #[serde(default = "default_requests_per_second")]
  pub requests_per_second: u32,
  /// Page size for paginated order queries.
  #[serde(default = "default_page_size")]
  pub page_size: usize,
}

/// API key rings, rotated round-robin to spread rate budgets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeyConfig {
  #[serde(default)]
  pub opensea: Vec<String>,
  #[serde(default)]
  pub looksrare: Vec<String>,
  #[serde(default)]
  pub x2y2: Vec<String>,
  #[serde(default)]
  pub nftport: Vec<String>,
}

/// Cache TTL configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// TTL for live order book responses (~10 minutes).
  #[serde(default = "default_order_ttl")]
  pub order_ttl_seconds: u64,
  /// TTL for slow-moving metadata/statistics (~60 minutes).
  #[serde(default = "default_stats_ttl")]
  pub stats_ttl_seconds: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      order_ttl_seconds: default_order_ttl(),
      stats_ttl_seconds: default_stats_ttl(),
    }
  }
}

/// Chain RPC configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
  /// JSON-RPC endpoint URL.
  pub rpc_url: String,
  /// Expected chain id, validated at connect time.
  #[serde(default = "default_chain_id")]
  pub chain_id: u64,
  /// Our marketplace contract, source of Cancel events.
  pub marketplace_address: String,
  /// How long the validator waits for a receipt.
  #[serde(default = "default_receipt_timeout")]
  pub receipt_timeout_seconds: u64,
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_opensea_url() -> String {
  "https://api.opensea.io/v2".to_string()
}

fn default_opensea_testnet_url() -> String {
  "https://testnets-api.opensea.io/v2".to_string()
}

fn default_looksrare_url() -> String {
  "https://api.looksrare.org".to_string()
}

fn default_looksrare_testnet_url() -> String {
  "https://api-goerli.looksrare.org".to_string()
}

fn default_x2y2_url() -> String {
  "https://api.x2y2.org".to_string()
}

fn default_x2y2_testnet_url() -> String {
  "https://goerli-api.x2y2.org".to_string()
}

fn default_nftport_url() -> String {
  "https://api.nftport.xyz/v0".to_string()
}

fn default_timeout() -> u64 {
  30
}

fn default_max_retries() -> u32 {
  3
}

fn default_retry_base_delay() -> u64 {
  200
}

fn default_max_concurrent() -> usize {
  10
}

fn default_requests_per_second() -> u32 {
  5
}

fn default_page_size() -> usize {
  50
}

fn default_order_ttl() -> u64 {
  600
}

fn default_stats_ttl() -> u64 {
  3600
}

fn default_chain_id() -> u64 {
  1
}

fn default_receipt_timeout() -> u64 {
  60
}
