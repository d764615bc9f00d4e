//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters, and
//! providing clear error messages for misconfiguration. Also hosts
//! the tracing bootstrap used by binaries and jobs that embed this
//! library.

use std::path::Path;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config: AppConfig = toml::from_str(&content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  info!(
    service = %config.service.name,
    chain_id = config.chain.chain_id,
    order_ttl = config.cache.order_ttl_seconds,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Initialize structured JSON logging for embedding processes.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(config: &AppConfig) {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(&config.service.log_level)
      }),
    )
    .json()
    .init();
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.service.name.is_empty(),
    "service.name must not be empty"
  );

  for (name, url) in [
    ("opensea_url", &config.api.opensea_url),
    ("looksrare_url", &config.api.looksrare_url),
    ("x2y2_url", &config.api.x2y2_url),
    ("nftport_url", &config.api.nftport_url),
    ("rpc_url", &config.chain.rpc_url),
  ] {
    anyhow::ensure!(!url.is_empty(), "api.{name} must not be empty");
    anyhow::ensure!(
      url.starts_with("http://") || url.starts_with("https://"),
      "api.{name} must be an http(s) URL, got {url}"
    );
  }

  anyhow::ensure!(
    config.api.timeout_seconds > 0,
    "api.timeout_seconds must be positive"
  );
  anyhow::ensure!(
    config.api.max_concurrent > 0,
    "api.max_concurrent must be positive"
  );
  anyhow::ensure!(
    config.api.requests_per_second > 0,
    "api.requests_per_second must be positive"
  );
  anyhow::ensure!(config.api.page_size > 0, "api.page_size must be positive");

  anyhow::ensure!(
    config.cache.order_ttl_seconds > 0,
    "cache.order_ttl_seconds must be positive"
  );
  anyhow::ensure!(
    config.cache.stats_ttl_seconds > 0,
    "cache.stats_ttl_seconds must be positive"
  );

  config
    .chain
    .marketplace_address
    .parse::<Address>()
    .with_context(|| {
      format!(
        "chain.marketplace_address is not a valid address: {}",
        config.chain.marketplace_address
      )
    })?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn minimal_toml() -> &'static str {
    r#"
      [service]
      name = "order-aggregator"

      [api]

      [chain]
      rpc_url = "https://eth.example.org"
      marketplace_address = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
    "#
  }

  #[test]
  fn minimal_config_parses_with_defaults() {
    let config: AppConfig = toml::from_str(minimal_toml()).unwrap();
    validate_config(&config).unwrap();
    assert_eq!(config.service.log_level, "info");
    assert_eq!(config.api.page_size, 50);
    assert_eq!(config.cache.order_ttl_seconds, 600);
    assert_eq!(config.cache.stats_ttl_seconds, 3600);
    assert_eq!(config.chain.chain_id, 1);
    assert!(config.keys.opensea.is_empty());
  }

  #[test]
  fn bad_marketplace_address_is_rejected() {
    let mut config: AppConfig = toml::from_str(minimal_toml()).unwrap();
    config.chain.marketplace_address = "0x1234".into();
    assert!(validate_config(&config).is_err());
  }

  #[test]
  fn non_http_url_is_rejected() {
    let mut config: AppConfig = toml::from_str(minimal_toml()).unwrap();
    config.api.opensea_url = "ftp://api.opensea.io".into();
    assert!(validate_config(&config).is_err());
  }
}
