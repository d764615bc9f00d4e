//! LooksRare Adapter - v2 Order API
//!
//! Queries `/api/v2/orders` with `quoteType` selecting asks
//! (listings) versus bids (offers). LooksRare serves mainnet and
//! goerli; other chains short-circuit to an empty result.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::adapters::http::{ApiKeyRing, HttpClientConfig, MarketplaceHttp};
use crate::config::AppConfig;
use crate::domain::nft::{checksum_address, token_id_hex};
use crate::domain::order::{
  AssetClass, Exchange, Order, OrderAsset, OrderRequest, OrderSide,
};
use crate::error::FetchError;
use crate::ports::exchange::ExchangeAdapter;

// ---- Wire schema ----

#[derive(Debug, Deserialize)]
struct LooksRareResponse {
  #[serde(default)]
  data: Vec<LooksRareOrderV2>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LooksRareOrderV2 {
  hash: String,
  /// 1 = ask (listing), 0 = bid (offer).
  quote_type: u8,
  signer: String,
  collection: String,
  currency: String,
  start_time: i64,
  end_time: i64,
  price: String,
  #[serde(default)]
  item_ids: Vec<String>,
  #[serde(default)]
  amounts: Vec<String>,
  global_nonce: String,
  /// 0 = ERC-721, 1 = ERC-1155.
  collection_type: Option<u8>,
  signature: Option<String>,
  status: Option<String>,
}

/// Adapter for the LooksRare v2 REST API.
pub struct LooksRareAdapter {
  mainnet: MarketplaceHttp,
  testnet: MarketplaceHttp,
  order_ttl: Duration,
  page_size: usize,
}

impl LooksRareAdapter {
  pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
    let http_config = |base_url: &str| HttpClientConfig {
      base_url: base_url.to_string(),
      timeout: Duration::from_secs(config.api.timeout_seconds),
      max_concurrent: config.api.max_concurrent,
      max_retries: config.api.max_retries,
      retry_base_delay: Duration::from_millis(config.api.retry_base_delay_ms),
      requests_per_second: config.api.requests_per_second,
    };
    let ring = |keys: &[String]| {
      (!keys.is_empty()).then(|| ApiKeyRing::new("X-Looks-Api-Key", keys.to_vec()))
    };

    Ok(Self {
      mainnet: MarketplaceHttp::new(
        http_config(&config.api.looksrare_url),
        ring(&config.keys.looksrare),
      )?,
      testnet: MarketplaceHttp::new(
        http_config(&config.api.looksrare_testnet_url),
        ring(&config.keys.looksrare),
      )?,
      order_ttl: Duration::from_secs(config.cache.order_ttl_seconds),
      page_size: config.api.page_size,
    })
  }

  fn client_for(&self, chain_id: &str) -> &MarketplaceHttp {
    if chain_id == "5" {
      &self.testnet
    } else {
      &self.mainnet
    }
  }

  fn normalize(doc: &LooksRareOrderV2, side: OrderSide) -> Option<Order> {
    if doc.status.as_deref().is_some_and(|s| s != "VALID") {
      return None;
    }
    let expected_quote = if side == OrderSide::Listing { 1 } else { 0 };
    if doc.quote_type != expected_quote {
      return None;
    }

    let collection = checksum_address(&doc.collection)?;
    let asset_class = match doc.collection_type {
      Some(1) => AssetClass::Erc1155,
      _ => AssetClass::Erc721,
    };
    let assets: Vec<OrderAsset> = doc
      .item_ids
      .iter()
      .enumerate()
      .filter_map(|(i, raw_id)| {
        Some(OrderAsset {
          contract_address: collection.clone(),
          token_id: token_id_hex(raw_id)?,
          quantity: doc
            .amounts
            .get(i)
            .and_then(|a| a.parse().ok())
            .unwrap_or(1),
          asset_class,
        })
      })
      .collect();

    let order = Order {
      exchange: Exchange::LooksRare,
      order_hash: doc.hash.clone(),
      maker_address: Some(checksum_address(&doc.signer)?),
      taker_address: None,
      assets,
      price: doc.price.clone(),
      currency: checksum_address(&doc.currency)?,
      start: doc.start_time,
      end: doc.end_time,
      nonce: Some(doc.global_nonce.clone()),
      salt: None,
      protocol_signature: doc.signature.clone(),
      side,
    };
    order.is_well_formed().then_some(order)
  }
}

#[async_trait]
impl ExchangeAdapter for LooksRareAdapter {
  fn exchange(&self) -> Exchange {
    Exchange::LooksRare
  }

  fn order_ttl(&self) -> Duration {
    self.order_ttl
  }

  fn supports_chain(&self, chain_id: &str) -> bool {
    chain_id == "1" || chain_id == "5"
  }

  async fn fetch_orders(
    &self,
    request: &OrderRequest,
    side: OrderSide,
  ) -> Result<Vec<Order>, FetchError> {
    let (quote_type, sort) = match side {
      OrderSide::Listing => ("1", "PRICE_ASC"),
      OrderSide::Offer => ("0", "PRICE_DESC"),
    };
    let query: Vec<(&str, String)> = vec![
      ("quoteType", quote_type.into()),
      ("collection", request.contract.clone()),
      ("itemId", request.token_id.clone()),
      ("status", "VALID".into()),
      ("sort", sort.into()),
      ("pagination[first]", self.page_size.to_string()),
    ];

    let page: LooksRareResponse = match self
      .client_for(&request.chain_id)
      .get_json("/api/v2/orders", &query)
      .await
    {
      Ok(page) => page,
      Err(FetchError::Api { status }) => {
        debug!(status, contract = %request.contract, "LooksRare returned no orders");
        return Ok(vec![]);
      }
      Err(FetchError::Schema(msg)) => {
        warn!(error = %msg, "LooksRare response failed schema validation");
        return Ok(vec![]);
      }
      Err(e) => return Err(e),
    };

    Ok(
      page
        .data
        .iter()
        .filter_map(|doc| Self::normalize(doc, side))
        .collect(),
    )
  }
}
