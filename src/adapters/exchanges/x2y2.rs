//! X2Y2 Adapter - v1 Order and Offer Endpoints
//!
//! Listings come from `/v1/orders` sorted price-ascending, offers
//! from `/v1/offers` sorted price-descending, matching how the
//! upstream ranks its own result sets.

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
struct X2Y2Response {
  #[serde(default)]
  data: Vec<X2Y2Order>,
}

#[derive(Debug, Deserialize)]
struct X2Y2Order {
  id: u64,
  item_hash: String,
  maker: String,
  taker: Option<String>,
  price: String,
  currency: String,
  created_at: i64,
  end_at: i64,
  #[serde(default)]
  amount: Option<u64>,
  status: Option<String>,
  token: X2Y2Token,
}

#[derive(Debug, Deserialize)]
struct X2Y2Token {
  contract: String,
  token_id: Option<String>,
  /// "erc721" or "erc1155".
  erc_type: Option<String>,
}

/// Adapter for the X2Y2 v1 REST API.
pub struct X2Y2Adapter {
  mainnet: MarketplaceHttp,
  testnet: MarketplaceHttp,
  order_ttl: Duration,
  page_size: usize,
}

impl X2Y2Adapter {
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
      (!keys.is_empty()).then(|| ApiKeyRing::new("X-API-Key", keys.to_vec()))
    };

    Ok(Self {
      mainnet: MarketplaceHttp::new(
        http_config(&config.api.x2y2_url),
        ring(&config.keys.x2y2),
      )?,
      testnet: MarketplaceHttp::new(
        http_config(&config.api.x2y2_testnet_url),
        ring(&config.keys.x2y2),
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

  fn normalize(doc: &X2Y2Order, side: OrderSide) -> Option<Order> {
    if doc.status.as_deref().is_some_and(|s| s != "open") {
      return None;
    }

    let asset_class = match doc.token.erc_type.as_deref() {
      Some("erc1155") => AssetClass::Erc1155,
      _ => AssetClass::Erc721,
    };
    let assets = vec![OrderAsset {
      contract_address: checksum_address(&doc.token.contract)?,
      token_id: token_id_hex(doc.token.token_id.as_deref().unwrap_or("0"))?,
      quantity: doc.amount.unwrap_or(1),
      asset_class,
    }];

    let order = Order {
      exchange: Exchange::X2Y2,
      order_hash: doc.item_hash.clone(),
      maker_address: Some(checksum_address(&doc.maker)?),
      taker_address: doc.taker.as_deref().and_then(checksum_address),
      assets,
      price: doc.price.clone(),
      currency: checksum_address(&doc.currency)?,
      start: doc.created_at,
      end: doc.end_at,
      nonce: Some(doc.id.to_string()),
      salt: None,
      protocol_signature: None,
      side,
    };
    order.is_well_formed().then_some(order)
  }
}

#[async_trait]
impl ExchangeAdapter for X2Y2Adapter {
  fn exchange(&self) -> Exchange {
    Exchange::X2Y2
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
    let (path, direction) = match side {
      OrderSide::Listing => ("/v1/orders", "asc"),
      OrderSide::Offer => ("/v1/offers", "desc"),
    };
    let query: Vec<(&str, String)> = vec![
      ("contract", request.contract.clone()),
      ("token_id", request.token_id.clone()),
      ("limit", self.page_size.to_string()),
      ("sort", "price".into()),
      ("direction", direction.into()),
    ];

    let page: X2Y2Response = match self
      .client_for(&request.chain_id)
      .get_json(path, &query)
      .await
    {
      Ok(page) => page,
      Err(FetchError::Api { status }) => {
        debug!(status, contract = %request.contract, "X2Y2 returned no orders");
        return Ok(vec![]);
      }
      Err(FetchError::Schema(msg)) => {
        warn!(error = %msg, "X2Y2 response failed schema validation");
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
