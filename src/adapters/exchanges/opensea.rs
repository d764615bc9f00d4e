//! OpenSea Adapter - Seaport Order Books
//!
//! Talks to the OpenSea v2 REST API (`/orders/{network}/seaport/*`)
//! and normalizes Seaport order documents. Listings price from the
//! consideration side (what the buyer pays), offers price from the
//! offer side (the ERC-20 the bidder escrows).

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use super::StringOrNumber;
use crate::adapters::http::{ApiKeyRing, HttpClientConfig, MarketplaceHttp};
use crate::config::AppConfig;
use crate::domain::nft::{checksum_address, token_id_hex};
use crate::domain::order::{
  AssetClass, Exchange, Order, OrderAsset, OrderRequest, OrderSide,
};
use crate::error::FetchError;
use crate::ports::exchange::ExchangeAdapter;

const TESTNET_CHAIN_IDS: &[&str] = &["4", "5"];
/// Upper bound on continuation-token pages walked per request.
const MAX_ORDER_PAGES: usize = 3;

// ---- Wire schema (strict subset of the v2 payload) ----

#[derive(Debug, Deserialize)]
struct SeaportOrdersResponse {
  #[serde(default)]
  orders: Vec<SeaportOrder>,
  next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeaportOrder {
  order_hash: String,
  #[serde(default)]
  cancelled: bool,
  #[serde(default)]
  finalized: bool,
  #[serde(default)]
  marked_invalid: bool,
  taker: Option<AccountStub>,
  protocol_data: SeaportProtocolData,
}

#[derive(Debug, Deserialize)]
struct AccountStub {
  address: String,
}

#[derive(Debug, Deserialize)]
struct SeaportProtocolData {
  parameters: SeaportParameters,
  signature: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeaportParameters {
  offerer: String,
  #[serde(default)]
  offer: Vec<SeaportItem>,
  #[serde(default)]
  consideration: Vec<SeaportItem>,
  start_time: StringOrNumber,
  end_time: StringOrNumber,
  salt: Option<String>,
  // Seaport 1.4 moved counters from numbers to strings.
  counter: Option<StringOrNumber>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeaportItem {
  item_type: u8,
  token: String,
  identifier_or_criteria: String,
  start_amount: String,
}

/// Adapter for the OpenSea v2 REST API.
pub struct OpenSeaAdapter {
  mainnet: MarketplaceHttp,
  testnet: MarketplaceHttp,
  order_ttl: Duration,
  page_size: usize,
}

impl OpenSeaAdapter {
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
      (!keys.is_empty()).then(|| ApiKeyRing::new("X-API-KEY", keys.to_vec()))
    };

    Ok(Self {
      mainnet: MarketplaceHttp::new(
        http_config(&config.api.opensea_url),
        ring(&config.keys.opensea),
      )?,
      testnet: MarketplaceHttp::new(
        http_config(&config.api.opensea_testnet_url),
        ring(&config.keys.opensea),
      )?,
      order_ttl: Duration::from_secs(config.cache.order_ttl_seconds),
      page_size: config.api.page_size,
    })
  }

  fn client_for(&self, chain_id: &str) -> &MarketplaceHttp {
    if TESTNET_CHAIN_IDS.contains(&chain_id) {
      &self.testnet
    } else {
      &self.mainnet
    }
  }

  fn network_path(chain_id: &str) -> &'static str {
    if chain_id == "1" { "ethereum" } else { "goerli" }
  }

  /// Map a Seaport document onto the canonical order, or drop it.
  fn normalize(doc: &SeaportOrder, side: OrderSide) -> Option<Order> {
    if doc.cancelled || doc.finalized || doc.marked_invalid {
      return None;
    }
    let params = &doc.protocol_data.parameters;
    let maker = checksum_address(&params.offerer)?;
    let taker = doc
      .taker
      .as_ref()
      .and_then(|t| checksum_address(&t.address));

    // NFT legs sit on the offer side for listings and on the
    // consideration side for bids.
    let (nft_items, payment_items) = match side {
      OrderSide::Listing => (&params.offer, &params.consideration),
      OrderSide::Offer => (&params.consideration, &params.offer),
    };

    let assets: Vec<OrderAsset> = nft_items
      .iter()
      .filter_map(|item| {
        let asset_class = match item.item_type {
          2 | 4 => AssetClass::Erc721,
          3 | 5 => AssetClass::Erc1155,
          _ => return None,
        };
        Some(OrderAsset {
          contract_address: checksum_address(&item.token)?,
          token_id: token_id_hex(&item.identifier_or_criteria)?,
          quantity: item.start_amount.parse().unwrap_or(1),
          asset_class,
        })
      })
      .collect();

    // Listing price is the sum of all consideration legs (sale
    // proceeds plus fees); bid price is the escrowed ERC-20 amount.
    let price = match side {
      OrderSide::Listing => payment_items
        .iter()
        .filter_map(|c| c.start_amount.parse::<Decimal>().ok())
        .sum::<Decimal>()
        .to_string(),
      OrderSide::Offer => payment_items
        .first()
        .map(|o| o.start_amount.clone())?,
    };
    let currency = checksum_address(&payment_items.first()?.token)?;

    let order = Order {
      exchange: Exchange::OpenSea,
      order_hash: doc.order_hash.clone(),
      maker_address: Some(maker),
      taker_address: taker,
      assets,
      price,
      currency,
      start: params.start_time.as_i64()?,
      end: params.end_time.as_i64()?,
      nonce: params.counter.as_ref().map(StringOrNumber::to_plain_string),
      salt: params.salt.clone(),
      protocol_signature: doc.protocol_data.signature.clone(),
      side,
    };
    order.is_well_formed().then_some(order)
  }
}

#[async_trait]
impl ExchangeAdapter for OpenSeaAdapter {
  fn exchange(&self) -> Exchange {
    Exchange::OpenSea
  }

  fn order_ttl(&self) -> Duration {
    self.order_ttl
  }

  fn supports_chain(&self, chain_id: &str) -> bool {
    chain_id == "1" || TESTNET_CHAIN_IDS.contains(&chain_id)
  }

  async fn fetch_orders(
    &self,
    request: &OrderRequest,
    side: OrderSide,
  ) -> Result<Vec<Order>, FetchError> {
    let network = Self::network_path(&request.chain_id);
    let path = match side {
      OrderSide::Listing => format!("/orders/{network}/seaport/listings"),
      OrderSide::Offer => format!("/orders/{network}/seaport/offers"),
    };

    let mut orders = Vec::new();
    let mut cursor: Option<String> = None;

    for _ in 0..MAX_ORDER_PAGES {
      let mut query: Vec<(&str, String)> = vec![
        ("asset_contract_address", request.contract.clone()),
        ("token_ids", request.token_id.clone()),
        ("limit", self.page_size.to_string()),
      ];
      if side == OrderSide::Offer {
        query.push(("order_by", "eth_price".into()));
        query.push(("order_direction", "desc".into()));
      }
      if let Some(c) = &cursor {
        query.push(("cursor", c.clone()));
      }

      let page: SeaportOrdersResponse = match self
        .client_for(&request.chain_id)
        .get_json(&path, &query)
        .await
      {
        Ok(page) => page,
        Err(FetchError::Api { status }) => {
          debug!(status, contract = %request.contract, "OpenSea returned no orders");
          return Ok(orders);
        }
        Err(FetchError::Schema(msg)) => {
          warn!(error = %msg, "OpenSea response failed schema validation");
          return Ok(orders);
        }
        Err(e) => return Err(e),
      };

      for doc in &page.orders {
        match Self::normalize(doc, side) {
          Some(order) => orders.push(order),
          None => {
            debug!(order_hash = %doc.order_hash, "Skipping malformed Seaport order")
          }
        }
      }

      cursor = page.next;
      if cursor.is_none() {
        break;
      }
    }

    Ok(orders)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn seaport_listing_json() -> serde_json::Value {
    serde_json::json!({
      "next": null,
      "orders": [{
        "order_hash": "0x9b0fdab4d8a5a1f25cd1e2a36b43264f5143a52bf88a53cf2ec95a851dc2a534",
        "cancelled": false,
        "finalized": false,
        "marked_invalid": false,
        "taker": null,
        "protocol_data": {
          "parameters": {
            "offerer": "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
            "offer": [{
              "itemType": 2,
              "token": "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359",
              "identifierOrCriteria": "1",
              "startAmount": "1"
            }],
            "consideration": [
              {
                "itemType": 0,
                "token": "0x0000000000000000000000000000000000000000",
                "identifierOrCriteria": "0",
                "startAmount": "950000000000000000"
              },
              {
                "itemType": 0,
                "token": "0x0000000000000000000000000000000000000000",
                "identifierOrCriteria": "0",
                "startAmount": "50000000000000000"
              }
            ],
            "startTime": "1658844371",
            "endTime": "1659844371",
            "salt": "0xb45b1e",
            "counter": 0
          },
          "signature": "0xsig"
        }
      }]
    })
  }

  #[test]
  fn normalizes_seaport_listing() {
    let page: SeaportOrdersResponse =
      serde_json::from_value(seaport_listing_json()).unwrap();
    let order = OpenSeaAdapter::normalize(&page.orders[0], OrderSide::Listing).unwrap();

    assert_eq!(order.exchange, Exchange::OpenSea);
    assert_eq!(
      order.maker_address.as_deref(),
      Some("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")
    );
    // Sum of both consideration legs.
    assert_eq!(order.price, "1000000000000000000");
    assert_eq!(order.assets.len(), 1);
    assert_eq!(order.assets[0].token_id, "0x1");
    assert_eq!(order.assets[0].asset_class, AssetClass::Erc721);
    assert_eq!(order.start, 1658844371);
    assert_eq!(order.nonce.as_deref(), Some("0"));
  }

  #[test]
  fn cancelled_documents_are_dropped() {
    let mut page: SeaportOrdersResponse =
      serde_json::from_value(seaport_listing_json()).unwrap();
    page.orders[0].cancelled = true;
    assert!(OpenSeaAdapter::normalize(&page.orders[0], OrderSide::Listing).is_none());
  }
}
