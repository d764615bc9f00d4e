//! Order Aggregator - Parallel Marketplace Fan-out and Merge
//!
//! One logical query fans out to every registered adapter, per side,
//! per NFT, all in parallel. Per-unit failures degrade to empty
//! contributions; only when every unit hard-fails does the whole
//! query report "could not determine" (`None`). The merge is
//! order-insensitive, so completion order across adapters never
//! changes the result.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::order::{
  unix_now, Exchange, ExternalOrderResult, Order, OrderFilters, OrderRequest,
  OrderSide,
};
use crate::error::FetchError;
use crate::ports::cache::{external_orders_key, CacheKey, CacheStore};
use crate::ports::exchange::ExchangeAdapter;

/// Merge per-adapter batches into the final result.
///
/// Commutative by construction: batches are flattened, sorted by the
/// `(exchange, order_hash)` identity, and deduplicated before the
/// expiration filter and price ordering are applied. Permuting the
/// input batches cannot change the output.
pub fn merge_orders(
  batches: Vec<Vec<Order>>,
  filters: &OrderFilters,
  now: i64,
) -> ExternalOrderResult {
  let mut orders: Vec<Order> = batches.into_iter().flatten().collect();
  orders.sort_by(|a, b| a.dedupe_key().cmp(&b.dedupe_key()));
  orders.dedup_by(|a, b| a.dedupe_key() == b.dedupe_key());

  let mut result = ExternalOrderResult::default();
  for order in orders {
    if !filters.expiration.admits(&order, now) {
      continue;
    }
    match order.side {
      OrderSide::Listing => result.listings.push(order),
      OrderSide::Offer => result.offers.push(order),
    }
  }

  // Listings cheapest-first, offers best-first.
  result
    .listings
    .sort_by(|a, b| a.price_decimal().cmp(&b.price_decimal()));
  result
    .offers
    .sort_by(|a, b| b.price_decimal().cmp(&a.price_decimal()));
  result
}

/// Aggregates orders across all registered marketplace adapters.
pub struct OrderAggregator {
  adapters: Vec<Arc<dyn ExchangeAdapter>>,
  cache: Arc<dyn CacheStore>,
  /// Single-flight gates keyed by cache key: concurrent identical
  /// units coalesce into one upstream fetch.
  inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
  page_size: usize,
}

impl OrderAggregator {
  pub fn new(
    adapters: Vec<Arc<dyn ExchangeAdapter>>,
    cache: Arc<dyn CacheStore>,
    page_size: usize,
  ) -> Self {
    Self {
      adapters,
      cache,
      inflight: Mutex::new(HashMap::new()),
      page_size,
    }
  }

  /// Fetch and merge orders for a batch of NFTs with the default
  /// filters (active orders, both sides).
  ///
  /// Returns `None` only when every fan-out unit hard-failed; an
  /// empty result means the marketplaces were reachable and had
  /// nothing.
  pub async fn retrieve_multiple_orders(
    &self,
    requests: &[OrderRequest],
    skip_cache: bool,
  ) -> Option<ExternalOrderResult> {
    self
      .retrieve_with_filters(requests, &OrderFilters::default(), skip_cache)
      .await
  }

  /// Fetch and merge orders with explicit filters.
  pub async fn retrieve_with_filters(
    &self,
    requests: &[OrderRequest],
    filters: &OrderFilters,
    skip_cache: bool,
  ) -> Option<ExternalOrderResult> {
    let sides: &[OrderSide] = if filters.include_offers {
      &[OrderSide::Listing, OrderSide::Offer]
    } else {
      &[OrderSide::Listing]
    };

    let mut units = Vec::new();
    for request in requests {
      for adapter in &self.adapters {
        for side in sides {
          units.push(self.fetch_unit(Arc::clone(adapter), request, *side, skip_cache));
        }
      }
    }
    if units.is_empty() {
      return Some(ExternalOrderResult::default());
    }

    let results = join_all(units).await;
    if results.iter().all(Result::is_err) {
      warn!(
        requests = requests.len(),
        "Every marketplace unit failed, result is indeterminate"
      );
      return None;
    }

    let batches: Vec<Vec<Order>> =
      results.into_iter().filter_map(Result::ok).collect();
    Some(merge_orders(batches, filters, unix_now()))
  }

  /// One (adapter, request, side) fan-out unit: cache front, a
  /// single-flight gate, then the adapter fetch.
  async fn fetch_unit(
    &self,
    adapter: Arc<dyn ExchangeAdapter>,
    request: &OrderRequest,
    side: OrderSide,
    skip_cache: bool,
  ) -> Result<Vec<Order>, FetchError> {
    if !adapter.supports_chain(&request.chain_id) {
      return Ok(vec![]);
    }

    let key = external_orders_key(adapter.exchange(), request, side, self.page_size);
    if !skip_cache {
      if let Some(hit) = self.read_cached(&key).await {
        return Ok(hit);
      }
    }

    let gate = {
      let mut inflight = self.inflight.lock().await;
      Arc::clone(
        inflight
          .entry(key.clone())
          .or_insert_with(|| Arc::new(Mutex::new(()))),
      )
    };
    let guard = gate.lock().await;

    // A coalesced peer may have populated the cache while we waited.
    let coalesced = if skip_cache {
      None
    } else {
      self.read_cached(&key).await
    };
    let result = match coalesced {
      Some(hit) => Ok(hit),
      None => {
        let result = adapter.fetch_orders(request, side).await;
        if let Ok(orders) = &result {
          if let Ok(serialized) = serde_json::to_string(orders) {
            self.cache.set(&key, &serialized, adapter.order_ttl()).await;
          }
        } else {
          debug!(exchange = %adapter.exchange(), %side, contract = %request.contract, "Unit hard-failed");
        }
        result
      }
    };

    drop(guard);
    let mut inflight = self.inflight.lock().await;
    // Map entry + our clone: nobody else is waiting on this gate.
    if inflight.get(&key).is_some_and(|g| Arc::strong_count(g) <= 2) {
      inflight.remove(&key);
    }
    result
  }

  async fn read_cached(&self, key: &str) -> Option<Vec<Order>> {
    let raw = self.cache.get(key).await?;
    serde_json::from_str(&raw).ok()
  }

  /// Enqueue NFTs for background order refresh.
  ///
  /// The queue is a sorted set scored by enqueue time. Unless forced,
  /// an NFT already refreshed recently (present in the companion
  /// "refreshed" set) is skipped. Returns how many were enqueued.
  pub async fn trigger_refresh_queue(
    &self,
    nfts: &[OrderRequest],
    chain_id: &str,
    forced: bool,
  ) -> u64 {
    let queue_key = format!("{}_{chain_id}", CacheKey::RefreshNftOrders);
    let refreshed_key = format!("{}_{chain_id}", CacheKey::RefreshedNftOrders);
    let now = unix_now() as f64;

    let mut enqueued = 0;
    for nft in nfts {
      let member = format!(
        "{}:{}",
        nft.contract.to_lowercase(),
        nft.token_id.to_lowercase()
      );
      if !forced && self.cache.zscore(&refreshed_key, &member).await.is_some() {
        continue;
      }
      self.cache.zadd(&queue_key, now, &member).await;
      enqueued += 1;
    }
    debug!(chain_id, enqueued, forced, "Refresh queue updated");
    enqueued
  }

  /// Registered source marketplaces, for diagnostics.
  pub fn exchanges(&self) -> Vec<Exchange> {
    self.adapters.iter().map(|a| a.exchange()).collect()
  }
}
