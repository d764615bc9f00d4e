//! Cache Store Port - TTL Key/Value + Sorted-Set Primitives
//!
//! Fronts every adapter call to avoid redundant external requests.
//! The store is shared and non-transactional: concurrent readers and
//! writers race freely, which is acceptable because adapter calls are
//! idempotent and entries are only ever overwritten with equivalent
//! refreshed data.
//!
//! Degradation contract: an unavailable cache behaves as "always
//! miss" — `get` returns `None` and `set` is a logged no-op. Cache
//! trouble must never abort a caller.
//!
//! The client is constructed explicitly and injected into the
//! aggregator/adapters, with `open`/`close` lifecycle at process
//! startup/shutdown. No global singleton, no import-order surprises.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::order::{Exchange, OrderRequest, OrderSide};

/// Well-known key prefixes, kept in one place so key derivation stays
/// stable across components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey {
  ExternalOrders,
  NftDetail,
  CollectionStats,
  RefreshNftOrders,
  RefreshedNftOrders,
}

impl CacheKey {
  pub fn prefix(&self) -> &'static str {
    match self {
      Self::ExternalOrders => "external_orders",
      Self::NftDetail => "nft_detail",
      Self::CollectionStats => "collection_stats",
      Self::RefreshNftOrders => "refresh_nft_orders_ext",
      Self::RefreshedNftOrders => "refreshed_nft_orders_ext",
    }
  }
}

impl std::fmt::Display for CacheKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.prefix())
  }
}

/// Stable cache key for one (exchange, request, side, page size) unit.
///
/// Contract addresses are lowercased so key equality is independent of
/// input casing; everything else is positional.
pub fn external_orders_key(
  exchange: Exchange,
  request: &OrderRequest,
  side: OrderSide,
  page_size: usize,
) -> String {
  format!(
    "{}_{}_{}_{}_{}_{}_{}",
    CacheKey::ExternalOrders,
    exchange,
    side,
    request.chain_id,
    request.contract.to_lowercase(),
    request.token_id.to_lowercase(),
    page_size,
  )
}

/// Trait for the shared cache store.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
  /// Establish the connection. Called once at process startup.
  async fn open(&self) -> anyhow::Result<()>;

  /// Tear down the connection. Subsequent reads behave as misses.
  async fn close(&self);

  /// Fetch a value; `None` is both "miss" and "store unavailable".
  async fn get(&self, key: &str) -> Option<String>;

  /// Store a value with a TTL. Failures are absorbed and logged.
  async fn set(&self, key: &str, value: &str, ttl: Duration);

  /// Add or update a sorted-set member.
  async fn zadd(&self, key: &str, score: f64, member: &str);

  /// Score of a member, if present.
  async fn zscore(&self, key: &str, member: &str) -> Option<f64>;

  /// Members with scores in `[min, max]`, ascending.
  async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> Vec<String>;

  /// Remove members with scores in `[min, max]`; returns how many.
  async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> u64;

  async fn is_healthy(&self) -> bool;
}
