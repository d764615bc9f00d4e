//! Exchange Adapter Port - One Marketplace's Order API
//!
//! Each implementor knows how to call a single external marketplace
//! and normalize its response into the canonical `Order` shape.
//!
//! Failure contract: a 4xx response is "no matching orders" and maps
//! to `Ok(vec![])`; retries for 5xx/transport failures happen inside
//! the adapter, and only an exhausted retry budget surfaces as
//! `Err(FetchError::Transient)`. The aggregator treats that as an
//! empty contribution so one failing exchange never aborts the
//! aggregate query.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::order::{Exchange, Order, OrderRequest, OrderSide};
use crate::error::FetchError;

/// Trait for marketplace order adapters.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync + 'static {
  /// Which marketplace this adapter fronts.
  fn exchange(&self) -> Exchange;

  /// Cache TTL for this exchange's order book responses.
  fn order_ttl(&self) -> Duration;

  /// Whether the marketplace serves the given chain. Requests for
  /// unsupported chains short-circuit to an empty result.
  fn supports_chain(&self, _chain_id: &str) -> bool {
    true
  }

  /// Fetch and normalize orders for one NFT and side.
  ///
  /// Pagination, unit conversion, and address checksumming are
  /// adapter-local. Documents failing schema validation are logged
  /// and skipped, never propagated partially typed.
  async fn fetch_orders(
    &self,
    request: &OrderRequest,
    side: OrderSide,
  ) -> Result<Vec<Order>, FetchError>;
}
