//! Canonical order model.
//!
//! Every marketplace adapter normalizes its wire format into `Order`.
//! Orders are ephemeral: the aggregator returns them to callers but
//! never persists them itself (the ledger keeps its own records).

use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Source marketplace of an order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Exchange {
    OpenSea,
    LooksRare,
    X2Y2,
    /// Orders created through our own marketplace contract.
    Internal,
}

impl std::fmt::Display for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenSea => write!(f, "opensea"),
            Self::LooksRare => write!(f, "looksrare"),
            Self::X2Y2 => write!(f, "x2y2"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Maker intent: selling (listing) or bidding (offer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Listing,
    Offer,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Listing => write!(f, "listing"),
            Self::Offer => write!(f, "offer"),
        }
    }
}

/// Token standard of one asset leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetClass {
    Eth,
    Erc20,
    Erc721,
    Erc1155,
}

/// One asset leg of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAsset {
    /// Checksummed asset contract address.
    pub contract_address: String,
    /// 0x-prefixed hex token id. Empty for fungible legs.
    pub token_id: String,
    /// Quantity (1 for ERC-721).
    pub quantity: u64,
    pub asset_class: AssetClass,
}

/// Canonical, exchange-agnostic order shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub exchange: Exchange,
    /// Unique within one exchange; the dedupe key is
    /// `(exchange, order_hash)`.
    pub order_hash: String,
    /// Checksummed maker address.
    pub maker_address: Option<String>,
    /// Checksummed taker address, if the order is private.
    pub taker_address: Option<String>,
    /// Ordered asset legs.
    pub assets: Vec<OrderAsset>,
    /// Price in wei as a decimal string.
    pub price: String,
    /// Checksummed currency contract (zero address for native ETH).
    pub currency: String,
    /// Validity window start, unix seconds.
    pub start: i64,
    /// Validity window end, unix seconds. Invariant: `start <= end`.
    pub end: i64,
    /// Exchange-specific replay counter, opaque to the core.
    pub nonce: Option<String>,
    pub salt: Option<String>,
    pub protocol_signature: Option<String>,
    pub side: OrderSide,
}

impl Order {
    /// Expiration is a derived, query-time property — an expired order
    /// is filtered from views, never invalidated in the ledger.
    pub fn is_expired(&self, now: i64) -> bool {
        self.end < now
    }

    /// Identity used when merging results across adapters.
    pub fn dedupe_key(&self) -> (Exchange, &str) {
        (self.exchange, self.order_hash.as_str())
    }

    /// Price as a decimal for cross-exchange ordering. Unparseable
    /// prices sort as zero rather than poisoning the merge.
    pub fn price_decimal(&self) -> Decimal {
        Decimal::from_str(&self.price).unwrap_or_default()
    }

    /// Structural validity check applied after normalization.
    /// Documents that fail are logged and dropped by the adapter.
    pub fn is_well_formed(&self) -> bool {
        !self.order_hash.is_empty() && self.start <= self.end && !self.assets.is_empty()
    }
}

/// One NFT lookup request handed to the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderRequest {
    pub contract: String,
    pub token_id: String,
    pub chain_id: String,
}

/// Merged view returned by the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalOrderResult {
    pub listings: Vec<Order>,
    pub offers: Vec<Order>,
}

/// Expiration view selection for aggregator queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpirationFilter {
    /// Only orders with `end >= now` (the default view).
    #[default]
    ActiveOnly,
    /// Only orders that have already lapsed.
    ExpiredOnly,
    /// No expiration filtering.
    All,
}

impl ExpirationFilter {
    pub fn admits(&self, order: &Order, now: i64) -> bool {
        match self {
            Self::ActiveOnly => !order.is_expired(now),
            Self::ExpiredOnly => order.is_expired(now),
            Self::All => true,
        }
    }
}

/// Query options for aggregator calls.
#[derive(Debug, Clone, Copy)]
pub struct OrderFilters {
    pub expiration: ExpirationFilter,
    /// Whether to fan out to the offers endpoints as well.
    pub include_offers: bool,
}

impl Default for OrderFilters {
    fn default() -> Self {
        Self {
            expiration: ExpirationFilter::default(),
            include_offers: true,
        }
    }
}

/// Current unix time, seconds. Single call site for testability.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}
