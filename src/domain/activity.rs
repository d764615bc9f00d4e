//! Persisted activity ledger types and the status state machine.
//!
//! An activity records one observed order-related event. Its status
//! starts at `Valid` and may move exactly once, to `Cancelled` or
//! `Executed`; both are terminal. The kind/payload pairing is enforced
//! statically through the `ActivityPayload` tagged union rather than
//! one joined table per kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::order::{Exchange, Order, OrderSide};

/// Stable activity identifier.
pub type ActivityId = String;

/// Kind of event the activity records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    Listing,
    Bid,
    Cancel,
    Sale,
    Transfer,
    Swap,
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Listing => "listing",
            Self::Bid => "bid",
            Self::Cancel => "cancel",
            Self::Sale => "sale",
            Self::Transfer => "transfer",
            Self::Swap => "swap",
        };
        write!(f, "{s}")
    }
}

/// Lifecycle status. `Valid` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityStatus {
    Valid,
    Cancelled,
    Executed,
}

impl ActivityStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Executed)
    }

    /// State machine edge check: only `Valid -> {Cancelled, Executed}`
    /// is admissible.
    pub fn can_transition_to(&self, next: Self) -> bool {
        *self == Self::Valid && next.is_terminal()
    }
}

/// Payload for off-chain order activities (listings and bids).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    /// The normalized order as observed from the marketplace.
    pub order: Order,
}

/// Payload for an observed cancel transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelPayload {
    /// Whether the cancelled record was a listing or a bid.
    pub foreign_type: ActivityType,
    /// Order hash of the cancelled record.
    pub foreign_key_id: String,
    pub transaction_hash: String,
    pub exchange: Exchange,
}

/// Payload for an observed sale transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePayload {
    pub transaction_hash: String,
    pub block_number: u64,
    pub maker: String,
    pub taker: String,
    pub exchange: Exchange,
    /// Sale price in wei as a decimal string.
    pub price: String,
    pub currency: String,
}

/// Payload for an observed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPayload {
    pub transaction_hash: String,
    pub block_number: u64,
    pub from: String,
    pub to: String,
}

/// Payload for an observed swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapPayload {
    pub transaction_hash: String,
    pub block_number: u64,
    pub maker: String,
    pub taker: String,
}

/// Tagged union pairing each activity kind with exactly one payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityPayload {
    Listing(OrderPayload),
    Bid(OrderPayload),
    Cancel(CancelPayload),
    Sale(SalePayload),
    Transfer(TransferPayload),
    Swap(SwapPayload),
}

impl ActivityPayload {
    pub fn activity_type(&self) -> ActivityType {
        match self {
            Self::Listing(_) => ActivityType::Listing,
            Self::Bid(_) => ActivityType::Bid,
            Self::Cancel(_) => ActivityType::Cancel,
            Self::Sale(_) => ActivityType::Sale,
            Self::Transfer(_) => ActivityType::Transfer,
            Self::Swap(_) => ActivityType::Swap,
        }
    }

    /// Build the order payload matching the order's side.
    pub fn from_order(order: Order) -> Self {
        match order.side {
            OrderSide::Listing => Self::Listing(OrderPayload { order }),
            OrderSide::Offer => Self::Bid(OrderPayload { order }),
        }
    }
}

/// One persisted ledger record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    /// Upsert key: order hash for off-chain events, transaction hash
    /// for on-chain events. Re-observing the same hash refreshes the
    /// existing record instead of duplicating it.
    pub activity_hash: String,
    pub chain_id: String,
    /// Checksummed wallet the activity belongs to (the maker).
    pub wallet_address: String,
    /// Composite keys `"ethereum/{contract}/{tokenIdHex}"`.
    pub nft_ids: Vec<String>,
    /// Checksummed NFT contract.
    pub nft_contract: String,
    pub status: ActivityStatus,
    /// Set by the owning wallet through `update_read_by_ids`.
    pub read: bool,
    /// Event creation time from the source.
    pub timestamp: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Order expiration, absent for on-chain events.
    pub expiration: Option<DateTime<Utc>>,
    /// Receipt hash that justified the terminal status, once
    /// transitioned.
    pub transition_tx: Option<String>,
    pub payload: ActivityPayload,
}

impl Activity {
    /// Create a new `Valid`, unread activity.
    pub fn new(
        activity_hash: impl Into<String>,
        chain_id: impl Into<String>,
        wallet_address: impl Into<String>,
        nft_ids: Vec<String>,
        nft_contract: impl Into<String>,
        timestamp: DateTime<Utc>,
        expiration: Option<DateTime<Utc>>,
        payload: ActivityPayload,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            activity_hash: activity_hash.into(),
            chain_id: chain_id.into(),
            wallet_address: wallet_address.into(),
            nft_ids,
            nft_contract: nft_contract.into(),
            status: ActivityStatus::Valid,
            read: false,
            timestamp,
            updated_at: now,
            expiration,
            transition_tx: None,
            payload,
        }
    }

    pub fn activity_type(&self) -> ActivityType {
        self.payload.activity_type()
    }
}
