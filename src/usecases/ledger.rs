//! Activity Ledger - Persisted Order and Transaction Records
//!
//! Records observed marketplace activity, keyed for upsert by
//! `activity_hash` (order hash off-chain, transaction hash on-chain).
//! Status moves exactly once, `Valid -> {Cancelled, Executed}`, via
//! the store's conditional transition; read flags flip only for the
//! owning wallet.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, info};

use crate::domain::activity::{
  Activity, ActivityId, ActivityPayload, ActivityStatus, ActivityType,
  CancelPayload, SalePayload, SwapPayload, TransferPayload,
};
use crate::domain::nft::{checksum_address, nft_id};
use crate::domain::order::{Exchange, Order};
use crate::error::LedgerError;
use crate::ports::store::{
  ActivityFilter, ActivityStore, TransitionEvidence, TransitionOutcome,
};

/// Observed on-chain cancel event, as handed in by an event consumer.
#[derive(Debug, Clone)]
pub struct CancelEvent {
  pub transaction_hash: String,
  pub order_hash: String,
  pub maker: String,
  pub exchange: Exchange,
  /// Whether the cancelled order was a listing or a bid.
  pub cancelled_type: ActivityType,
  pub nft_contract: String,
  pub token_id: String,
  pub block_timestamp: i64,
}

/// Observed on-chain sale event.
#[derive(Debug, Clone)]
pub struct SaleEvent {
  pub transaction_hash: String,
  pub block_number: u64,
  pub maker: String,
  pub taker: String,
  pub exchange: Exchange,
  pub price: String,
  pub currency: String,
  pub nft_contract: String,
  pub token_id: String,
  pub block_timestamp: i64,
}

/// Observed on-chain transfer event.
#[derive(Debug, Clone)]
pub struct TransferEvent {
  pub transaction_hash: String,
  pub block_number: u64,
  pub from: String,
  pub to: String,
  pub nft_contract: String,
  pub token_id: String,
  pub block_timestamp: i64,
}

/// Observed on-chain swap event.
#[derive(Debug, Clone)]
pub struct SwapEvent {
  pub transaction_hash: String,
  pub block_number: u64,
  pub maker: String,
  pub taker: String,
  pub nft_contract: String,
  pub token_id: String,
  pub block_timestamp: i64,
}

/// Result of a bulk read-flag update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReadOutput {
  /// Ids actually flipped to read.
  pub updated_ids_success: Vec<ActivityId>,
  /// Requested ids that were missing, foreign, or already read.
  pub ids_not_found_or_failed: Vec<ActivityId>,
}

/// Domain layer over the activity store.
pub struct ActivityLedger {
  store: Arc<dyn ActivityStore>,
}

impl ActivityLedger {
  pub fn new(store: Arc<dyn ActivityStore>) -> Self {
    Self { store }
  }

  fn timestamp_from_unix(unix: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(unix, 0).single().unwrap_or_else(Utc::now)
  }

  /// Upsert one observed order as a ledger record.
  ///
  /// The upsert key is the order hash: re-observing a known order
  /// refreshes the existing record instead of duplicating it.
  pub async fn record_order(
    &self,
    order: &Order,
    chain_id: &str,
  ) -> Result<Activity, LedgerError> {
    let filter = ActivityFilter {
      activity_hash: Some(order.order_hash.clone()),
      chain_id: Some(chain_id.to_string()),
      ..ActivityFilter::default()
    };
    if let Some(mut existing) = self.store.find_one(&filter).await? {
      existing.updated_at = Utc::now();
      existing.payload = ActivityPayload::from_order(order.clone());
      debug!(activity_hash = %order.order_hash, "Refreshed existing order activity");
      return Ok(self.store.save(existing).await?);
    }

    let wallet = order
      .maker_address
      .clone()
      .unwrap_or_else(|| "0x0000000000000000000000000000000000000000".into());
    let nft_ids: Vec<String> = order
      .assets
      .iter()
      .filter_map(|a| nft_id(&a.contract_address, &a.token_id))
      .collect();
    let nft_contract = order
      .assets
      .first()
      .map(|a| a.contract_address.clone())
      .unwrap_or_default();

    let activity = Activity::new(
      order.order_hash.clone(),
      chain_id,
      wallet,
      nft_ids,
      nft_contract,
      Self::timestamp_from_unix(order.start),
      Utc.timestamp_opt(order.end, 0).single(),
      ActivityPayload::from_order(order.clone()),
    );
    info!(activity_hash = %order.order_hash, kind = %activity.activity_type(), "Recorded order activity");
    Ok(self.store.save(activity).await?)
  }

  /// Record an observed cancel transaction, keyed by its hash.
  pub async fn record_cancel(
    &self,
    event: &CancelEvent,
    chain_id: &str,
  ) -> Result<Activity, LedgerError> {
    let payload = ActivityPayload::Cancel(CancelPayload {
      foreign_type: event.cancelled_type,
      foreign_key_id: event.order_hash.clone(),
      transaction_hash: event.transaction_hash.clone(),
      exchange: event.exchange,
    });
    self
      .record_onchain(
        &event.transaction_hash,
        chain_id,
        &event.maker,
        &event.nft_contract,
        &event.token_id,
        event.block_timestamp,
        payload,
      )
      .await
  }

  /// Record an observed sale transaction.
  pub async fn record_sale(
    &self,
    event: &SaleEvent,
    chain_id: &str,
  ) -> Result<Activity, LedgerError> {
    let payload = ActivityPayload::Sale(SalePayload {
      transaction_hash: event.transaction_hash.clone(),
      block_number: event.block_number,
      maker: event.maker.clone(),
      taker: event.taker.clone(),
      exchange: event.exchange,
      price: event.price.clone(),
      currency: event.currency.clone(),
    });
    self
      .record_onchain(
        &event.transaction_hash,
        chain_id,
        &event.maker,
        &event.nft_contract,
        &event.token_id,
        event.block_timestamp,
        payload,
      )
      .await
  }

  /// Record an observed transfer.
  pub async fn record_transfer(
    &self,
    event: &TransferEvent,
    chain_id: &str,
  ) -> Result<Activity, LedgerError> {
    let payload = ActivityPayload::Transfer(TransferPayload {
      transaction_hash: event.transaction_hash.clone(),
      block_number: event.block_number,
      from: event.from.clone(),
      to: event.to.clone(),
    });
    self
      .record_onchain(
        &event.transaction_hash,
        chain_id,
        &event.from,
        &event.nft_contract,
        &event.token_id,
        event.block_timestamp,
        payload,
      )
      .await
  }

  /// Record an observed swap.
  pub async fn record_swap(
    &self,
    event: &SwapEvent,
    chain_id: &str,
  ) -> Result<Activity, LedgerError> {
    let payload = ActivityPayload::Swap(SwapPayload {
      transaction_hash: event.transaction_hash.clone(),
      block_number: event.block_number,
      maker: event.maker.clone(),
      taker: event.taker.clone(),
    });
    self
      .record_onchain(
        &event.transaction_hash,
        chain_id,
        &event.maker,
        &event.nft_contract,
        &event.token_id,
        event.block_timestamp,
        payload,
      )
      .await
  }

  #[allow(clippy::too_many_arguments)]
  async fn record_onchain(
    &self,
    transaction_hash: &str,
    chain_id: &str,
    wallet: &str,
    nft_contract: &str,
    token_id: &str,
    block_timestamp: i64,
    payload: ActivityPayload,
  ) -> Result<Activity, LedgerError> {
    let filter = ActivityFilter {
      activity_hash: Some(transaction_hash.to_string()),
      chain_id: Some(chain_id.to_string()),
      ..ActivityFilter::default()
    };
    if let Some(mut existing) = self.store.find_one(&filter).await? {
      existing.updated_at = Utc::now();
      existing.payload = payload;
      return Ok(self.store.save(existing).await?);
    }

    let wallet = checksum_address(wallet).unwrap_or_else(|| wallet.to_string());
    let contract =
      checksum_address(nft_contract).unwrap_or_else(|| nft_contract.to_string());
    let nft_ids = nft_id(&contract, token_id).into_iter().collect();

    let activity = Activity::new(
      transaction_hash,
      chain_id,
      wallet,
      nft_ids,
      contract,
      Self::timestamp_from_unix(block_timestamp),
      None,
      payload,
    );
    info!(activity_hash = %transaction_hash, kind = %activity.activity_type(), "Recorded on-chain activity");
    Ok(self.store.save(activity).await?)
  }

  /// Conditionally move an activity into a terminal status.
  ///
  /// `Valid` can never be assigned; the store's compare-and-swap
  /// resolves races so a lost race is a no-op, not an error.
  pub async fn transition(
    &self,
    id: &str,
    next: ActivityStatus,
    evidence: &TransitionEvidence,
  ) -> Result<TransitionOutcome, LedgerError> {
    if !next.is_terminal() {
      return Err(LedgerError::StatusNotAllowed(next));
    }
    Ok(self.store.transition_if_valid(id, next, evidence).await?)
  }

  /// Transition on behalf of a wallet, enforcing ownership first.
  pub async fn transition_for_wallet(
    &self,
    id: &str,
    wallet_address: &str,
    next: ActivityStatus,
    evidence: &TransitionEvidence,
  ) -> Result<TransitionOutcome, LedgerError> {
    let wallet = checksum_address(wallet_address)
      .unwrap_or_else(|| wallet_address.to_string());
    let Some(activity) = self.store.find_by_id(id).await? else {
      return Err(LedgerError::NoActivityToUpdate);
    };
    if activity.wallet_address != wallet {
      return Err(LedgerError::ActivityNotOwned {
        id: id.to_string(),
        wallet,
      });
    }
    self.transition(id, next, evidence).await
  }

  /// Flip the read flag on the caller's own activities.
  ///
  /// Partial success is reported, not failed: ids that were missing,
  /// foreign, or already read land in `ids_not_found_or_failed`. An
  /// empty request or zero flips is `NoActivityToUpdate`.
  pub async fn update_read_by_ids(
    &self,
    ids: &[ActivityId],
    wallet_address: &str,
    chain_id: &str,
  ) -> Result<UpdateReadOutput, LedgerError> {
    if ids.is_empty() {
      return Err(LedgerError::NoActivityToUpdate);
    }
    let wallet = checksum_address(wallet_address)
      .unwrap_or_else(|| wallet_address.to_string());

    let updated = self.store.mark_read(ids, &wallet, chain_id).await?;
    if updated.is_empty() {
      return Err(LedgerError::NoActivityToUpdate);
    }

    let failed: Vec<ActivityId> = ids
      .iter()
      .filter(|id| !updated.contains(id))
      .cloned()
      .collect();
    debug!(
      wallet = %wallet,
      updated = updated.len(),
      failed = failed.len(),
      "Read flags updated"
    );
    Ok(UpdateReadOutput {
      updated_ids_success: updated,
      ids_not_found_or_failed: failed,
    })
  }

  /// All activities of one kind on a chain, newest first.
  pub async fn activities_by_type(
    &self,
    activity_type: ActivityType,
    chain_id: &str,
  ) -> Result<Vec<Activity>, LedgerError> {
    let filter = ActivityFilter {
      activity_type: Some(activity_type),
      chain_id: Some(chain_id.to_string()),
      ..ActivityFilter::default()
    };
    Ok(self.store.find(&filter).await?)
  }

  /// All activities belonging to a wallet on a chain, newest first.
  pub async fn activities_by_wallet(
    &self,
    wallet_address: &str,
    chain_id: &str,
  ) -> Result<Vec<Activity>, LedgerError> {
    let wallet = checksum_address(wallet_address)
      .unwrap_or_else(|| wallet_address.to_string());
    let filter = ActivityFilter {
      wallet_address: Some(wallet),
      chain_id: Some(chain_id.to_string()),
      ..ActivityFilter::default()
    };
    Ok(self.store.find(&filter).await?)
  }

  /// How many of the wallet's activities are still unread.
  pub async fn unread_count(
    &self,
    wallet_address: &str,
    chain_id: &str,
  ) -> Result<usize, LedgerError> {
    let wallet = checksum_address(wallet_address)
      .unwrap_or_else(|| wallet_address.to_string());
    let filter = ActivityFilter {
      wallet_address: Some(wallet),
      chain_id: Some(chain_id.to_string()),
      read: Some(false),
      ..ActivityFilter::default()
    };
    Ok(self.store.find(&filter).await?.len())
  }

  /// Wallet activities narrowed to one kind.
  pub async fn activities_by_wallet_and_type(
    &self,
    wallet_address: &str,
    activity_type: ActivityType,
    chain_id: &str,
  ) -> Result<Vec<Activity>, LedgerError> {
    let wallet = checksum_address(wallet_address)
      .unwrap_or_else(|| wallet_address.to_string());
    let filter = ActivityFilter {
      wallet_address: Some(wallet),
      activity_type: Some(activity_type),
      chain_id: Some(chain_id.to_string()),
      ..ActivityFilter::default()
    };
    Ok(self.store.find(&filter).await?)
  }
}
