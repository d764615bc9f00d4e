//! Transaction Validator - On-chain Proof for Cancellations
//!
//! Before the ledger marks an activity `Cancelled`, the claimed
//! transaction has to actually prove the cancellation: mined with at
//! least one confirmation, and carrying a `Cancel(bytes32,address)`
//! event whose struct hash and maker match the activity on record.
//! Every failure mode answers `false`; this path never throws.

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::B256;
use alloy::sol;
use alloy::sol_types::SolEvent;
use tracing::{debug, warn};

use crate::domain::activity::ActivityType;
use crate::ports::chain::ChainClient;
use crate::ports::store::{ActivityFilter, ActivityStore};

sol! {
  /// Emitted by the marketplace contract when a maker cancels an
  /// order.
  event Cancel(bytes32 structHash, address maker);
}

/// Which kind of record the cancel transaction claims to cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelKind {
  Listing,
  Bid,
}

impl CancelKind {
  fn activity_type(self) -> ActivityType {
    match self {
      Self::Listing => ActivityType::Listing,
      Self::Bid => ActivityType::Bid,
    }
  }
}

/// Validates claimed cancel transactions against the chain and the
/// ledger.
pub struct TransactionValidator {
  chain: Arc<dyn ChainClient>,
  store: Arc<dyn ActivityStore>,
}

impl TransactionValidator {
  pub fn new(chain: Arc<dyn ChainClient>, store: Arc<dyn ActivityStore>) -> Self {
    Self { chain, store }
  }

  /// `true` only when the transaction is confirmed and one of its
  /// `Cancel` events matches the identified activity. Fail-closed:
  /// any error, missing data, or mismatch answers `false`.
  pub async fn validate_tx_hash_for_cancel(
    &self,
    tx_hash: &str,
    chain_id: &str,
    activity_id: &str,
    kind: CancelKind,
  ) -> bool {
    match self
      .validate_inner(tx_hash, chain_id, activity_id, kind)
      .await
    {
      Ok(valid) => valid,
      Err(e) => {
        warn!(tx_hash, activity_id, error = %e, "Cancel validation errored, rejecting");
        false
      }
    }
  }

  async fn validate_inner(
    &self,
    tx_hash: &str,
    chain_id: &str,
    activity_id: &str,
    kind: CancelKind,
  ) -> anyhow::Result<bool> {
    let Ok(hash) = B256::from_str(tx_hash) else {
      debug!(tx_hash, "Malformed transaction hash");
      return Ok(false);
    };

    let Some(tx) = self.chain.transaction(hash).await? else {
      debug!(tx_hash, "Transaction unknown to the node");
      return Ok(false);
    };
    if tx.confirmations == 0 {
      debug!(tx_hash, "Transaction still pending");
      return Ok(false);
    }

    let logs = self.chain.wait_for_receipt(hash).await?;
    for log in &logs {
      if log.topics.first() != Some(&Cancel::SIGNATURE_HASH) {
        continue;
      }
      let Ok(event) = Cancel::decode_raw_log(log.topics.iter().copied(), &log.data, true)
      else {
        continue;
      };

      let struct_hash = event.structHash.to_string();
      let maker = event.maker.to_checksum(None);
      let filter = ActivityFilter {
        activity_hash: Some(struct_hash),
        wallet_address: Some(maker),
        activity_type: Some(kind.activity_type()),
        chain_id: Some(chain_id.to_string()),
        ..ActivityFilter::default()
      };
      if let Some(found) = self.store.find_one(&filter).await? {
        if found.id == activity_id {
          return Ok(true);
        }
      }
    }

    debug!(tx_hash, activity_id, "No matching Cancel event in receipt");
    Ok(false)
  }
}
