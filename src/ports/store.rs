//! Activity Store Port - Persisted Ledger Records
//!
//! The ledger usecase is a thin domain layer over this generic
//! repository interface; schema details (tables, migrations) live
//! outside the core.
//!
//! The one write that matters for correctness is
//! `transition_if_valid`: a conditional "update status where id = X
//! and status = Valid" so that two racing transition attempts cannot
//! both succeed. The loser observes `AlreadyTerminal` and treats it
//! as success-no-op.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::activity::{
  Activity, ActivityId, ActivityStatus, ActivityType,
};

/// Conjunctive filter over ledger records. `None` fields match all.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
  pub activity_type: Option<ActivityType>,
  pub wallet_address: Option<String>,
  pub chain_id: Option<String>,
  pub status: Option<ActivityStatus>,
  pub read: Option<bool>,
  /// Order hash / structHash the activity was recorded under.
  pub activity_hash: Option<String>,
  pub nft_contract: Option<String>,
}

impl ActivityFilter {
  pub fn matches(&self, activity: &Activity) -> bool {
    self
      .activity_type
      .is_none_or(|t| activity.activity_type() == t)
      && self
        .wallet_address
        .as_deref()
        .is_none_or(|w| activity.wallet_address == w)
      && self
        .chain_id
        .as_deref()
        .is_none_or(|c| activity.chain_id == c)
      && self.status.is_none_or(|s| activity.status == s)
      && self.read.is_none_or(|r| activity.read == r)
      && self
        .activity_hash
        .as_deref()
        .is_none_or(|h| activity.activity_hash == h)
      && self
        .nft_contract
        .as_deref()
        .is_none_or(|n| activity.nft_contract == n)
  }
}

/// Result of a conditional status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
  /// This caller won the compare-and-swap.
  Applied,
  /// Another transition already landed; carries the settled status.
  AlreadyTerminal(ActivityStatus),
}

/// Supporting evidence recorded alongside a transition.
#[derive(Debug, Clone)]
pub struct TransitionEvidence {
  /// Receipt hash that justified the transition, when on-chain.
  pub transaction_hash: Option<String>,
  pub observed_at: DateTime<Utc>,
}

impl TransitionEvidence {
  pub fn from_tx(transaction_hash: impl Into<String>) -> Self {
    Self {
      transaction_hash: Some(transaction_hash.into()),
      observed_at: Utc::now(),
    }
  }

  pub fn observed() -> Self {
    Self {
      transaction_hash: None,
      observed_at: Utc::now(),
    }
  }
}

/// Trait for the persisted ledger store.
#[async_trait]
pub trait ActivityStore: Send + Sync + 'static {
  /// Insert or replace a record by id.
  async fn save(&self, activity: Activity) -> anyhow::Result<Activity>;

  async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Activity>>;

  async fn find_one(
    &self,
    filter: &ActivityFilter,
  ) -> anyhow::Result<Option<Activity>>;

  async fn find(&self, filter: &ActivityFilter) -> anyhow::Result<Vec<Activity>>;

  /// Compare-and-swap status update: applies `next` only while the
  /// current status is `Valid`. Unknown ids are an error; lost races
  /// are `Ok(AlreadyTerminal)`.
  async fn transition_if_valid(
    &self,
    id: &str,
    next: ActivityStatus,
    evidence: &TransitionEvidence,
  ) -> anyhow::Result<TransitionOutcome>;

  /// Flip `read = true` on every id that is owned by the wallet on
  /// the chain and currently unread; returns the ids actually
  /// flipped.
  async fn mark_read(
    &self,
    ids: &[ActivityId],
    wallet_address: &str,
    chain_id: &str,
  ) -> anyhow::Result<Vec<ActivityId>>;

  async fn is_healthy(&self) -> bool;
}
