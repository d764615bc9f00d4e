//! Chain Client Port - Transaction and Receipt Lookups
//!
//! Consumed only by the transaction validator. The port deliberately
//! exposes just enough of the chain: a transaction's confirmation
//! count and the raw logs of its receipt.

use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;

/// Minimal view of a fetched transaction.
#[derive(Debug, Clone)]
pub struct ChainTransaction {
  pub hash: B256,
  /// Block the transaction was mined in, `None` while pending.
  pub block_number: Option<u64>,
  /// Number of confirmations; 0 while pending.
  pub confirmations: u64,
}

/// One undecoded receipt log.
#[derive(Debug, Clone)]
pub struct ReceiptLog {
  pub address: Address,
  pub topics: Vec<B256>,
  pub data: Bytes,
}

/// Trait for chain providers.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
  /// Look up a transaction by hash. `None` if the node has never
  /// seen it.
  async fn transaction(&self, hash: B256) -> anyhow::Result<Option<ChainTransaction>>;

  /// Await the transaction's receipt (bounded internally) and return
  /// its logs.
  async fn wait_for_receipt(&self, hash: B256) -> anyhow::Result<Vec<ReceiptLog>>;

  async fn is_healthy(&self) -> bool;
}
