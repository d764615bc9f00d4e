//! RPC Chain Client - Transaction and Receipt Lookups
//!
//! Implements the chain client port on top of the shared provider.
//! Confirmation counts are derived from the current head; receipt
//! waits poll the node under a configured deadline.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::B256;
use alloy::providers::Provider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::config::ChainConfig;
use crate::ports::chain::{ChainClient, ChainTransaction, ReceiptLog};

use super::provider::RpcProvider;

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Concrete chain client behind the validator's port.
pub struct RpcChainClient {
    provider: Arc<dyn Provider + Send + Sync>,
    receipt_timeout: Duration,
}

impl RpcChainClient {
    pub fn new(provider: &RpcProvider, config: &ChainConfig) -> Self {
        Self {
            provider: provider.inner(),
            receipt_timeout: Duration::from_secs(config.receipt_timeout_seconds),
        }
    }

    async fn poll_receipt(&self, hash: B256) -> Result<Vec<ReceiptLog>> {
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(hash)
                .await
                .context("Failed to query transaction receipt")?;

            if let Some(receipt) = receipt {
                let logs = receipt
                    .inner
                    .logs()
                    .iter()
                    .map(|log| ReceiptLog {
                        address: log.inner.address,
                        topics: log.inner.data.topics().to_vec(),
                        data: log.inner.data.data.clone(),
                    })
                    .collect();
                return Ok(logs);
            }

            debug!(tx = %hash, "Receipt not yet available, polling");
            sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn transaction(&self, hash: B256) -> Result<Option<ChainTransaction>> {
        let Some(tx) = self
            .provider
            .get_transaction_by_hash(hash)
            .await
            .context("Failed to query transaction")?
        else {
            return Ok(None);
        };

        let confirmations = match tx.block_number {
            Some(mined_in) => {
                let head = self
                    .provider
                    .get_block_number()
                    .await
                    .context("Failed to query block number")?;
                head.saturating_sub(mined_in) + 1
            }
            None => 0,
        };

        Ok(Some(ChainTransaction {
            hash,
            block_number: tx.block_number,
            confirmations,
        }))
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<Vec<ReceiptLog>> {
        timeout(self.receipt_timeout, self.poll_receipt(hash))
            .await
            .context("Timed out waiting for transaction receipt")?
    }

    async fn is_healthy(&self) -> bool {
        self.provider.get_block_number().await.is_ok()
    }
}
