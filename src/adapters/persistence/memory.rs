//! Memory Activity Store - Ledger Records Behind One Write Lock
//!
//! `transition_if_valid` does its check-and-set entirely inside the
//! write lock, so two racing transitions serialize and exactly one
//! observes `Applied`.

use std::collections::HashMap;

use anyhow::bail;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::activity::{Activity, ActivityId, ActivityStatus};
use crate::ports::store::{
    ActivityFilter, ActivityStore, TransitionEvidence, TransitionOutcome,
};

/// In-process implementation of the activity store port.
#[derive(Default)]
pub struct MemoryActivityStore {
    records: RwLock<HashMap<ActivityId, Activity>>,
}

impl MemoryActivityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityStore for MemoryActivityStore {
    async fn save(&self, activity: Activity) -> anyhow::Result<Activity> {
        let mut records = self.records.write().await;
        records.insert(activity.id.clone(), activity.clone());
        Ok(activity)
    }

    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Activity>> {
        let records = self.records.read().await;
        Ok(records.get(id).cloned())
    }

    async fn find_one(
        &self,
        filter: &ActivityFilter,
    ) -> anyhow::Result<Option<Activity>> {
        let records = self.records.read().await;
        Ok(records.values().find(|a| filter.matches(a)).cloned())
    }

    async fn find(&self, filter: &ActivityFilter) -> anyhow::Result<Vec<Activity>> {
        let records = self.records.read().await;
        let mut hits: Vec<Activity> = records
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        // Newest first, stable across runs.
        hits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.id.cmp(&b.id)));
        Ok(hits)
    }

    async fn transition_if_valid(
        &self,
        id: &str,
        next: ActivityStatus,
        evidence: &TransitionEvidence,
    ) -> anyhow::Result<TransitionOutcome> {
        let mut records = self.records.write().await;
        let Some(activity) = records.get_mut(id) else {
            bail!("No activity with id {id}");
        };

        if !activity.status.can_transition_to(next) {
            debug!(id, current = ?activity.status, "Transition lost the race");
            return Ok(TransitionOutcome::AlreadyTerminal(activity.status));
        }

        activity.status = next;
        activity.transition_tx = evidence.transaction_hash.clone();
        activity.updated_at = evidence.observed_at;
        Ok(TransitionOutcome::Applied)
    }

    async fn mark_read(
        &self,
        ids: &[ActivityId],
        wallet_address: &str,
        chain_id: &str,
    ) -> anyhow::Result<Vec<ActivityId>> {
        let mut records = self.records.write().await;
        let mut flipped = Vec::new();
        for id in ids {
            let Some(activity) = records.get_mut(id) else {
                continue;
            };
            if activity.wallet_address != wallet_address
                || activity.chain_id != chain_id
                || activity.read
            {
                continue;
            }
            activity.read = true;
            activity.updated_at = Utc::now();
            flipped.push(id.clone());
        }
        Ok(flipped)
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
