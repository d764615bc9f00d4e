//! Memory Cache - TTL Key/Value and Sorted Sets
//!
//! `parking_lot` locks around plain maps; TTL expiry is lazy (checked
//! on read). A closed store honors the degradation contract: every
//! read is a miss, every write a no-op.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::ports::cache::CacheStore;

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process implementation of the cache store port.
#[derive(Default)]
pub struct MemoryCache {
    kv: RwLock<HashMap<String, Entry>>,
    zsets: RwLock<HashMap<String, Vec<(f64, String)>>>,
    open: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn open(&self) -> anyhow::Result<()> {
        self.open.store(true, Ordering::SeqCst);
        info!("Cache store opened");
        Ok(())
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        self.kv.write().clear();
        self.zsets.write().clear();
        info!("Cache store closed");
    }

    async fn get(&self, key: &str) -> Option<String> {
        if !self.open.load(Ordering::SeqCst) {
            return None;
        }
        let now = Instant::now();
        {
            let kv = self.kv.read();
            match kv.get(key) {
                Some(entry) if entry.expires_at > now => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: drop it under the write lock.
        let mut kv = self.kv.write();
        if kv.get(key).is_some_and(|e| e.expires_at <= now) {
            kv.remove(key);
        }
        None
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) {
        if !self.open.load(Ordering::SeqCst) {
            debug!(key, "Cache closed, dropping write");
            return;
        }
        self.kv.write().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) {
        if !self.open.load(Ordering::SeqCst) {
            return;
        }
        let mut zsets = self.zsets.write();
        let set = zsets.entry(key.to_string()).or_default();
        match set.iter_mut().find(|(_, m)| m == member) {
            Some(slot) => slot.0 = score,
            None => set.push((score, member.to_string())),
        }
    }

    async fn zscore(&self, key: &str, member: &str) -> Option<f64> {
        if !self.open.load(Ordering::SeqCst) {
            return None;
        }
        let zsets = self.zsets.read();
        zsets
            .get(key)?
            .iter()
            .find(|(_, m)| m == member)
            .map(|(score, _)| *score)
    }

    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> Vec<String> {
        if !self.open.load(Ordering::SeqCst) {
            return Vec::new();
        }
        let zsets = self.zsets.read();
        let Some(set) = zsets.get(key) else {
            return Vec::new();
        };
        let mut hits: Vec<(f64, String)> = set
            .iter()
            .filter(|(score, _)| *score >= min && *score <= max)
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, member)| member).collect()
    }

    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> u64 {
        if !self.open.load(Ordering::SeqCst) {
            return 0;
        }
        let mut zsets = self.zsets.write();
        let Some(set) = zsets.get_mut(key) else {
            return 0;
        };
        let before = set.len();
        set.retain(|(score, _)| *score < min || *score > max);
        (before - set.len()) as u64
    }

    async fn is_healthy(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}
