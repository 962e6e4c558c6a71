//! TTL response cache for successful executions.

use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::time::Instant;

use agent_gateway_core::types::Options;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    inserted_at: Instant,
}

/// Bounded cache keyed by request fingerprint.
///
/// When full, expired entries are purged first and then the oldest entry is
/// evicted. A capacity of zero disables caching.
#[derive(Debug)]
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    capacity: usize,
}

impl ResponseCache {
    /// Create a cache.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity,
        }
    }

    /// Cache that stores nothing.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, 0)
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0 && !self.ttl.is_zero()
    }

    /// Fingerprint of a validated request.
    pub fn key(agent: &str, topic: &str, options: &Options) -> String {
        let mut hasher = Sha256::new();
        hasher.update(agent.as_bytes());
        hasher.update([0u8]);
        hasher.update(topic.as_bytes());
        hasher.update([0u8]);
        hasher.update(Value::Object(options.clone()).to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Fetch a live entry.
    pub fn get(&self, key: &str) -> Option<Value> {
        if !self.is_enabled() {
            return None;
        }

        let (value, expired) = {
            let entry = self.entries.get(key)?;
            (entry.value.clone(), entry.inserted_at.elapsed() > self.ttl)
        };

        if expired {
            self.entries.remove(key);
            return None;
        }
        Some(value)
    }

    /// Store a value.
    pub fn insert(&self, key: String, value: Value) {
        if !self.is_enabled() {
            return;
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.purge_expired();
            if self.entries.len() >= self.capacity {
                self.evict_oldest();
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.inserted_at.elapsed() <= ttl);
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.inserted_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}
