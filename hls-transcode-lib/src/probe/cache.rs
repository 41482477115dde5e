//! Probe result cache
//!
//! Entries are keyed by path and modification time, so an edited file
//! never hits a stale entry. Expired entries read as misses and are
//! removed by [`ProbeCache::sweep_expired`].

use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::types::{MediaFile, ProbeResult};

/// Cache entry with metadata
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Arc<ProbeResult>,
    pub created_at: Instant,
}

impl CacheEntry {
    pub fn new(data: Arc<ProbeResult>) -> Self {
        Self {
            data,
            created_at: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct ProbeCacheStats {
    pub entries: usize,
    pub oldest_age_secs: u64,
    pub ttl_secs: u64,
    pub hits: u64,
    pub misses: u64,
}

/// TTL cache of probe results
pub struct ProbeCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ProbeCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// `"probe:" + sha256(path, mtime)` in hex.
    pub fn make_key(media: &MediaFile) -> String {
        let mut hasher = Sha256::new();
        hasher.update(media.path.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        hasher.update(media.mtime_nanos().to_string().as_bytes());
        format!("probe:{}", hex::encode(hasher.finalize()))
    }

    /// Get a live entry.
    pub fn get(&self, key: &str) -> Option<Arc<ProbeResult>> {
        let found = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(self.ttl) => Some(entry.data.clone()),
            _ => None,
        };
        match found {
            Some(data) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(data)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.entries.remove_if(key, |_, e| e.is_expired(self.ttl));
                None
            }
        }
    }

    /// Insert or overwrite an entry.
    pub fn insert(&self, key: String, data: Arc<ProbeResult>) {
        self.entries.insert(key, CacheEntry::new(data));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove expired entries, returning how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.is_expired(self.ttl));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> ProbeCacheStats {
        let oldest_age_secs = self
            .entries
            .iter()
            .map(|e| e.value().age().as_secs())
            .max()
            .unwrap_or(0);
        ProbeCacheStats {
            entries: self.entries.len(),
            oldest_age_secs,
            ttl_secs: self.ttl.as_secs(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
