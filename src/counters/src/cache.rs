use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::Duration;
use std::time::Instant;

use lru::LruCache;
use serde::Deserialize;
use serde::Serialize;

const CAPACITY: usize = 4096;

pub fn aggregate_key(counter: &str) -> String {
    format!("aggregate:{counter}")
}

pub fn shard_count_key(counter: &str) -> String {
    format!("shardcount:{counter}")
}

/// Staleness policy for cached aggregates. Fixed per service instance:
/// mixing policies for the same counter leaves the staleness bound
/// undefined.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CachePolicy {
    /// Read misses repopulate with `put_if_absent` under this TTL; writes
    /// leave the cached aggregate alone and the TTL bounds staleness.
    Ttl(Duration),
    /// Read misses repopulate without expiry and every successful
    /// increment bumps the cached aggregate in place.
    WriteThrough,
}

/// Best-effort integer cache. Absence, expiry and eviction all read as a
/// miss; no method can fail.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<i64>;

    fn put(&self, key: &str, value: i64);

    /// Writes only when no fresh value is present, so a racing reader's
    /// fresher value is not clobbered.
    fn put_if_absent(&self, key: &str, value: i64, ttl: Duration);

    /// Bumps an existing fresh entry, returning the new value.
    fn increment(&self, key: &str, delta: i64) -> Option<i64>;
}

#[derive(Debug, Clone)]
struct Entry {
    value: i64,
    expires_at: Option<Instant>,
}

impl Entry {
    fn fresh(&self) -> bool {
        match self.expires_at {
            None => true,
            Some(at) => Instant::now() < at,
        }
    }
}

pub struct MemoryCache {
    entries: RwLock<LruCache<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        MemoryCache {
            entries: RwLock::new(LruCache::new(NonZeroUsize::new(CAPACITY).unwrap())),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<i64> {
        let mut entries = self.entries.write().unwrap();
        match entries.get(key) {
            Some(entry) if entry.fresh() => Some(entry.value),
            Some(_) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: &str, value: i64) {
        self.entries.write().unwrap().put(key.to_string(), Entry {
            value,
            expires_at: None,
        });
    }

    fn put_if_absent(&self, key: &str, value: i64, ttl: Duration) {
        let mut entries = self.entries.write().unwrap();
        if let Some(entry) = entries.get(key) {
            if entry.fresh() {
                return;
            }
        }

        entries.put(key.to_string(), Entry {
            value,
            expires_at: Some(Instant::now() + ttl),
        });
    }

    fn increment(&self, key: &str, delta: i64) -> Option<i64> {
        let mut entries = self.entries.write().unwrap();
        match entries.get_mut(key) {
            Some(entry) if entry.fresh() => {
                entry.value += delta;
                Some(entry.value)
            }
            _ => None,
        }
    }
}

/// Cache that never hits. Stands in where a deployment runs without a
/// cache tier, and in tests proving the store path alone is correct.
#[derive(Debug, Default)]
pub struct NoopCache;

impl Cache for NoopCache {
    fn get(&self, _key: &str) -> Option<i64> {
        None
    }

    fn put(&self, _key: &str, _value: i64) {}

    fn put_if_absent(&self, _key: &str, _value: i64, _ttl: Duration) {}

    fn increment(&self, _key: &str, _delta: i64) -> Option<i64> {
        None
    }
}
