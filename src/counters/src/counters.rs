use std::sync::Arc;

use tracing::trace;

use crate::cache::aggregate_key;
use crate::cache::shard_count_key;
use crate::cache::Cache;
use crate::cache::CachePolicy;
use crate::config::Config;
use crate::selector::RandomSelector;
use crate::selector::ShardSelector;
use crate::shards::CounterMeta;
use crate::shards::Shards;
use crate::store::TransactionalStore;
use crate::Result;

/// Facade over the sharded counter primitives. Callers mutate and query
/// logical counters by name; reads consult the cache first and fall back
/// to the store, which stays the sole source of truth.
///
/// The service itself is stateless and safe to share across any number of
/// threads: contention is resolved by shard spreading and by the store's
/// per-key transactions, not by in-process locks.
pub struct Counters<S> {
    shards: Shards<S>,
    cache: Arc<dyn Cache>,
    selector: Arc<dyn ShardSelector>,
    policy: CachePolicy,
}

impl<S: TransactionalStore> Counters<S> {
    pub fn new(store: Arc<S>, cache: Arc<dyn Cache>, cfg: Config) -> Self {
        Self::with_selector(store, cache, cfg, Arc::new(RandomSelector))
    }

    pub fn with_selector(
        store: Arc<S>,
        cache: Arc<dyn Cache>,
        cfg: Config,
        selector: Arc<dyn ShardSelector>,
    ) -> Self {
        Counters {
            policy: cfg.cache_policy,
            shards: Shards::new(store, cfg),
            cache,
            selector,
        }
    }

    /// Adds 1 to `counter`.
    pub fn increment(&self, counter: &str) -> Result<()> {
        self.increment_by(counter, 1)
    }

    /// Adds `amount` to one selected shard of `counter`.
    ///
    /// A [`crate::CounterError::TransientWriteFailure`] means the retry
    /// budget ran out on a contended shard key. Retrying the whole call is
    /// at-least-once: if the reported-failed transaction had in fact
    /// committed, the retry double-counts.
    pub fn increment_by(&self, counter: &str, amount: i64) -> Result<()> {
        let shard_count = self.shard_count(counter)?;
        let index = self.selector.pick(shard_count)?;
        self.shards.increment(counter, index, amount)?;

        if self.policy == CachePolicy::WriteThrough {
            self.cache.increment(&aggregate_key(counter), amount);
        }

        Ok(())
    }

    /// Approximate total of `counter`, served from cache when possible.
    /// The recomputed sum takes no snapshot across shards, so increments
    /// overlapping the scan may or may not be included.
    pub fn get_count(&self, counter: &str) -> Result<i64> {
        let key = aggregate_key(counter);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let (total, shards_seen) = self.shards.sum(counter)?;
        trace!(counter, total, shards_seen, "aggregate cache miss");
        match self.policy {
            CachePolicy::Ttl(ttl) => self.cache.put_if_absent(&key, total, ttl),
            CachePolicy::WriteThrough => self.cache.put(&key, total),
        }

        Ok(total)
    }

    /// Shard count of `counter`, or the configured default before the
    /// counter has ever been grown. A stale cached count is harmless: the
    /// count only grows, so every index it admits addresses an existing
    /// shard.
    pub fn shard_count(&self, counter: &str) -> Result<u64> {
        let key = shard_count_key(counter);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached as u64);
        }

        let count = self.shards.shard_count(counter)?;
        match self.policy {
            CachePolicy::Ttl(ttl) => self.cache.put_if_absent(&key, count as i64, ttl),
            CachePolicy::WriteThrough => self.cache.put(&key, count as i64),
        }

        Ok(count)
    }

    /// Grows `counter` by `delta` shards, returning the new count. Growing
    /// never changes the logical total, so the aggregate cache entry is
    /// left untouched.
    pub fn add_shards(&self, counter: &str, delta: u64) -> Result<u64> {
        let count = self.shards.grow(counter, delta)?;
        self.cache.put(&shard_count_key(counter), count as i64);

        Ok(count)
    }

    pub fn list(&self) -> Result<Vec<CounterMeta>> {
        self.shards.list()
    }
}
