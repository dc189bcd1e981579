use rand::thread_rng;
use rand::Rng;

use crate::error::CounterError;
use crate::Result;

/// Picks the shard an increment lands on.
pub trait ShardSelector: Send + Sync {
    /// Returns an index in `[0, shard_count)`. A zero shard count is a
    /// programming error and fails fast.
    fn pick(&self, shard_count: u64) -> Result<u64>;
}

/// Uniformly random selection. Uniformity is what spreads concurrent
/// writers across shards; a skewed pick reintroduces the hotspot the
/// sharding exists to remove.
#[derive(Debug, Default)]
pub struct RandomSelector;

impl ShardSelector for RandomSelector {
    fn pick(&self, shard_count: u64) -> Result<u64> {
        if shard_count == 0 {
            return Err(CounterError::InvalidShardCount(shard_count));
        }
        Ok(thread_rng().gen_range(0..shard_count))
    }
}

/// Always lands on the same shard, clamped to the valid range. Test seam
/// for pinning increments to a known row.
#[derive(Debug)]
pub struct FixedSelector(pub u64);

impl ShardSelector for FixedSelector {
    fn pick(&self, shard_count: u64) -> Result<u64> {
        if shard_count == 0 {
            return Err(CounterError::InvalidShardCount(shard_count));
        }
        Ok(self.0.min(shard_count - 1))
    }
}
