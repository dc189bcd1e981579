use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::cache::CachePolicy;

/// Shards a counter starts with before it is ever explicitly grown.
pub const DEFAULT_SHARD_COUNT: u64 = 5;
pub const DEFAULT_TXN_ATTEMPTS: u32 = 3;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Shard count assumed for counters with no metadata row.
    pub default_shard_count: u64,
    /// How many conflicting transaction attempts a single write may burn
    /// before the failure is surfaced to the caller.
    pub max_txn_attempts: u32,
    pub cache_policy: CachePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_shard_count: DEFAULT_SHARD_COUNT,
            max_txn_attempts: DEFAULT_TXN_ATTEMPTS,
            cache_policy: CachePolicy::Ttl(DEFAULT_CACHE_TTL),
        }
    }
}
