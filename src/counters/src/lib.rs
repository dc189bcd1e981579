pub mod cache;
pub mod config;
pub mod counters;
pub mod error;
pub mod memory;
pub mod rocksdb;
pub mod selector;
pub mod shards;
pub mod store;
pub mod test_util;

pub use error::CounterError;
pub use error::Result;

pub use crate::config::Config;
pub use crate::counters::Counters;

const NAMESPACE: &[u8] = b"counters";

pub fn counters_prefix() -> Vec<u8> {
    [NAMESPACE, b"/"].concat()
}

pub fn counter_ns(counter: &str) -> Vec<u8> {
    [NAMESPACE, b"/", counter.as_bytes()].concat()
}

pub fn make_meta_key(counter: &str) -> Vec<u8> {
    [counter_ns(counter).as_slice(), b"/meta"].concat()
}

pub fn make_shard_prefix(counter: &str) -> Vec<u8> {
    [counter_ns(counter).as_slice(), b"/shards/"].concat()
}

pub fn make_shard_key(counter: &str, index: u64) -> Vec<u8> {
    [
        make_shard_prefix(counter).as_slice(),
        index.to_le_bytes().as_ref(),
    ]
    .concat()
}
