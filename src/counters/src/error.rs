use std::result;

use thiserror::Error;

pub type Result<T> = result::Result<T, CounterError>;

#[derive(Error, Debug)]
pub enum CounterError {
    #[error("invalid shard count {0}")]
    InvalidShardCount(u64),
    #[error("transaction conflict")]
    Conflict,
    #[error("write conflict persisted after {0} attempts")]
    TransientWriteFailure(u32),
    #[error("rocksdb {0}")]
    RocksDb(#[from] rocksdb::Error),
    #[error("bincode {0:?}")]
    Bincode(#[from] bincode::Error),
    #[error("io {0}")]
    Io(#[from] std::io::Error),
    #[error("internal: {0:?}")]
    Internal(String),
}

impl CounterError {
    /// Whether retrying the failed operation can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CounterError::Conflict | CounterError::TransientWriteFailure(_)
        )
    }
}
