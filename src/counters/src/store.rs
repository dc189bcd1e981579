use crate::Result;

/// One single-key atomic read-modify-write scope.
pub trait StoreTxn {
    /// Reads `key` and acquires its write lock, so a concurrent writer of
    /// the same key surfaces as [`crate::CounterError::Conflict`] instead
    /// of a lost update.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    fn commit(self) -> Result<()>;
}

/// Key-addressed entity store with single-key transactions and
/// non-transactional range reads.
pub trait TransactionalStore: Send + Sync {
    type Txn<'a>: StoreTxn
    where
        Self: 'a;

    fn begin(&self) -> Self::Txn<'_>;

    /// Plain single-key read outside any transaction.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Reads every `(key, value)` row under `prefix`. Takes no snapshot:
    /// rows written mid-scan may or may not be observed.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
}
