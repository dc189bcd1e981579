use std::env::temp_dir;
use std::sync::Arc;
use std::sync::Mutex;

use rocksdb::TransactionDB;
use uuid::Uuid;

use crate::error::CounterError;
use crate::memory::MemoryStore;
use crate::memory::MemoryTxn;
use crate::store::StoreTxn;
use crate::store::TransactionalStore;
use crate::Result;

pub fn init_db() -> anyhow::Result<Arc<TransactionDB>> {
    let mut path = temp_dir();
    path.push(format!("{}.db", Uuid::new_v4()));

    Ok(Arc::new(crate::rocksdb::new(path)?))
}

/// Store whose next `failures` commits return
/// [`CounterError::Conflict`], for driving the retry loop from outside.
pub struct ConflictingStore {
    inner: MemoryStore,
    failures: Mutex<u32>,
}

impl ConflictingStore {
    pub fn new(failures: u32) -> Self {
        ConflictingStore {
            inner: MemoryStore::new(),
            failures: Mutex::new(failures),
        }
    }
}

pub struct ConflictingTxn<'a> {
    inner: MemoryTxn<'a>,
    failures: &'a Mutex<u32>,
}

impl StoreTxn for ConflictingTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.inner.put(key, value)
    }

    fn commit(self) -> Result<()> {
        {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(CounterError::Conflict);
            }
        }

        self.inner.commit()
    }
}

impl TransactionalStore for ConflictingStore {
    type Txn<'a>
        = ConflictingTxn<'a>
    where
        Self: 'a;

    fn begin(&self) -> Self::Txn<'_> {
        ConflictingTxn {
            inner: self.inner.begin(),
            failures: &self.failures,
        }
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        TransactionalStore::get(&self.inner, key)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.inner.scan_prefix(prefix)
    }
}
