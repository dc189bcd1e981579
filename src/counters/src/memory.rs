use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::store::StoreTxn;
use crate::store::TransactionalStore;
use crate::Result;

/// In-memory [`TransactionalStore`] for tests and embedding. A transaction
/// holds the map lock for its whole lifetime, so every read-modify-write is
/// serialized and never conflicts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct MemoryTxn<'a> {
    data: MutexGuard<'a, BTreeMap<Vec<u8>, Vec<u8>>>,
    writes: Vec<(Vec<u8>, Vec<u8>)>,
}

impl StoreTxn for MemoryTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some((_, value)) = self.writes.iter().rev().find(|(k, _)| k.as_slice() == key) {
            return Ok(Some(value.clone()));
        }

        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.writes.push((key.to_vec(), value.to_vec()));
        Ok(())
    }

    fn commit(mut self) -> Result<()> {
        for (key, value) in self.writes.drain(..) {
            self.data.insert(key, value);
        }
        Ok(())
    }
}

impl TransactionalStore for MemoryStore {
    type Txn<'a>
        = MemoryTxn<'a>
    where
        Self: 'a;

    fn begin(&self) -> Self::Txn<'_> {
        MemoryTxn {
            data: self.data.lock().unwrap(),
            writes: Vec::new(),
        }
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let data = self.data.lock().unwrap();

        Ok(data
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}
