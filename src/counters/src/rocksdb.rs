use std::path::Path;

use rocksdb::Direction;
use rocksdb::ErrorKind;
use rocksdb::IteratorMode;
use rocksdb::Options;
use rocksdb::Transaction;
use rocksdb::TransactionDB;
use rocksdb::TransactionDBOptions;

use crate::error::CounterError;
use crate::store::StoreTxn;
use crate::store::TransactionalStore;
use crate::Result;

pub fn new<P: AsRef<Path>>(path: P) -> Result<TransactionDB> {
    let mut opts = Options::default();

    opts.create_if_missing(true);

    let txopts = TransactionDBOptions::default();

    Ok(TransactionDB::open(&opts, &txopts, path)?)
}

fn txn_err(err: rocksdb::Error) -> CounterError {
    match err.kind() {
        ErrorKind::Busy | ErrorKind::TimedOut | ErrorKind::TryAgain => CounterError::Conflict,
        _ => CounterError::RocksDb(err),
    }
}

impl StoreTxn for Transaction<'_, TransactionDB> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        // Exclusive lock at read time. A plain get would let two
        // read-modify-write transactions read the same base value and the
        // later commit silently drop the earlier increment.
        self.get_for_update(key, true).map_err(txn_err)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        Transaction::put(self, key, value).map_err(txn_err)
    }

    fn commit(self) -> Result<()> {
        Transaction::commit(self).map_err(txn_err)
    }
}

impl TransactionalStore for TransactionDB {
    type Txn<'a>
        = Transaction<'a, TransactionDB>
    where
        Self: 'a;

    fn begin(&self) -> Self::Txn<'_> {
        self.transaction()
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(TransactionDB::get(self, key)?)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut rows = Vec::new();
        for entry in self.iterator(IteratorMode::From(prefix, Direction::Forward)) {
            let (key, value) = entry?;
            if !key.starts_with(prefix) {
                break;
            }
            rows.push((key.into_vec(), value.into_vec()));
        }

        Ok(rows)
    }
}
