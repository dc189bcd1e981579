use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bincode::deserialize;
use bincode::serialize;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::counters_prefix;
use crate::error::CounterError;
use crate::make_meta_key;
use crate::make_shard_key;
use crate::make_shard_prefix;
use crate::store::StoreTxn;
use crate::store::TransactionalStore;
use crate::Result;

const RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// Per-counter metadata row. The shard count only ever grows.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CounterMeta {
    pub name: String,
    pub shard_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One storage row of a sharded counter. The rows of a counter together
/// hold its logical value; splitting writes across them keeps any single
/// key out of contention.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Shard {
    pub counter_name: String,
    pub index: u64,
    pub count: i64,
}

pub struct Shards<S> {
    store: Arc<S>,
    cfg: Config,
}

impl<S: TransactionalStore> Shards<S> {
    pub fn new(store: Arc<S>, cfg: Config) -> Self {
        Shards { store, cfg }
    }

    fn with_retries<T>(&self, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let max_attempts = self.cfg.max_txn_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op() {
                Err(CounterError::Conflict) if attempt < max_attempts => {
                    debug!(attempt, "transaction conflict, retrying");
                    thread::sleep(RETRY_BACKOFF * attempt);
                }
                Err(CounterError::Conflict) => {
                    return Err(CounterError::TransientWriteFailure(attempt));
                }
                other => return other,
            }
        }
    }

    /// Adds `amount` to one shard row and returns the post-write value. An
    /// absent row is created holding `amount`: existence and first value
    /// are established by the same transaction, not by a provisioning
    /// step.
    pub fn increment(&self, counter: &str, index: u64, amount: i64) -> Result<i64> {
        let key = make_shard_key(counter, index);
        self.with_retries(|| {
            let mut tx = self.store.begin();
            let shard = match tx.get(key.as_slice())? {
                None => Shard {
                    counter_name: counter.to_string(),
                    index,
                    count: amount,
                },
                Some(data) => {
                    let prev: Shard = deserialize(&data)?;
                    Shard {
                        count: prev.count + amount,
                        ..prev
                    }
                }
            };
            tx.put(key.as_slice(), &serialize(&shard)?)?;
            tx.commit()?;

            Ok(shard.count)
        })
    }

    /// Sums every shard row of `counter`, returning the total and the
    /// number of rows seen. Not isolated from concurrent increments: a row
    /// mutated mid-scan lands at its pre- or post-write value.
    pub fn sum(&self, counter: &str) -> Result<(i64, usize)> {
        let rows = self
            .store
            .scan_prefix(make_shard_prefix(counter).as_slice())?;

        let mut total = 0i64;
        for (_, data) in &rows {
            let shard: Shard = deserialize(data)?;
            total += shard.count;
        }

        Ok((total, rows.len()))
    }

    /// Current shard count, or the configured default when the counter has
    /// never been grown. Never creates the metadata row.
    pub fn shard_count(&self, counter: &str) -> Result<u64> {
        match self.store.get(make_meta_key(counter).as_slice())? {
            None => Ok(self.cfg.default_shard_count),
            Some(data) => {
                let meta: CounterMeta = deserialize(&data)?;
                Ok(meta.shard_count)
            }
        }
    }

    /// Grows `counter` by `delta` shards and returns the new count. A zero
    /// delta only reads: it must not materialize metadata for a counter
    /// nobody has written.
    ///
    /// New shard rows are not written here; the first increment that picks
    /// a fresh index creates its row.
    pub fn grow(&self, counter: &str, delta: u64) -> Result<u64> {
        if delta == 0 {
            return self.shard_count(counter);
        }

        let key = make_meta_key(counter);
        let shard_count = self.with_retries(|| {
            let mut tx = self.store.begin();
            let meta = match tx.get(key.as_slice())? {
                None => CounterMeta {
                    name: counter.to_string(),
                    shard_count: self.cfg.default_shard_count + delta,
                    created_at: Utc::now(),
                    updated_at: None,
                },
                Some(data) => {
                    let prev: CounterMeta = deserialize(&data)?;
                    CounterMeta {
                        shard_count: prev.shard_count + delta,
                        updated_at: Some(Utc::now()),
                        ..prev
                    }
                }
            };
            tx.put(key.as_slice(), &serialize(&meta)?)?;
            tx.commit()?;

            Ok(meta.shard_count)
        })?;

        debug!(counter, shard_count, "grew counter");
        Ok(shard_count)
    }

    /// Every counter that has been explicitly grown.
    pub fn list(&self) -> Result<Vec<CounterMeta>> {
        let rows = self.store.scan_prefix(counters_prefix().as_slice())?;

        let mut metas = Vec::new();
        for (key, data) in &rows {
            if key.ends_with(b"/meta") {
                metas.push(deserialize(data)?);
            }
        }

        Ok(metas)
    }
}
