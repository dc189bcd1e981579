use std::sync::Arc;
use std::thread;
use std::time::Duration;

use counters::cache::CachePolicy;
use counters::cache::MemoryCache;
use counters::cache::NoopCache;
use counters::config::Config;
use counters::error::Result;
use counters::make_meta_key;
use counters::memory::MemoryStore;
use counters::selector::FixedSelector;
use counters::store::TransactionalStore;
use counters::test_util;
use counters::CounterError;
use counters::Counters;

#[test]
fn test_conservation_without_cache() -> Result<()> {
    let db = test_util::init_db().unwrap();
    let counters = Counters::new(db, Arc::new(NoopCache), Config::default());

    assert_eq!(counters.shard_count("orders")?, 5);
    for _ in 0..100 {
        counters.increment("orders")?;
    }
    assert_eq!(counters.get_count("orders")?, 100);
    Ok(())
}

#[test]
fn test_add_shards() -> Result<()> {
    let db = test_util::init_db().unwrap();
    let counters = Counters::new(db, Arc::new(NoopCache), Config::default());

    assert_eq!(counters.add_shards("orders", 3)?, 8);
    assert_eq!(counters.shard_count("orders")?, 8);
    assert_eq!(counters.add_shards("orders", 0)?, 8);
    assert_eq!(counters.add_shards("orders", 2)?, 10);
    Ok(())
}

#[test]
fn test_add_shards_zero_delta_on_nonexistent_counter() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let counters = Counters::new(store.clone(), Arc::new(NoopCache), Config::default());

    assert_eq!(counters.add_shards("ghost", 0)?, 5);
    assert!(store.get(make_meta_key("ghost").as_slice())?.is_none());
    assert!(counters.list()?.is_empty());
    Ok(())
}

#[test]
fn test_first_increment_creates_shard_with_amount() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let counters = Counters::with_selector(
        store,
        Arc::new(NoopCache),
        Config::default(),
        Arc::new(FixedSelector(2)),
    );

    counters.increment_by("orders", 7)?;
    assert_eq!(counters.get_count("orders")?, 7);
    Ok(())
}

#[test]
fn test_invalid_shard_count_fails_fast() {
    let counters = Counters::new(
        Arc::new(MemoryStore::new()),
        Arc::new(NoopCache),
        Config {
            default_shard_count: 0,
            ..Default::default()
        },
    );

    let err = counters.increment("orders").unwrap_err();
    assert!(matches!(err, CounterError::InvalidShardCount(0)));
    assert!(!err.is_transient());
}

#[test]
fn test_ttl_policy_staleness_bound() -> Result<()> {
    let ttl = Duration::from_millis(500);
    let counters = Counters::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryCache::new()),
        Config {
            cache_policy: CachePolicy::Ttl(ttl),
            ..Default::default()
        },
    );

    for _ in 0..10 {
        counters.increment("orders")?;
    }
    assert_eq!(counters.get_count("orders")?, 10);

    counters.increment("orders")?;
    // Within the TTL the cached total is served, stale by design.
    assert_eq!(counters.get_count("orders")?, 10);

    thread::sleep(ttl + Duration::from_millis(100));
    assert_eq!(counters.get_count("orders")?, 11);
    Ok(())
}

#[test]
fn test_write_through_policy_stays_fresh() -> Result<()> {
    let counters = Counters::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryCache::new()),
        Config {
            cache_policy: CachePolicy::WriteThrough,
            ..Default::default()
        },
    );

    for _ in 0..5 {
        counters.increment("orders")?;
    }
    assert_eq!(counters.get_count("orders")?, 5);

    counters.increment("orders")?;
    assert_eq!(counters.get_count("orders")?, 6);

    // Growing the shard count never changes the logical total.
    counters.add_shards("orders", 3)?;
    assert_eq!(counters.get_count("orders")?, 6);
    Ok(())
}

#[test]
fn test_add_shards_refreshes_cached_shard_count() -> Result<()> {
    let counters = Counters::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryCache::new()),
        Config::default(),
    );

    assert_eq!(counters.shard_count("orders")?, 5);
    assert_eq!(counters.add_shards("orders", 3)?, 8);
    // The cached entry is updated in place, not left to expire.
    assert_eq!(counters.shard_count("orders")?, 8);
    Ok(())
}

#[test]
fn test_concurrent_increments_to_one_shard_lose_nothing() -> Result<()> {
    let db = test_util::init_db().unwrap();
    let counters = Arc::new(Counters::with_selector(
        db,
        Arc::new(NoopCache),
        Config::default(),
        Arc::new(FixedSelector(0)),
    ));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let counters = counters.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..25 {
                counters.increment("orders").unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(counters.get_count("orders")?, 100);
    Ok(())
}

#[test]
fn test_list_counters() -> Result<()> {
    let counters = Counters::new(
        Arc::new(MemoryStore::new()),
        Arc::new(NoopCache),
        Config::default(),
    );

    counters.add_shards("orders", 1)?;
    counters.add_shards("refunds", 2)?;
    counters.increment("pageviews")?;

    let mut names = counters
        .list()?
        .into_iter()
        .map(|meta| meta.name)
        .collect::<Vec<_>>();
    names.sort();
    assert_eq!(names, vec!["orders".to_string(), "refunds".to_string()]);
    Ok(())
}
