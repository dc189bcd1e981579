use std::thread;
use std::time::Duration;

use counters::cache::Cache;
use counters::cache::MemoryCache;
use counters::cache::NoopCache;

#[test]
fn test_put_get() {
    let cache = MemoryCache::new();

    cache.put("aggregate:orders", 100);
    assert_eq!(cache.get("aggregate:orders"), Some(100));
    assert_eq!(cache.get("aggregate:refunds"), None);
}

#[test]
fn test_ttl_expiry() {
    let cache = MemoryCache::new();

    cache.put_if_absent("aggregate:orders", 100, Duration::from_millis(40));
    assert_eq!(cache.get("aggregate:orders"), Some(100));

    thread::sleep(Duration::from_millis(60));
    assert_eq!(cache.get("aggregate:orders"), None);
}

#[test]
fn test_put_if_absent_keeps_fresh_value() {
    let cache = MemoryCache::new();

    cache.put_if_absent("aggregate:orders", 100, Duration::from_secs(60));
    cache.put_if_absent("aggregate:orders", 7, Duration::from_secs(60));
    assert_eq!(cache.get("aggregate:orders"), Some(100));
}

#[test]
fn test_put_if_absent_replaces_expired_value() {
    let cache = MemoryCache::new();

    cache.put_if_absent("aggregate:orders", 100, Duration::from_millis(10));
    thread::sleep(Duration::from_millis(30));
    cache.put_if_absent("aggregate:orders", 7, Duration::from_secs(60));
    assert_eq!(cache.get("aggregate:orders"), Some(7));
}

#[test]
fn test_increment_requires_existing_entry() {
    let cache = MemoryCache::new();

    assert_eq!(cache.increment("aggregate:orders", 3), None);

    cache.put("aggregate:orders", 100);
    assert_eq!(cache.increment("aggregate:orders", 3), Some(103));
    assert_eq!(cache.get("aggregate:orders"), Some(103));
}

#[test]
fn test_noop_cache_always_misses() {
    let cache = NoopCache;

    cache.put("aggregate:orders", 100);
    cache.put_if_absent("shardcount:orders", 5, Duration::from_secs(60));
    assert_eq!(cache.get("aggregate:orders"), None);
    assert_eq!(cache.get("shardcount:orders"), None);
    assert_eq!(cache.increment("aggregate:orders", 1), None);
}
