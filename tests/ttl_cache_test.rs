//! Tests for [`BoundedTtlCache`] — bounded TTL storage with
//! oldest-insertion-first eviction.

use std::time::Duration;

use trimrank::{BoundedTtlCache, CacheConfig};

fn cache_with(max: usize, ttl: Duration) -> BoundedTtlCache<String, u32> {
    BoundedTtlCache::new(CacheConfig::new("test").max_entries(max).ttl(ttl)).unwrap()
}

#[test]
fn cache_miss_returns_none() {
    let cache = cache_with(10, Duration::from_secs(60));
    assert!(cache.get(&"nonexistent".to_string()).is_none());
}

#[test]
fn insert_then_get() {
    let cache = cache_with(10, Duration::from_secs(60));
    cache.set("brooklyn, ny".to_string(), 7);
    assert_eq!(cache.get(&"brooklyn, ny".to_string()), Some(7));
}

#[test]
fn size_never_exceeds_capacity() {
    let cache = cache_with(5, Duration::from_secs(60));
    for i in 0..50 {
        cache.set(format!("key-{i}"), i);
        assert!(cache.stats().size <= 5);
    }
}

#[test]
fn oldest_insertion_is_evicted_first() {
    let cache = cache_with(3, Duration::from_secs(60));
    cache.set("first".to_string(), 1);
    cache.set("second".to_string(), 2);
    cache.set("third".to_string(), 3);
    cache.set("fourth".to_string(), 4);

    assert!(cache.get(&"first".to_string()).is_none());
    assert_eq!(cache.get(&"second".to_string()), Some(2));
    assert_eq!(cache.get(&"third".to_string()), Some(3));
    assert_eq!(cache.get(&"fourth".to_string()), Some(4));
}

#[test]
fn eviction_tracks_insertion_age_not_key_order() {
    let cache = cache_with(2, Duration::from_secs(60));
    cache.set("z-late-alphabet".to_string(), 1);
    cache.set("a-early-alphabet".to_string(), 2);
    cache.set("m-newest".to_string(), 3);

    // "z-late-alphabet" was inserted first, so it goes regardless of key order.
    assert!(cache.get(&"z-late-alphabet".to_string()).is_none());
    assert_eq!(cache.get(&"a-early-alphabet".to_string()), Some(2));
}

#[test]
fn expired_entry_reads_as_absent_and_is_removed() {
    let cache = cache_with(10, Duration::from_millis(20));
    cache.set("soon-gone".to_string(), 1);
    assert_eq!(cache.stats().size, 1);

    std::thread::sleep(Duration::from_millis(50));

    assert!(cache.get(&"soon-gone".to_string()).is_none());
    // The stale entry was removed as a side effect of the read.
    assert_eq!(cache.stats().size, 0);
}

#[test]
fn set_purges_expired_before_evicting() {
    let cache = cache_with(2, Duration::from_millis(20));
    cache.set("stale-a".to_string(), 1);
    cache.set("stale-b".to_string(), 2);

    std::thread::sleep(Duration::from_millis(50));

    // Both entries are expired; the insert purges them instead of evicting
    // a live one, so the fresh pair coexists.
    cache.set("fresh-a".to_string(), 3);
    cache.set("fresh-b".to_string(), 4);
    assert_eq!(cache.get(&"fresh-a".to_string()), Some(3));
    assert_eq!(cache.get(&"fresh-b".to_string()), Some(4));
    assert_eq!(cache.stats().size, 2);
}

#[test]
fn clear_returns_removed_count() {
    let cache = cache_with(10, Duration::from_secs(60));
    for i in 0..4 {
        cache.set(format!("key-{i}"), i);
    }
    assert_eq!(cache.clear(), 4);
    assert_eq!(cache.clear(), 0);
    assert_eq!(cache.stats().size, 0);
}

#[test]
fn stats_reflect_configuration() {
    let cache = cache_with(50, Duration::from_secs(3600));
    let stats = cache.stats();
    assert_eq!(stats.size, 0);
    assert_eq!(stats.max_entries, 50);
    assert_eq!(stats.ttl_seconds, 3600);
}

#[test]
fn thread_safety() {
    use std::sync::Arc;
    use std::thread;

    let cache = Arc::new(cache_with(20, Duration::from_secs(60)));
    let mut handles = Vec::new();

    // Spawn writers
    for t in 0..4 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                cache.set(format!("key-{t}-{i}"), i);
            }
        }));
    }

    // Spawn readers
    for t in 0..4 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                let _ = cache.get(&format!("key-{t}-{i}"));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(cache.stats().size <= 20);
}
