//! Bounded TTL cache with oldest-insertion-first eviction.
//!
//! [`BoundedTtlCache`] fronts rate-limited external calls (geocoding, place
//! search, style analysis). Entries expire after a fixed TTL and the cache
//! never holds more than `max_entries` at once; when full, the entry with
//! the oldest insertion time is evicted.
//!
//! # Eviction order
//!
//! Eviction is oldest-insertion-first, not least-recently-used. The keys
//! are low-cardinality (locations, candidate names) and reuse is bursty
//! rather than recency-skewed, so insertion age is the signal that matters.
//! Callers depend on this order — do not change it to LRU.
//!
//! # Telemetry
//!
//! Every lookup emits a facade hit/miss counter labelled with the cache's
//! series name. The in-process [`MetricsAggregator`](crate::MetricsAggregator)
//! is fed by the caller instead, which also knows the served latency.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::telemetry;
use crate::{Result, TrimrankError};

/// Configuration for a [`BoundedTtlCache`].
///
/// ```rust
/// # use trimrank::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new("place-search")
///     .max_entries(50)
///     .ttl(Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Series name used as the telemetry label (e.g. "geocode").
    pub name: String,
    /// Maximum number of entries. Default: 100.
    pub max_entries: usize,
    /// Time-to-live for entries. Default: 1 hour.
    pub ttl: Duration,
}

impl CacheConfig {
    /// Create a config with sensible defaults for the given series name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_entries: 100,
            ttl: Duration::from_secs(3600),
        }
    }

    /// Set the maximum number of entries.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Side-effect-free cache introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently held (may include not-yet-purged expired entries).
    pub size: usize,
    /// Configured capacity.
    pub max_entries: usize,
    /// Configured TTL in whole seconds.
    pub ttl_seconds: u64,
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Thread-safe keyed store with per-entry expiry and bounded capacity.
///
/// One instance per logical cache domain ("geocode", "place-search",
/// "style-analysis"); domains must not share an instance, or their keys
/// would collide.
pub struct BoundedTtlCache<K, V> {
    name: String,
    ttl: Duration,
    max_entries: usize,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> BoundedTtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache from the given configuration.
    ///
    /// Fails fast on a zero capacity or zero TTL.
    pub fn new(config: CacheConfig) -> Result<Self> {
        if config.max_entries == 0 {
            return Err(TrimrankError::Configuration(
                "cache max_entries must be non-zero".to_string(),
            ));
        }
        if config.ttl.is_zero() {
            return Err(TrimrankError::Configuration(
                "cache ttl must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            name: config.name,
            ttl: config.ttl,
            max_entries: config.max_entries,
            entries: Mutex::new(HashMap::new()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up a value.
    ///
    /// Never returns an expired entry: an expired hit is treated as a miss
    /// and the stale entry is removed as a side effect. Emits a facade
    /// hit/miss counter either way.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.lock();
        let hit = match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        };
        if hit.is_some() {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "cache" => self.name.clone())
                .increment(1);
        } else {
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "cache" => self.name.clone())
                .increment(1);
        }
        hit
    }

    /// Insert or overwrite a value. Always succeeds.
    ///
    /// Expired entries are purged first; if the cache is still at capacity,
    /// the entry with the oldest insertion time is evicted.
    pub fn set(&self, key: K, value: V) {
        let mut entries = self.lock();

        let purged = Self::purge_expired(&mut entries, self.ttl);
        if purged > 0 {
            debug!(cache = %self.name, purged, "purged expired cache entries");
        }

        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Remove every entry, returning the number removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    /// Current size and configuration.
    pub fn stats(&self) -> CacheStats {
        let entries = self.lock();
        CacheStats {
            size: entries.len(),
            max_entries: self.max_entries,
            ttl_seconds: self.ttl.as_secs(),
        }
    }

    fn purge_expired(entries: &mut HashMap<K, Entry<V>>, ttl: Duration) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cache(max: usize) -> BoundedTtlCache<String, u32> {
        BoundedTtlCache::new(CacheConfig::new("test").max_entries(max)).unwrap()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(BoundedTtlCache::<String, u32>::new(CacheConfig::new("test").max_entries(0)).is_err());
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let config = CacheConfig::new("test").ttl(Duration::ZERO);
        assert!(BoundedTtlCache::<String, u32>::new(config).is_err());
    }

    #[test]
    fn miss_returns_none() {
        let cache = small_cache(10);
        assert!(cache.get(&"absent".to_string()).is_none());
    }

    #[test]
    fn overwrite_replaces_entry_without_growing() {
        let cache = small_cache(10);
        cache.set("k".to_string(), 1);
        cache.set("k".to_string(), 2);
        assert_eq!(cache.get(&"k".to_string()), Some(2));
        assert_eq!(cache.stats().size, 1);
    }

    #[test]
    fn overwrite_at_capacity_does_not_evict_others() {
        let cache = small_cache(2);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.set("a".to_string(), 3);
        assert_eq!(cache.get(&"a".to_string()), Some(3));
        assert_eq!(cache.get(&"b".to_string()), Some(2));
    }

    #[test]
    fn clear_reports_removed_count() {
        let cache = small_cache(10);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        assert_eq!(cache.clear(), 2);
        assert_eq!(cache.stats().size, 0);
    }
}
