//! Trimrank — caching, metrics, and ranking engine for barber discovery.
//!
//! This crate is the core that sits in front of expensive, rate-limited
//! external calls (geocoding, place search, review-based AI scoring) and
//! continuously measures its own effectiveness:
//!
//! - [`BoundedTtlCache`] — bounded keyed cache with per-entry expiry and
//!   oldest-insertion-first eviction, one instance per cache domain.
//! - [`MetricsAggregator`] — shared performance aggregator: cache hit/miss
//!   counters, time-saved and speedup estimates, bounded latency windows
//!   with nearest-rank percentiles.
//! - [`RankingEngine`] — scores candidates against target styles with
//!   bounded parallel enrichment calls and a deterministic composite
//!   ranking.
//!
//! # Ranking example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trimrank::{Candidate, MetricsAggregator, RankingConfig, RankingEngine};
//!
//! # async fn run() -> trimrank::Result<()> {
//! let metrics = Arc::new(MetricsAggregator::new());
//! let engine = RankingEngine::new(RankingConfig::new(), None, Arc::clone(&metrics))?;
//!
//! let candidates = vec![
//!     Candidate::new("Modern Fade Studio", 4.8, 120),
//!     Candidate::new("Corner Cuts", 4.2, 35),
//! ];
//! let styles = vec!["Modern Fade".to_string()];
//!
//! let ranked = engine.rank(candidates, &styles).await;
//! println!("best match: {}", ranked[0].candidate.name);
//! # Ok(())
//! # }
//! ```
//!
//! # Caching an external lookup
//!
//! Callers wrap their own external calls: check the cache, report the hit
//! or miss (with observed latencies) to the aggregator, and fill the cache
//! on a miss. Timing is explicit — measure, then record.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Instant;
//! use trimrank::{BoundedTtlCache, CacheConfig, MetricsAggregator};
//!
//! # fn lookup(location: &str) -> String { String::new() }
//! # fn run() -> trimrank::Result<()> {
//! let metrics = Arc::new(MetricsAggregator::new());
//! let cache: BoundedTtlCache<String, String> =
//!     BoundedTtlCache::new(CacheConfig::new("place-search").max_entries(50))?;
//!
//! let key = "  Brooklyn, NY ".trim().to_lowercase();
//! let started = Instant::now();
//! let result = match cache.get(&key) {
//!     Some(hit) => {
//!         metrics.record_cache_hit("place-search", Some(started.elapsed().as_secs_f64() * 1000.0));
//!         hit
//!     }
//!     None => {
//!         metrics.record_cache_miss("place-search");
//!         let fresh = lookup(&key);
//!         metrics.record_api_call_time("place-search", started.elapsed().as_secs_f64() * 1000.0);
//!         cache.set(key, fresh.clone());
//!         fresh
//!     }
//! };
//! # let _ = result;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod rank;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use cache::{BoundedTtlCache, CacheConfig, CacheStats};
pub use error::{Result, TrimrankError};
pub use rank::{
    RankedCandidate, RankingConfig, RankingEngine, StyleAnalyzer, build_search_keywords,
    condense_reviews,
};
pub use telemetry::{
    ApiLatencyStats, CacheSavings, EndpointReport, MetricsAggregator, MetricsConfig, MetricsReport,
    ResponseTimeStats,
};
pub use types::{Candidate, Review, StyleAnalysis, StyleMatch};
