//! Caching subsystem.
//!
//! One cache type, [`BoundedTtlCache`], instantiated once per logical cache
//! domain:
//!
//! - "geocode" / "place-search" — memoization in front of rate-limited
//!   external lookups, keyed on a normalized request signature (lowercased,
//!   trimmed location string).
//! - "style-analysis" — the [`RankingEngine`](crate::RankingEngine)'s
//!   secondary cache, keyed on candidate name plus the sorted target-style
//!   list.
//!
//! Domains get distinct instances so unrelated keys cannot collide. See
//! [`ttl`] module docs for eviction semantics.

pub mod ttl;

pub use ttl::{BoundedTtlCache, CacheConfig, CacheStats};
