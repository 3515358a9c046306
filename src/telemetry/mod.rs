//! Telemetry: facade metric names and the in-process aggregator.
//!
//! Two complementary paths:
//!
//! - The [`metrics`] facade, with centralised metric name constants below.
//!   Consumers install their own recorder (e.g. prometheus, statsd); without
//!   a recorder installed, all facade calls are no-ops.
//! - [`MetricsAggregator`], the in-process source of truth for cache
//!   effectiveness and endpoint latency statistics, queried via
//!   [`MetricsAggregator::snapshot()`] by a diagnostics endpoint.
//!
//! # Metric naming conventions
//!
//! All facade metrics are prefixed with `trimrank_`. Counters end in
//! `_total`.
//!
//! # Common labels
//!
//! - `cache` — cache series name (e.g. "place-search", "style-analysis")
//! - `status` — outcome: "ok", "error" or "timeout"

mod aggregator;
mod window;

pub use aggregator::{
    ApiLatencyStats, CacheSavings, EndpointReport, MetricsAggregator, MetricsConfig,
    MetricsReport, ResponseTimeStats,
};
pub use window::{BoundedWindow, TimestampLog};

/// Total cache hits.
///
/// Labels: `cache`.
pub const CACHE_HITS_TOTAL: &str = "trimrank_cache_hits_total";

/// Total cache misses.
///
/// Labels: `cache`.
pub const CACHE_MISSES_TOTAL: &str = "trimrank_cache_misses_total";

/// Total style analysis tasks completed.
///
/// Labels: `status` ("ok" | "error" | "timeout").
pub const ANALYSES_TOTAL: &str = "trimrank_analyses_total";

/// Style analysis task duration in seconds.
pub const ANALYSIS_DURATION_SECONDS: &str = "trimrank_analysis_duration_seconds";
