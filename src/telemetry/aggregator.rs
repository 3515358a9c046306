//! In-process performance aggregator.
//!
//! [`MetricsAggregator`] is the source of truth for cache effectiveness and
//! endpoint latency observability. One instance is constructed per process
//! and shared as an `Arc` with every component that records into it — an
//! explicit dependency rather than a hidden global, so tests get isolated
//! instances for free.
//!
//! # Savings model
//!
//! Each cache series keeps a bounded window of observed real-call durations
//! (recorded via [`record_api_call_time`](MetricsAggregator::record_api_call_time)).
//! Every subsequent hit is credited with `max(0, mean(window) - served)`.
//! The baseline is the *current* window mean, so early low-sample means
//! produce noisy estimates; callers that want a stable baseline should warm
//! the window first. With an empty baseline a hit saves nothing — there is
//! nothing to estimate against.
//!
//! # Percentiles
//!
//! Nearest-rank by sorted index: `p50 = sorted[floor(n*0.50)]`,
//! `p95 = sorted[floor(n*0.95)]` (n > 1), `p99 = sorted[floor(n*0.99)]`
//! (n > 2), with the documented small-n fallbacks. No interpolation —
//! outputs stay bit-comparable across implementations.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use super::window::{BoundedWindow, TimestampLog};
use crate::{Result, TrimrankError};

/// Samples kept per cache series for real-call durations.
const API_CALL_WINDOW: usize = 100;
/// Samples kept per cache series for cached-response durations.
const CACHED_RESPONSE_WINDOW: usize = 100;
/// Samples kept per endpoint for response times.
const RESPONSE_TIME_WINDOW: usize = 1_000;
/// Samples kept per external API for latencies.
const API_LATENCY_WINDOW: usize = 500;
/// Raw request timestamps kept per endpoint for rate queries.
const TIMESTAMP_LOG_CAPACITY: usize = 10_000;

/// Window capacities for a [`MetricsAggregator`].
///
/// The defaults match the sizes the aggregator was tuned with; override only
/// when memory or fidelity requirements differ. All capacities must be
/// non-zero — construction fails fast otherwise.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Real-call duration samples per cache series. Default: 100.
    pub api_call_window: usize,
    /// Cached-response duration samples per cache series. Default: 100.
    pub cached_response_window: usize,
    /// Response-time samples per endpoint. Default: 1,000.
    pub response_time_window: usize,
    /// Latency samples per external API. Default: 500.
    pub api_latency_window: usize,
    /// Raw timestamps per endpoint. Default: 10,000.
    pub timestamp_log_capacity: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            api_call_window: API_CALL_WINDOW,
            cached_response_window: CACHED_RESPONSE_WINDOW,
            response_time_window: RESPONSE_TIME_WINDOW,
            api_latency_window: API_LATENCY_WINDOW,
            timestamp_log_capacity: TIMESTAMP_LOG_CAPACITY,
        }
    }
}

impl MetricsConfig {
    /// Create a config with default capacities.
    pub fn new() -> Self {
        Self::default()
    }

    fn validate(&self) -> Result<()> {
        let capacities = [
            self.api_call_window,
            self.cached_response_window,
            self.response_time_window,
            self.api_latency_window,
            self.timestamp_log_capacity,
        ];
        if capacities.contains(&0) {
            return Err(TrimrankError::Configuration(
                "metrics window capacities must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-series mutable state, all behind one lock.
///
/// Series arenas are keyed by operator-chosen string identifiers (cache
/// names, endpoint names, API names); the identifier cardinality is
/// operator-controlled, each series' windows are capacity-bounded.
#[derive(Default)]
struct State {
    cache_hits: HashMap<String, u64>,
    cache_misses: HashMap<String, u64>,
    time_saved_ms: HashMap<String, f64>,
    api_calls_avoided: HashMap<String, u64>,
    api_call_times: HashMap<String, BoundedWindow>,
    cached_response_times: HashMap<String, BoundedWindow>,
    response_times: HashMap<String, BoundedWindow>,
    request_counts: HashMap<String, u64>,
    error_counts: HashMap<String, u64>,
    api_latencies: HashMap<String, BoundedWindow>,
    request_timestamps: HashMap<String, TimestampLog>,
}

/// Thread-safe performance aggregator shared across in-flight requests.
///
/// All mutating operations are safe under concurrent invocation; reads take
/// the same lock, so statistics always observe a consistent snapshot of the
/// windows.
pub struct MetricsAggregator {
    config: MetricsConfig,
    state: Mutex<State>,
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAggregator {
    /// Create an aggregator with default window capacities.
    pub fn new() -> Self {
        Self {
            config: MetricsConfig::default(),
            state: Mutex::new(State::default()),
        }
    }

    /// Create an aggregator with custom window capacities.
    pub fn with_config(config: MetricsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: Mutex::new(State::default()),
        })
    }

    /// Acquire the state lock, recovering from poisoning.
    ///
    /// A panicked writer can only leave a window mid-rotation, which the
    /// bounded structures tolerate; discarding the poison keeps reads from
    /// cascading the panic.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Materialize a window for a series.
    ///
    /// Capacities were validated at construction, so this cannot fail.
    fn window(capacity: usize) -> BoundedWindow {
        BoundedWindow::new(capacity).expect("capacity validated at construction")
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Record a cache hit, crediting estimated time saved.
    ///
    /// `served_latency_ms`, when known, is appended to the series'
    /// cached-response window and subtracted from the current real-call
    /// baseline; when unknown, the hit is credited against a served time of
    /// zero. A series with no recorded real-call durations gets no savings
    /// credit for this hit.
    pub fn record_cache_hit(&self, cache_name: &str, served_latency_ms: Option<f64>) {
        let mut state = self.lock();
        *state.cache_hits.entry(cache_name.to_string()).or_default() += 1;

        if let Some(ms) = served_latency_ms {
            state
                .cached_response_times
                .entry(cache_name.to_string())
                .or_insert_with(|| Self::window(self.config.cached_response_window))
                .push(ms);
        }

        let baseline = state
            .api_call_times
            .get(cache_name)
            .filter(|w| !w.is_empty())
            .map(BoundedWindow::mean);
        if let Some(avg_api_ms) = baseline {
            let saved = (avg_api_ms - served_latency_ms.unwrap_or(0.0)).max(0.0);
            *state.time_saved_ms.entry(cache_name.to_string()).or_default() += saved;
            *state
                .api_calls_avoided
                .entry(cache_name.to_string())
                .or_default() += 1;
        }
    }

    /// Record a cache miss.
    pub fn record_cache_miss(&self, cache_name: &str) {
        let mut state = self.lock();
        *state
            .cache_misses
            .entry(cache_name.to_string())
            .or_default() += 1;
    }

    /// Record the duration of a real external call for a cache series.
    ///
    /// This feeds the savings baseline — it must be recorded before any
    /// subsequent hit can produce a savings number for the series.
    pub fn record_api_call_time(&self, cache_name: &str, duration_ms: f64) {
        let mut state = self.lock();
        state
            .api_call_times
            .entry(cache_name.to_string())
            .or_insert_with(|| Self::window(self.config.api_call_window))
            .push(duration_ms);
    }

    /// Record an endpoint response time, stamping the request for rate
    /// queries.
    pub fn record_response_time(&self, endpoint: &str, duration_ms: f64) {
        let now = Instant::now();
        let mut state = self.lock();
        state
            .response_times
            .entry(endpoint.to_string())
            .or_insert_with(|| Self::window(self.config.response_time_window))
            .push(duration_ms);
        state
            .request_timestamps
            .entry(endpoint.to_string())
            .or_insert_with(|| {
                TimestampLog::new(self.config.timestamp_log_capacity)
                    .expect("capacity validated at construction")
            })
            .push(now);
    }

    /// Record a completed request and whether it succeeded.
    pub fn record_request(&self, endpoint: &str, success: bool) {
        let mut state = self.lock();
        *state
            .request_counts
            .entry(endpoint.to_string())
            .or_default() += 1;
        if !success {
            *state.error_counts.entry(endpoint.to_string()).or_default() += 1;
        }
    }

    /// Record an external API call latency.
    pub fn record_api_latency(&self, api_name: &str, duration_ms: f64) {
        let mut state = self.lock();
        state
            .api_latencies
            .entry(api_name.to_string())
            .or_insert_with(|| Self::window(self.config.api_latency_window))
            .push(duration_ms);
    }

    // ========================================================================
    // Derived statistics
    // ========================================================================

    /// Cache hit rate as a percentage; 0 for an unseen series.
    pub fn cache_hit_rate(&self, cache_name: &str) -> f64 {
        let state = self.lock();
        Self::hit_rate(&state, cache_name)
    }

    fn hit_rate(state: &State, cache_name: &str) -> f64 {
        let hits = state.cache_hits.get(cache_name).copied().unwrap_or(0);
        let misses = state.cache_misses.get(cache_name).copied().unwrap_or(0);
        let total = hits + misses;
        if total == 0 {
            return 0.0;
        }
        hits as f64 / total as f64 * 100.0
    }

    /// Full savings report for a cache series.
    pub fn cache_savings(&self, cache_name: &str) -> CacheSavings {
        let state = self.lock();
        Self::savings(&state, cache_name)
    }

    fn savings(state: &State, cache_name: &str) -> CacheSavings {
        let hits = state.cache_hits.get(cache_name).copied().unwrap_or(0);
        let misses = state.cache_misses.get(cache_name).copied().unwrap_or(0);
        let total_time_saved_ms = state.time_saved_ms.get(cache_name).copied().unwrap_or(0.0);
        let api_calls_avoided = state
            .api_calls_avoided
            .get(cache_name)
            .copied()
            .unwrap_or(0);

        let avg_api_time_ms = state
            .api_call_times
            .get(cache_name)
            .map(BoundedWindow::mean)
            .unwrap_or(0.0);
        let avg_cached_time_ms = state
            .cached_response_times
            .get(cache_name)
            .map(BoundedWindow::mean)
            .unwrap_or(0.0);

        let time_saved_per_request_ms = if avg_api_time_ms > 0.0 {
            (avg_api_time_ms - avg_cached_time_ms).max(0.0)
        } else {
            0.0
        };
        let speedup_factor = if avg_api_time_ms > 0.0 && avg_cached_time_ms > 0.0 {
            avg_api_time_ms / avg_cached_time_ms
        } else {
            0.0
        };

        CacheSavings {
            hits,
            misses,
            hit_rate: Self::hit_rate(state, cache_name),
            total_time_saved_ms,
            total_time_saved_seconds: total_time_saved_ms / 1000.0,
            api_calls_avoided,
            avg_api_time_ms,
            avg_cached_time_ms,
            time_saved_per_request_ms,
            speedup_factor,
        }
    }

    /// Response time statistics for an endpoint; all zero when unseen.
    pub fn response_time_stats(&self, endpoint: &str) -> ResponseTimeStats {
        let state = self.lock();
        Self::response_stats(&state, endpoint)
    }

    fn response_stats(state: &State, endpoint: &str) -> ResponseTimeStats {
        let Some(window) = state.response_times.get(endpoint).filter(|w| !w.is_empty()) else {
            return ResponseTimeStats::default();
        };
        let sorted = window.sorted();
        let n = sorted.len();
        ResponseTimeStats {
            count: n as u64,
            p50: sorted[(n as f64 * 0.50) as usize],
            p95: if n > 1 {
                sorted[(n as f64 * 0.95) as usize]
            } else {
                sorted[0]
            },
            p99: if n > 2 {
                sorted[(n as f64 * 0.99) as usize]
            } else {
                sorted[n - 1]
            },
            avg: window.mean(),
            min: sorted[0],
            max: sorted[n - 1],
        }
    }

    /// Latency statistics for an external API; all zero when unseen.
    pub fn api_latency_stats(&self, api_name: &str) -> ApiLatencyStats {
        let state = self.lock();
        Self::latency_stats(&state, api_name)
    }

    fn latency_stats(state: &State, api_name: &str) -> ApiLatencyStats {
        let Some(window) = state.api_latencies.get(api_name).filter(|w| !w.is_empty()) else {
            return ApiLatencyStats::default();
        };
        let sorted = window.sorted();
        let n = sorted.len();
        ApiLatencyStats {
            count: n as u64,
            avg: window.mean(),
            p95: if n > 1 {
                sorted[(n as f64 * 0.95) as usize]
            } else {
                sorted[0]
            },
            min: sorted[0],
            max: sorted[n - 1],
        }
    }

    /// Success rate as a percentage; 100 when no requests were recorded.
    pub fn success_rate(&self, endpoint: &str) -> f64 {
        let state = self.lock();
        Self::success(&state, endpoint)
    }

    fn success(state: &State, endpoint: &str) -> f64 {
        let total = state.request_counts.get(endpoint).copied().unwrap_or(0);
        if total == 0 {
            return 100.0;
        }
        let errors = state.error_counts.get(endpoint).copied().unwrap_or(0);
        (total - errors) as f64 / total as f64 * 100.0
    }

    /// Requests per minute over the last `minutes` minutes.
    pub fn requests_per_minute(&self, endpoint: &str, minutes: u32) -> f64 {
        let state = self.lock();
        Self::rpm(&state, endpoint, minutes)
    }

    fn rpm(state: &State, endpoint: &str, minutes: u32) -> f64 {
        if minutes == 0 {
            return 0.0;
        }
        let Some(log) = state.request_timestamps.get(endpoint) else {
            return 0.0;
        };
        let horizon = Duration::from_secs(u64::from(minutes) * 60);
        log.count_within(horizon) as f64 / f64::from(minutes)
    }

    /// Structured report across every known series.
    pub fn snapshot(&self) -> MetricsReport {
        let state = self.lock();

        let mut endpoints = BTreeMap::new();
        let endpoint_names: Vec<String> = state
            .request_counts
            .keys()
            .chain(state.response_times.keys())
            .cloned()
            .collect();
        for name in endpoint_names {
            if endpoints.contains_key(&name) {
                continue;
            }
            let report = EndpointReport {
                request_count: state.request_counts.get(&name).copied().unwrap_or(0),
                error_count: state.error_counts.get(&name).copied().unwrap_or(0),
                success_rate: Self::success(&state, &name),
                response_time: Self::response_stats(&state, &name),
                requests_per_minute: Self::rpm(&state, &name, 1),
            };
            endpoints.insert(name, report);
        }

        let mut cache = BTreeMap::new();
        let cache_names: Vec<String> = state
            .cache_hits
            .keys()
            .chain(state.cache_misses.keys())
            .cloned()
            .collect();
        for name in cache_names {
            if !cache.contains_key(&name) {
                let savings = Self::savings(&state, &name);
                cache.insert(name, savings);
            }
        }

        let mut external_apis = BTreeMap::new();
        for name in state.api_latencies.keys() {
            external_apis.insert(name.clone(), Self::latency_stats(&state, name));
        }

        MetricsReport {
            endpoints,
            cache,
            external_apis,
            generated_at_unix_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
        }
    }

    /// Clear every counter and window.
    ///
    /// Intended for test isolation, not normal runtime operation.
    pub fn reset(&self) {
        let mut state = self.lock();
        *state = State::default();
    }
}

/// Savings report for one cache series.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheSavings {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub total_time_saved_ms: f64,
    pub total_time_saved_seconds: f64,
    pub api_calls_avoided: u64,
    pub avg_api_time_ms: f64,
    pub avg_cached_time_ms: f64,
    pub time_saved_per_request_ms: f64,
    pub speedup_factor: f64,
}

/// Nearest-rank response time statistics for one endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResponseTimeStats {
    pub count: u64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// Latency statistics for one external API.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApiLatencyStats {
    pub count: u64,
    pub avg: f64,
    pub p95: f64,
    pub min: f64,
    pub max: f64,
}

/// Per-endpoint section of a [`MetricsReport`].
#[derive(Debug, Clone, Serialize)]
pub struct EndpointReport {
    pub request_count: u64,
    pub error_count: u64,
    pub success_rate: f64,
    pub response_time: ResponseTimeStats,
    pub requests_per_minute: f64,
}

/// Combined report across all known series.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub endpoints: BTreeMap<String, EndpointReport>,
    pub cache: BTreeMap<String, CacheSavings>,
    pub external_apis: BTreeMap<String, ApiLatencyStats>,
    pub generated_at_unix_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_window_capacity_rejected() {
        let config = MetricsConfig {
            api_call_window: 0,
            ..MetricsConfig::default()
        };
        assert!(MetricsAggregator::with_config(config).is_err());
    }

    #[test]
    fn hit_without_baseline_saves_nothing() {
        let metrics = MetricsAggregator::new();
        metrics.record_cache_hit("places", Some(10.0));

        let savings = metrics.cache_savings("places");
        assert_eq!(savings.hits, 1);
        assert_eq!(savings.total_time_saved_ms, 0.0);
        assert_eq!(savings.api_calls_avoided, 0);
    }

    #[test]
    fn hit_without_served_latency_credits_full_baseline() {
        let metrics = MetricsAggregator::new();
        metrics.record_api_call_time("places", 200.0);
        metrics.record_cache_hit("places", None);

        let savings = metrics.cache_savings("places");
        assert_eq!(savings.total_time_saved_ms, 200.0);
        assert_eq!(savings.api_calls_avoided, 1);
        // No cached-response sample was contributed.
        assert_eq!(savings.avg_cached_time_ms, 0.0);
    }

    #[test]
    fn snapshot_covers_all_series_kinds() {
        let metrics = MetricsAggregator::new();
        metrics.record_request("barbers_search", true);
        metrics.record_response_time("barbers_search", 42.0);
        metrics.record_cache_miss("geocode");
        metrics.record_api_latency("google-places", 120.0);

        let report = metrics.snapshot();
        assert!(report.endpoints.contains_key("barbers_search"));
        assert!(report.cache.contains_key("geocode"));
        assert!(report.external_apis.contains_key("google-places"));
        assert!(report.generated_at_unix_ms > 0);
    }
}
