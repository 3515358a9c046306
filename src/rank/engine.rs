//! Concurrent candidate ranking.
//!
//! [`RankingEngine`] orders candidates by relevance to a set of target style
//! names, blending three capped signals:
//!
//! - name match (≤ 0.30) — style words appearing in the shop name
//! - enrichment (≤ 0.50) — AI review analysis from a [`StyleAnalyzer`]
//! - review keywords (≤ 0.20) — style words appearing in review text
//!
//! The composite score weighs relevance at 70% and a capped popularity
//! signal at 30%. With no target styles the engine skips scoring entirely
//! and sorts by popularity alone — it will not fabricate relevance signals
//! nobody asked for.
//!
//! # Concurrency
//!
//! Enrichment calls fan out through `buffer_unordered` with a fixed
//! concurrency bound and an independent timeout per task. A slow or failing
//! analysis degrades that one candidate's enrichment signal to zero; it
//! never fails or delays the overall ranking beyond its own deadline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{StreamExt, stream};
use tracing::{debug, info, warn};

use super::analyzer::{StyleAnalyzer, condense_reviews};
use crate::cache::{BoundedTtlCache, CacheConfig};
use crate::telemetry::{self, MetricsAggregator};
use crate::types::{Candidate, Review, StyleAnalysis};
use crate::{Result, TrimrankError};

/// Cache series name for the engine's secondary analysis cache.
const ANALYSIS_CACHE: &str = "style-analysis";

/// Signal caps and weights. Tuned against real review corpora; the three
/// caps sum to 1.0 so relevance stays in `[0, 1]` before clamping.
const NAME_MATCH_CAP: f64 = 0.30;
const ENRICHMENT_WEIGHT: f64 = 0.50;
const REVIEW_KEYWORD_CAP: f64 = 0.20;
const RELEVANCE_WEIGHT: f64 = 0.7;
const POPULARITY_WEIGHT: f64 = 0.3;

/// Reviews considered for keyword matching.
const KEYWORD_REVIEW_LIMIT: usize = 10;
/// Style words shorter than this are too generic to match on.
const MIN_WORD_LEN: usize = 3;

/// Configuration for a [`RankingEngine`].
///
/// ```rust
/// # use trimrank::RankingConfig;
/// # use std::time::Duration;
/// let config = RankingConfig::new()
///     .max_concurrency(4)
///     .analysis_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct RankingConfig {
    /// Concurrent enrichment tasks. Default: 10.
    pub max_concurrency: usize,
    /// Soft deadline per enrichment task. Default: 5 seconds.
    pub analysis_timeout: Duration,
    /// Secondary analysis cache configuration. Default: 100 entries, 1 hour
    /// TTL, series name "style-analysis".
    pub cache: CacheConfig,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 10,
            analysis_timeout: Duration::from_secs(5),
            cache: CacheConfig::new(ANALYSIS_CACHE),
        }
    }
}

impl RankingConfig {
    /// Create a config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of concurrent enrichment tasks.
    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n;
        self
    }

    /// Set the per-task analysis deadline.
    pub fn analysis_timeout(mut self, timeout: Duration) -> Self {
        self.analysis_timeout = timeout;
        self
    }

    /// Replace the analysis cache configuration.
    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

/// A candidate with its computed scores.
///
/// Transient — created fresh per ranking call, never persisted.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    /// The input candidate, unchanged.
    pub candidate: Candidate,
    /// Blended relevance in `[0, 1]`; 0 when no styles were requested.
    pub style_relevance: f64,
    /// Final sort key.
    pub composite_score: f64,
    /// Enrichment result, when one was produced for this candidate.
    pub analysis: Option<StyleAnalysis>,
}

/// Orders candidates by relevance to target styles.
pub struct RankingEngine {
    analyzer: Option<Arc<dyn StyleAnalyzer>>,
    analysis_cache: BoundedTtlCache<String, StyleAnalysis>,
    metrics: Arc<MetricsAggregator>,
    max_concurrency: usize,
    analysis_timeout: Duration,
}

impl RankingEngine {
    /// Create an engine.
    ///
    /// `analyzer` is optional — without one, ranking falls back to the
    /// name-match, review-keyword and popularity signals. Fails fast on a
    /// zero concurrency bound or zero timeout.
    pub fn new(
        config: RankingConfig,
        analyzer: Option<Arc<dyn StyleAnalyzer>>,
        metrics: Arc<MetricsAggregator>,
    ) -> Result<Self> {
        if config.max_concurrency == 0 {
            return Err(TrimrankError::Configuration(
                "ranking max_concurrency must be non-zero".to_string(),
            ));
        }
        if config.analysis_timeout.is_zero() {
            return Err(TrimrankError::Configuration(
                "ranking analysis_timeout must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            analyzer,
            analysis_cache: BoundedTtlCache::new(config.cache)?,
            metrics,
            max_concurrency: config.max_concurrency,
            analysis_timeout: config.analysis_timeout,
        })
    }

    /// Rank candidates against target styles, best match first.
    ///
    /// Ties keep input order (stable sort). This call never fails: partial
    /// or total enrichment failure degrades the affected signal to zero.
    pub async fn rank(
        &self,
        candidates: Vec<Candidate>,
        target_styles: &[String],
    ) -> Vec<RankedCandidate> {
        if !target_styles.iter().any(|s| !s.trim().is_empty()) {
            return rank_by_popularity(candidates);
        }

        info!(
            candidates = candidates.len(),
            styles = ?target_styles,
            "ranking candidates"
        );

        let mut analyses: Vec<Option<StyleAnalysis>> = vec![None; candidates.len()];
        if self.analyzer.is_some() {
            let tasks = candidates
                .iter()
                .enumerate()
                .filter(|(_, c)| c.has_reviews())
                .map(|(idx, candidate)| async move {
                    (idx, self.analyze_one(candidate, target_styles).await)
                });
            let results: Vec<(usize, Option<StyleAnalysis>)> = stream::iter(tasks)
                .buffer_unordered(self.max_concurrency)
                .collect()
                .await;
            for (idx, analysis) in results {
                analyses[idx] = analysis;
            }
        }

        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .zip(analyses)
            .map(|(candidate, analysis)| {
                let relevance = style_relevance(&candidate, target_styles, analysis.as_ref());
                let composite = relevance * RELEVANCE_WEIGHT
                    + candidate.popularity_score() / 5.0 * POPULARITY_WEIGHT;
                RankedCandidate {
                    candidate,
                    style_relevance: relevance,
                    composite_score: composite,
                    analysis,
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));

        if let Some(top) = ranked.first() {
            info!(
                name = %top.candidate.name,
                relevance = top.style_relevance,
                rating = top.candidate.rating,
                "top ranking match"
            );
        }
        ranked
    }

    /// Analysis cache statistics, for diagnostics.
    pub fn analysis_cache_stats(&self) -> crate::cache::CacheStats {
        self.analysis_cache.stats()
    }

    /// Drop every cached analysis, returning the number removed.
    pub fn clear_analysis_cache(&self) -> usize {
        self.analysis_cache.clear()
    }

    /// Run one enrichment task: cache check, bounded call, cache fill.
    ///
    /// Returns `None` when no analysis could be produced — missing review
    /// text, analyzer failure, or deadline exceeded. The caller scores a
    /// `None` as a zero enrichment signal.
    async fn analyze_one(
        &self,
        candidate: &Candidate,
        target_styles: &[String],
    ) -> Option<StyleAnalysis> {
        let analyzer = self.analyzer.as_ref()?;
        let key = analysis_key(&candidate.name, target_styles);

        let lookup_started = Instant::now();
        if let Some(cached) = self.analysis_cache.get(&key) {
            debug!(candidate = %candidate.name, "using cached style analysis");
            self.metrics.record_cache_hit(
                ANALYSIS_CACHE,
                Some(elapsed_ms(lookup_started)),
            );
            return Some(cached);
        }
        self.metrics.record_cache_miss(ANALYSIS_CACHE);

        let condensed = condense_reviews(&candidate.reviews)?;

        let call_started = Instant::now();
        let outcome = tokio::time::timeout(
            self.analysis_timeout,
            analyzer.analyze(&candidate.name, &condensed, target_styles),
        )
        .await;

        match outcome {
            Ok(Ok(mut analysis)) => {
                let duration_ms = elapsed_ms(call_started);
                analysis.overall_match_score = analysis.overall_match_score.clamp(0.0, 1.0);
                self.metrics.record_api_call_time(ANALYSIS_CACHE, duration_ms);
                self.metrics.record_api_latency(ANALYSIS_CACHE, duration_ms);
                metrics::counter!(telemetry::ANALYSES_TOTAL, "status" => "ok").increment(1);
                metrics::histogram!(telemetry::ANALYSIS_DURATION_SECONDS)
                    .record(duration_ms / 1000.0);
                self.analysis_cache.set(key, analysis.clone());
                Some(analysis)
            }
            Ok(Err(e)) => {
                warn!(candidate = %candidate.name, error = %e, "style analysis failed");
                metrics::counter!(telemetry::ANALYSES_TOTAL, "status" => "error").increment(1);
                None
            }
            Err(_) => {
                warn!(
                    candidate = %candidate.name,
                    timeout_ms = self.analysis_timeout.as_millis() as u64,
                    "style analysis timed out"
                );
                metrics::counter!(telemetry::ANALYSES_TOTAL, "status" => "timeout").increment(1);
                None
            }
        }
    }
}

/// Popularity-only ordering for requests with no target styles.
fn rank_by_popularity(candidates: Vec<Candidate>) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let popularity = candidate.popularity_score();
            RankedCandidate {
                candidate,
                style_relevance: 0.0,
                composite_score: popularity,
                analysis: None,
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
    ranked
}

/// Cache key: candidate name plus the sorted target-style list.
fn analysis_key(candidate_name: &str, target_styles: &[String]) -> String {
    let mut styles: Vec<&str> = target_styles.iter().map(String::as_str).collect();
    styles.sort_unstable();
    format!("{}:{}", candidate_name, styles.join(","))
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

/// Blend the three relevance signals for one candidate, clamped to `[0, 1]`.
fn style_relevance(
    candidate: &Candidate,
    target_styles: &[String],
    analysis: Option<&StyleAnalysis>,
) -> f64 {
    let mut score = name_match_score(&candidate.name, target_styles);
    if let Some(analysis) = analysis {
        score += analysis.overall_match_score * ENRICHMENT_WEIGHT;
    }
    if !candidate.reviews.is_empty() {
        score += review_keyword_score(&candidate.reviews, target_styles);
    }
    score.clamp(0.0, 1.0)
}

/// Name-match signal: style words found in the candidate's name.
///
/// Each style contributes at most once, worth `0.30 / style count`; the sum
/// is capped at 0.30. Words of one or two characters are skipped.
fn name_match_score(name: &str, target_styles: &[String]) -> f64 {
    let name_lower = name.to_lowercase();
    keyword_score(&name_lower, target_styles, NAME_MATCH_CAP)
}

/// Review-keyword signal: style words found in concatenated review text.
///
/// Considers at most the first 10 reviews; same per-style award and cap
/// structure as the name-match signal, capped at 0.20.
fn review_keyword_score(reviews: &[Review], target_styles: &[String]) -> f64 {
    let combined = reviews
        .iter()
        .take(KEYWORD_REVIEW_LIMIT)
        .map(|r| r.text.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    keyword_score(&combined, target_styles, REVIEW_KEYWORD_CAP)
}

/// Shared word-in-haystack scoring for the name and review signals.
///
/// The divisor is the *total* style count, including styles that contribute
/// no usable words — a half-empty style list dilutes per-style awards rather
/// than inflating the survivors.
fn keyword_score(haystack: &str, target_styles: &[String], cap: f64) -> f64 {
    if target_styles.is_empty() {
        return 0.0;
    }
    let per_style = cap / target_styles.len() as f64;
    let mut score = 0.0;
    for style in target_styles {
        let matched = style
            .to_lowercase()
            .split_whitespace()
            .filter(|w| w.len() >= MIN_WORD_LEN)
            .any(|word| haystack.contains(word));
        if matched {
            score += per_style;
        }
    }
    score.min(cap)
}
