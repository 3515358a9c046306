//! Enrichment call abstraction and input preparation.
//!
//! [`StyleAnalyzer`] is the seam between the ranking engine and the external
//! AI wrapper: implementations make the actual network call; the engine only
//! sees a future that resolves to a [`StyleAnalysis`] or an error. The
//! engine bounds, times out, and caches those calls — implementations need
//! no retry or timeout logic of their own.

use async_trait::async_trait;

use crate::types::{Review, StyleAnalysis};
use crate::Result;

/// Maximum number of reviews condensed into an analysis prompt.
const MAX_REVIEWS: usize = 5;
/// Maximum characters kept per review.
const MAX_REVIEW_CHARS: usize = 300;
/// Maximum characters for the condensed text overall.
const MAX_COMBINED_CHARS: usize = 2_000;

/// Analyzes a candidate's reviews for expertise in target styles.
///
/// Deterministic for a given input is not required — results are cached by
/// the engine keyed on candidate name and sorted style list, so repeated
/// calls within the cache TTL are served without touching the
/// implementation.
#[async_trait]
pub trait StyleAnalyzer: Send + Sync {
    /// Analyze `reviews` of `candidate_name` against `target_styles`.
    ///
    /// `reviews` is pre-condensed text (see [`condense_reviews`]). Errors
    /// are downgraded by the engine to [`StyleAnalysis::default()`]; return
    /// them freely.
    async fn analyze(
        &self,
        candidate_name: &str,
        reviews: &str,
        target_styles: &[String],
    ) -> Result<StyleAnalysis>;
}

/// Condense raw reviews into a bounded prompt fragment.
///
/// Takes the first 5 non-empty reviews, truncates each to 300 characters,
/// joins with `" | "` and caps the total at 2,000 characters. Returns `None`
/// when no review carries text — there is nothing to analyze.
pub fn condense_reviews(reviews: &[Review]) -> Option<String> {
    let mut parts = Vec::new();
    for review in reviews.iter().take(MAX_REVIEWS) {
        let text = review.text.trim();
        if !text.is_empty() {
            parts.push(truncate_chars(text, MAX_REVIEW_CHARS));
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(truncate_chars(&parts.join(" | "), MAX_COMBINED_CHARS))
}

/// Truncate at a character boundary (not bytes — reviews are user text).
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reviews_condense_to_none() {
        assert!(condense_reviews(&[]).is_none());
        assert!(condense_reviews(&[Review::new("   ")]).is_none());
    }

    #[test]
    fn reviews_are_joined_with_separator() {
        let reviews = vec![Review::new("great fade"), Review::new("clean shop")];
        assert_eq!(condense_reviews(&reviews).unwrap(), "great fade | clean shop");
    }

    #[test]
    fn only_first_five_reviews_are_considered() {
        let reviews: Vec<Review> = (0..8).map(|i| Review::new(format!("review {i}"))).collect();
        let condensed = condense_reviews(&reviews).unwrap();
        assert!(condensed.contains("review 4"));
        assert!(!condensed.contains("review 5"));
    }

    #[test]
    fn long_reviews_are_truncated() {
        let reviews = vec![Review::new("x".repeat(1_000))];
        assert_eq!(condense_reviews(&reviews).unwrap().chars().count(), 300);
    }

    #[test]
    fn total_length_is_capped() {
        let reviews: Vec<Review> = (0..5).map(|_| Review::new("y".repeat(600))).collect();
        assert!(condense_reviews(&reviews).unwrap().chars().count() <= 2_000);
    }

    #[test]
    fn multibyte_text_truncates_on_char_boundary() {
        let reviews = vec![Review::new("é".repeat(400))];
        let condensed = condense_reviews(&reviews).unwrap();
        assert_eq!(condensed.chars().count(), 300);
    }
}
