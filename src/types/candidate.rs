//! Candidate records supplied by the discovery layer.

use serde::{Deserialize, Serialize};

use crate::{Result, TrimrankError};

/// A single customer review attached to a candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Review {
    /// Raw review text; may be empty for rating-only reviews.
    #[serde(default)]
    pub text: String,
}

impl Review {
    /// Create a review from raw text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A barbershop candidate to be ranked.
///
/// Supplied by the discovery wrapper (place search), validated here at the
/// boundary: the required fields are `name`, `rating` and `rating_count`;
/// reviews are optional and default to empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Display name of the shop.
    pub name: String,
    /// Average star rating, typically 0.0–5.0.
    #[serde(default)]
    pub rating: f64,
    /// Number of ratings behind `rating`.
    #[serde(default)]
    pub rating_count: u32,
    /// Review texts, newest first as supplied by the source.
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl Candidate {
    /// Create a candidate with no reviews.
    pub fn new(name: impl Into<String>, rating: f64, rating_count: u32) -> Self {
        Self {
            name: name.into(),
            rating,
            rating_count,
            reviews: Vec::new(),
        }
    }

    /// Attach review texts.
    pub fn with_reviews<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reviews = texts.into_iter().map(Review::new).collect();
        self
    }

    /// Validate a record where external data enters the core.
    ///
    /// Rejects an empty name and non-finite or out-of-range ratings so the
    /// scoring paths never have to re-check them.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TrimrankError::InvalidInput(
                "candidate name must not be empty".to_string(),
            ));
        }
        if !self.rating.is_finite() || !(0.0..=5.0).contains(&self.rating) {
            return Err(TrimrankError::InvalidInput(format!(
                "candidate rating out of range: {}",
                self.rating
            )));
        }
        Ok(())
    }

    /// Popularity signal: `rating * min(rating_count, 100) / 100`.
    ///
    /// Caps the count so a shop with thousands of ratings cannot drown out
    /// relevance; 100 ratings at a given average is treated as fully
    /// established.
    pub fn popularity_score(&self) -> f64 {
        self.rating * f64::from(self.rating_count.min(100)) / 100.0
    }

    /// Whether the candidate carries any non-empty review text.
    pub fn has_reviews(&self) -> bool {
        self.reviews.iter().any(|r| !r.text.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popularity_caps_rating_count_at_100() {
        let a = Candidate::new("a", 4.5, 100);
        let b = Candidate::new("b", 4.5, 5_000);
        assert_eq!(a.popularity_score(), b.popularity_score());
        assert_eq!(a.popularity_score(), 4.5);
    }

    #[test]
    fn popularity_scales_with_low_counts() {
        let c = Candidate::new("c", 5.0, 10);
        assert_eq!(c.popularity_score(), 0.5);
    }

    #[test]
    fn blank_reviews_do_not_count() {
        let c = Candidate::new("c", 4.0, 10).with_reviews(["  ", ""]);
        assert!(!c.has_reviews());
    }

    #[test]
    fn validate_rejects_bad_boundary_data() {
        assert!(Candidate::new("", 4.0, 10).validate().is_err());
        assert!(Candidate::new("Shop", f64::NAN, 10).validate().is_err());
        assert!(Candidate::new("Shop", 5.5, 10).validate().is_err());
        assert!(Candidate::new("Shop", 4.9, 10).validate().is_ok());
    }

    #[test]
    fn deserializes_with_missing_optional_fields() {
        let c: Candidate = serde_json::from_str(r#"{"name": "Fade House"}"#).unwrap();
        assert_eq!(c.name, "Fade House");
        assert_eq!(c.rating, 0.0);
        assert!(c.reviews.is_empty());
    }
}
