//! Ranking subsystem.
//!
//! [`RankingEngine`] is the entry point; [`StyleAnalyzer`] is the seam to
//! the external AI wrapper; [`build_search_keywords`] prepares the upstream
//! place-search query from the same target styles the engine ranks against.

pub mod analyzer;
pub mod engine;

pub use analyzer::{StyleAnalyzer, condense_reviews};
pub use engine::{RankedCandidate, RankingConfig, RankingEngine};

/// Base query terms always present in a place search.
const BASE_KEYWORDS: &str = "barber barbershop mens haircut";

/// Style-derived keywords kept after deduplication.
const MAX_STYLE_KEYWORDS: usize = 8;

/// Build a place-search keyword string from target style names.
///
/// Starts from the base terms, then appends each style name and its
/// individual words longer than two characters ("Modern Fade" contributes
/// "modern fade", "modern", "fade"), deduplicated in first-seen order and
/// capped at 8 style-derived keywords to keep the query within what the
/// search API tolerates.
pub fn build_search_keywords(target_styles: &[String]) -> String {
    let mut keywords: Vec<String> = Vec::new();
    for style in target_styles {
        let style_lower = style.trim().to_lowercase();
        if style_lower.is_empty() {
            continue;
        }
        keywords.push(style_lower.clone());
        for word in style_lower.split_whitespace().filter(|w| w.len() > 2) {
            keywords.push(word.to_string());
        }
    }

    let mut seen = std::collections::HashSet::new();
    let deduped: Vec<String> = keywords
        .into_iter()
        .filter(|k| seen.insert(k.clone()))
        .take(MAX_STYLE_KEYWORDS)
        .collect();

    if deduped.is_empty() {
        return BASE_KEYWORDS.to_string();
    }
    format!("{} {}", BASE_KEYWORDS, deduped.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_styles_yield_base_keywords() {
        assert_eq!(build_search_keywords(&[]), BASE_KEYWORDS);
        assert_eq!(build_search_keywords(&styles(&["", "  "])), BASE_KEYWORDS);
    }

    #[test]
    fn style_contributes_full_name_and_words() {
        let keywords = build_search_keywords(&styles(&["Modern Fade"]));
        assert_eq!(
            keywords,
            "barber barbershop mens haircut modern fade modern fade"
        );
    }

    #[test]
    fn duplicates_are_removed_in_first_seen_order() {
        let keywords = build_search_keywords(&styles(&["Fade", "Skin Fade"]));
        // "fade" appears once, from the first style.
        assert_eq!(
            keywords,
            "barber barbershop mens haircut fade skin fade skin"
        );
    }

    #[test]
    fn style_keywords_are_capped() {
        let many: Vec<String> = (0..20).map(|i| format!("style{i}")).collect();
        let keywords = build_search_keywords(&many);
        let style_terms = keywords
            .strip_prefix(BASE_KEYWORDS)
            .unwrap()
            .split_whitespace()
            .count();
        assert_eq!(style_terms, MAX_STYLE_KEYWORDS);
    }
}
