//! Style analysis results produced by the enrichment call.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Evidence that a candidate specializes in one target style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleMatch {
    /// The target style this match refers to.
    pub style: String,
    /// Model confidence in `[0, 1]`.
    pub confidence: f64,
    /// Brief quote or reason backing the match.
    #[serde(default)]
    pub evidence: String,
}

/// Result of analyzing a candidate's reviews against target styles.
///
/// The default value (score 0, no matches) is the degraded-signal fallback
/// used whenever enrichment fails or times out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleAnalysis {
    /// Overall match strength in `[0, 1]`.
    #[serde(default)]
    pub overall_match_score: f64,
    /// Per-style evidence, strongest first as returned by the model.
    #[serde(default)]
    pub matches: Vec<StyleMatch>,
}

impl StyleAnalysis {
    /// Parse a raw model reply into an analysis.
    ///
    /// Models frequently wrap the JSON payload in markdown code fences;
    /// this strips ```json fences (or bare ``` fences) before parsing, then
    /// clamps `overall_match_score` into `[0, 1]`.
    pub fn from_model_response(raw: &str) -> Result<Self> {
        let text = strip_code_fences(raw.trim());
        let mut analysis: StyleAnalysis = serde_json::from_str(text.trim())?;
        analysis.overall_match_score = analysis.overall_match_score.clamp(0.0, 1.0);
        for m in &mut analysis.matches {
            m.confidence = m.confidence.clamp(0.0, 1.0);
        }
        Ok(analysis)
    }
}

/// Strip a surrounding markdown code fence, if present.
fn strip_code_fences(text: &str) -> &str {
    if let Some(rest) = text.strip_prefix("```json") {
        rest.rsplit_once("```").map(|(body, _)| body).unwrap_or(rest)
    } else if let Some(rest) = text.strip_prefix("```") {
        rest.rsplit_once("```").map(|(body, _)| body).unwrap_or(rest)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let analysis = StyleAnalysis::from_model_response(
            r#"{"overall_match_score": 0.8, "matches": [{"style": "fade", "confidence": 0.9, "evidence": "clean fades"}]}"#,
        )
        .unwrap();
        assert_eq!(analysis.overall_match_score, 0.8);
        assert_eq!(analysis.matches.len(), 1);
        assert_eq!(analysis.matches[0].style, "fade");
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"overall_match_score\": 0.4, \"matches\": []}\n```";
        let analysis = StyleAnalysis::from_model_response(raw).unwrap();
        assert_eq!(analysis.overall_match_score, 0.4);
    }

    #[test]
    fn parses_bare_fence() {
        let raw = "```\n{\"overall_match_score\": 0.2, \"matches\": []}\n```";
        let analysis = StyleAnalysis::from_model_response(raw).unwrap();
        assert_eq!(analysis.overall_match_score, 0.2);
    }

    #[test]
    fn clamps_out_of_range_scores() {
        let analysis =
            StyleAnalysis::from_model_response(r#"{"overall_match_score": 3.7, "matches": []}"#)
                .unwrap();
        assert_eq!(analysis.overall_match_score, 1.0);

        let analysis =
            StyleAnalysis::from_model_response(r#"{"overall_match_score": -0.5, "matches": []}"#)
                .unwrap();
        assert_eq!(analysis.overall_match_score, 0.0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(StyleAnalysis::from_model_response("not json at all").is_err());
    }

    #[test]
    fn missing_fields_default_to_zero_result() {
        let analysis = StyleAnalysis::from_model_response("{}").unwrap();
        assert_eq!(analysis.overall_match_score, 0.0);
        assert!(analysis.matches.is_empty());
    }
}
