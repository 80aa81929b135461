//! Content analysis of learner input.
//!
//! Keyword-scored heuristics over the raw text: technical vocabulary,
//! emotional signals, and three normalized scores the metadata generator and
//! router consume. Inputs longer than the word cap are truncated for
//! analysis, never rejected.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Inputs beyond this many words are truncated before analysis.
const ANALYSIS_WORD_CAP: usize = 1000;

/// Architectural vocabulary counted as technical terms.
const TECHNICAL_TERMS: &[&str] = &[
    "circulation",
    "massing",
    "parti",
    "facade",
    "section",
    "datum",
    "threshold",
    "egress",
    "daylighting",
    "fenestration",
    "cantilever",
    "load-bearing",
    "adjacency",
    "program",
    "zoning",
    "setback",
    "envelope",
    "glazing",
    "structure",
    "span",
    "module",
    "grid",
    "axis",
    "courtyard",
    "atrium",
    "mezzanine",
    "acoustic",
    "thermal",
    "ventilation",
    "accessibility",
];

/// Topic families the tutor tracks across turns.
const TOPIC_FAMILIES: &[(&str, &[&str])] = &[
    ("circulation", &["circulation", "corridor", "movement", "flow", "path", "stair", "ramp"]),
    ("lighting", &["light", "lighting", "daylight", "shadow", "glazing", "window"]),
    ("structure", &["structure", "structural", "column", "beam", "span", "cantilever"]),
    ("materials", &["material", "materials", "concrete", "timber", "brick", "steel", "glass"]),
    ("program", &["program", "function", "use", "room", "space allocation", "adjacency"]),
    ("context", &["context", "site", "neighborhood", "urban", "landscape", "climate"]),
    ("form", &["form", "massing", "volume", "shape", "geometry", "composition"]),
    ("sustainability", &["sustainable", "sustainability", "energy", "passive", "solar", "green"]),
    ("accessibility", &["accessible", "accessibility", "ada", "universal design", "barrier"]),
];

/// Emotional signal families, counted per category.
const EMOTIONAL_FAMILIES: &[(&str, &[&str])] = &[
    ("frustration", &["frustrated", "stuck", "annoying", "giving up", "tired of"]),
    ("excitement", &["excited", "love", "great", "amazing", "can't wait"]),
    ("anxiety", &["worried", "afraid", "nervous", "overwhelmed", "pressure"]),
    ("curiosity", &["curious", "wondering", "interested", "intrigued"]),
];

/// Overall quality bucket for the analyzed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentQuality {
    /// Sparse, generic input.
    #[default]
    Basic,
    /// Some specific, on-domain content.
    Medium,
    /// Dense, specific, technically grounded input.
    High,
}

/// The analyzed content of one learner input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContentAnalysis {
    /// Technical vocabulary found in the input.
    pub technical_terms: BTreeSet<String>,
    /// Emotional signal counts per category.
    pub emotional_indicators: BTreeMap<String, usize>,
    /// Sentence-structure complexity, in [0,1].
    pub complexity_score: f64,
    /// Specificity of the request, in [0,1].
    pub specificity_score: f64,
    /// Information density, in [0,1].
    pub information_density: f64,
    /// Topic families present, in match order.
    pub key_topics: Vec<String>,
    /// Domain concepts mentioned, in match order.
    pub domain_concepts: Vec<String>,
    /// Overall quality bucket.
    pub content_quality: ContentQuality,
}

/// Content analyzer. Stateless; scores one input at a time.
#[derive(Debug, Default)]
pub struct ContentAnalyzer;

impl ContentAnalyzer {
    /// Creates a new analyzer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Analyzes one learner input.
    #[must_use]
    pub fn analyze(&self, input: &str) -> ContentAnalysis {
        let truncated = truncate_words(input, ANALYSIS_WORD_CAP);
        let lower = truncated.to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();
        let word_count = words.len();

        if word_count == 0 {
            return ContentAnalysis::default();
        }

        let technical_terms: BTreeSet<String> = TECHNICAL_TERMS
            .iter()
            .filter(|term| lower.contains(*term))
            .map(|term| (*term).to_string())
            .collect();

        let mut emotional_indicators = BTreeMap::new();
        for (category, markers) in EMOTIONAL_FAMILIES {
            let count = markers.iter().filter(|m| lower.contains(*m)).count();
            if count > 0 {
                emotional_indicators.insert((*category).to_string(), count);
            }
        }

        let key_topics = extract_topics(&lower);
        let domain_concepts: Vec<String> = technical_terms.iter().cloned().collect();

        // Complexity: clause markers and sentence length.
        let clause_markers = ["because", "while", "although", "however", "so that", "which"]
            .iter()
            .filter(|m| lower.contains(*m))
            .count();
        let avg_sentence_len = {
            let sentences = truncated.split(['.', '?', '!']).filter(|s| !s.trim().is_empty());
            let (total, count) = sentences
                .map(|s| s.split_whitespace().count())
                .fold((0usize, 0usize), |(t, c), len| (t + len, c + 1));
            if count == 0 { 0.0 } else { total as f64 / count as f64 }
        };
        let complexity_score =
            ((clause_markers as f64 * 0.15) + (avg_sentence_len / 40.0)).min(1.0);

        // Specificity: technical terms and concrete numbers.
        let has_numbers = words.iter().any(|w| w.chars().any(|c| c.is_ascii_digit()));
        let specificity_score = ((technical_terms.len() as f64 * 0.2)
            + if has_numbers { 0.2 } else { 0.0 })
        .min(1.0);

        // Density: distinct content per word.
        let distinct: BTreeSet<&&str> = words.iter().collect();
        let information_density =
            ((distinct.len() as f64 / word_count as f64) * (word_count as f64 / 40.0).min(1.0))
                .min(1.0);

        let content_quality = if specificity_score >= 0.5 && complexity_score >= 0.4 {
            ContentQuality::High
        } else if specificity_score >= 0.2 || !key_topics.is_empty() {
            ContentQuality::Medium
        } else {
            ContentQuality::Basic
        };

        debug!(
            word_count,
            technical_terms = technical_terms.len(),
            topics = key_topics.len(),
            quality = ?content_quality,
            "analyzed input content"
        );

        ContentAnalysis {
            technical_terms,
            emotional_indicators,
            complexity_score,
            specificity_score,
            information_density,
            key_topics,
            domain_concepts,
            content_quality,
        }
    }
}

/// Extracts topic-family names present in the lower-cased text, in family
/// order. Shared with the router's transition and dependency checks.
#[must_use]
pub fn extract_topics(lower: &str) -> Vec<String> {
    TOPIC_FAMILIES
        .iter()
        .filter(|(_, markers)| markers.iter().any(|m| lower.contains(m)))
        .map(|(name, _)| (*name).to_string())
        .collect()
}

fn truncate_words(input: &str, cap: usize) -> String {
    let words: Vec<&str> = input.split_whitespace().collect();
    if words.len() <= cap {
        input.to_string()
    } else {
        words[..cap].join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technical_terms_detected() {
        let analysis = ContentAnalyzer::new()
            .analyze("The circulation wraps the courtyard and the facade needs glazing studies.");
        assert!(analysis.technical_terms.contains("circulation"));
        assert!(analysis.technical_terms.contains("courtyard"));
        assert!(analysis.technical_terms.contains("facade"));
        assert!(analysis.key_topics.contains(&"circulation".to_string()));
    }

    #[test]
    fn test_scores_stay_in_unit_interval() {
        let dense = "circulation massing parti facade section datum threshold egress \
                     daylighting fenestration cantilever adjacency program zoning because \
                     although 2000 m2 however which while so that structure span module";
        let analysis = ContentAnalyzer::new().analyze(dense);
        assert!(analysis.complexity_score >= 0.0 && analysis.complexity_score <= 1.0);
        assert!(analysis.specificity_score >= 0.0 && analysis.specificity_score <= 1.0);
        assert!(analysis.information_density >= 0.0 && analysis.information_density <= 1.0);
        assert_eq!(analysis.content_quality, ContentQuality::High);
    }

    #[test]
    fn test_emotional_indicators_counted() {
        let analysis =
            ContentAnalyzer::new().analyze("I'm stuck and worried the scheme is falling apart");
        assert_eq!(analysis.emotional_indicators.get("frustration"), Some(&1));
        assert_eq!(analysis.emotional_indicators.get("anxiety"), Some(&1));
    }

    #[test]
    fn test_empty_input_yields_default() {
        let analysis = ContentAnalyzer::new().analyze("");
        assert_eq!(analysis, ContentAnalysis::default());
        assert_eq!(analysis.content_quality, ContentQuality::Basic);
    }

    #[test]
    fn test_oversized_input_truncates_without_panic() {
        let huge = "courtyard light ".repeat(2000);
        let analysis = ContentAnalyzer::new().analyze(&huge);
        assert!(analysis.key_topics.contains(&"lighting".to_string()));
    }

    #[test]
    fn test_extract_topics_ordering() {
        let topics = extract_topics("the corridor gets no daylight near the concrete core");
        assert_eq!(topics, vec!["circulation", "lighting", "materials"]);
    }
}
