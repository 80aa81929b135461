//! The per-turn context package.
//!
//! Built once per turn by the context agent and consumed by the router and
//! every downstream agent. The package is immutable after creation.

use crate::classification::{
    ConfidenceLevel, ContentAnalysis, ContentQuality, ConversationPatterns, CoreClassification,
    EngagementLevel, InteractionType, UnderstandingLevel,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How well the current material fits the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityAppropriateness {
    /// Under-challenging.
    TooSimple,
    /// Matched to the learner.
    #[default]
    Appropriate,
    /// Hard but workable.
    ManageableChallenge,
    /// Over their head right now.
    TooComplex,
    /// Room to push harder.
    CouldBeMoreChallenging,
}

/// How urgently the learner needs a reply that unblocks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseUrgency {
    /// Exploration; no pressure.
    Low,
    /// Normal tutoring cadence.
    #[default]
    Moderate,
    /// Confusion or frustration present; respond supportively first.
    High,
}

/// Derived signals about the pedagogical moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContextualMetadata {
    /// Fit of current material to the learner.
    pub complexity_appropriateness: ComplexityAppropriateness,
    /// Urgency of the reply.
    pub response_urgency: ResponseUrgency,
    /// The teaching opening this turn presents.
    pub pedagogical_opportunity: String,
    /// Whether the learner can absorb a challenge right now.
    pub challenge_readiness: bool,
    /// Whether the learner needs an explanation before questions.
    pub explanation_need: bool,
    /// Gaps the retrieval layer should fill.
    pub information_gaps: Vec<String>,
    /// Areas the analysis agent should focus on.
    pub analysis_focus_areas: Vec<String>,
}

/// Route suggestion produced by the context agent for the router's rule 13.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RoutingSuggestions {
    /// Suggested route name (a `RouteType` string form).
    pub primary_route: String,
    /// Confidence in the suggestion, in [0,1].
    pub confidence: f64,
    /// Why the suggestion was made.
    pub reasoning: Vec<String>,
}

/// The immutable per-turn bundle handed to the router and the agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextPackage {
    /// Classification of the current input.
    pub classification: CoreClassification,
    /// Content analysis of the current input.
    pub content_analysis: ContentAnalysis,
    /// Patterns across the recent conversation.
    pub conversation_patterns: ConversationPatterns,
    /// Derived pedagogical signals.
    pub metadata: ContextualMetadata,
    /// Route suggestion for the router's override rule.
    pub routing_suggestions: RoutingSuggestions,
    /// Per-agent context shards keyed by agent name.
    pub agent_shards: HashMap<String, serde_json::Value>,
}

impl ContextPackage {
    /// The degenerate package built when any context sub-step fails. It
    /// never blocks the pipeline.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            classification: CoreClassification::fallback(),
            content_analysis: ContentAnalysis::default(),
            conversation_patterns: ConversationPatterns::default(),
            metadata: ContextualMetadata::default(),
            routing_suggestions: RoutingSuggestions::default(),
            agent_shards: HashMap::new(),
        }
    }
}

/// Derives the contextual metadata from classification and content signals.
#[must_use]
pub fn generate_metadata(
    classification: &CoreClassification,
    content: &ContentAnalysis,
    patterns: &ConversationPatterns,
) -> ContextualMetadata {
    let complexity_appropriateness = match (
        classification.understanding_level,
        content.content_quality,
    ) {
        (UnderstandingLevel::Low, ContentQuality::High) => ComplexityAppropriateness::TooComplex,
        (UnderstandingLevel::Low, _) => ComplexityAppropriateness::ManageableChallenge,
        (UnderstandingLevel::High, ContentQuality::Basic) => {
            ComplexityAppropriateness::CouldBeMoreChallenging
        }
        (UnderstandingLevel::High, _) => ComplexityAppropriateness::Appropriate,
        _ => ComplexityAppropriateness::Appropriate,
    };

    let response_urgency = if classification.shows_confusion
        || content.emotional_indicators.contains_key("frustration")
        || content.emotional_indicators.contains_key("anxiety")
    {
        ResponseUrgency::High
    } else if classification.engagement_level == EngagementLevel::Low {
        ResponseUrgency::Low
    } else {
        ResponseUrgency::Moderate
    };

    let pedagogical_opportunity = match classification.interaction_type {
        InteractionType::ConfusionExpression => "rebuild the concept from fundamentals".to_string(),
        InteractionType::DirectAnswerRequest => "redirect toward the learner's own reasoning".to_string(),
        InteractionType::ExampleRequest => "connect precedents back to the learner's project".to_string(),
        InteractionType::ProjectDescription => "surface the implicit design questions".to_string(),
        _ if classification.demonstrates_overconfidence => {
            "test the certainty against a constraint".to_string()
        }
        _ => "deepen the current line of inquiry".to_string(),
    };

    let challenge_readiness = !classification.shows_confusion
        && classification.understanding_level != UnderstandingLevel::Low
        && classification.confidence_level != ConfidenceLevel::Uncertain;

    let explanation_need = classification.shows_confusion
        || classification.understanding_level == UnderstandingLevel::Low;

    let mut information_gaps = Vec::new();
    if classification.is_technical_question {
        information_gaps.push("code_and_standards".to_string());
    }
    if content.key_topics.is_empty() {
        information_gaps.push("project_framing".to_string());
    }

    let mut analysis_focus_areas = content.key_topics.clone();
    if patterns.has_repetitive_topics {
        analysis_focus_areas.push("recurring_topic".to_string());
    }

    ContextualMetadata {
        complexity_appropriateness,
        response_urgency,
        pedagogical_opportunity,
        challenge_readiness,
        explanation_need,
        information_gaps,
        analysis_focus_areas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::InteractionType;

    #[test]
    fn test_confusion_drives_urgency_and_explanation() {
        let classification = CoreClassification {
            interaction_type: InteractionType::ConfusionExpression,
            shows_confusion: true,
            understanding_level: UnderstandingLevel::Low,
            ..CoreClassification::default()
        };
        let metadata = generate_metadata(
            &classification,
            &ContentAnalysis::default(),
            &ConversationPatterns::default(),
        );
        assert_eq!(metadata.response_urgency, ResponseUrgency::High);
        assert!(metadata.explanation_need);
        assert!(!metadata.challenge_readiness);
    }

    #[test]
    fn test_high_understanding_basic_content_could_be_pushed() {
        let classification = CoreClassification {
            understanding_level: UnderstandingLevel::High,
            ..CoreClassification::default()
        };
        let metadata = generate_metadata(
            &classification,
            &ContentAnalysis::default(),
            &ConversationPatterns::default(),
        );
        assert_eq!(
            metadata.complexity_appropriateness,
            ComplexityAppropriateness::CouldBeMoreChallenging
        );
        assert!(metadata.challenge_readiness);
    }

    #[test]
    fn test_technical_question_opens_information_gap() {
        let classification = CoreClassification {
            interaction_type: InteractionType::TechnicalQuestion,
            is_technical_question: true,
            ..CoreClassification::default()
        };
        let metadata = generate_metadata(
            &classification,
            &ContentAnalysis::default(),
            &ConversationPatterns::default(),
        );
        assert!(metadata.information_gaps.contains(&"code_and_standards".to_string()));
    }

    #[test]
    fn test_fallback_package_shape() {
        let package = ContextPackage::fallback();
        assert_eq!(package.classification.classification_confidence, 0.4);
        assert_eq!(
            package.classification.interaction_type,
            InteractionType::GeneralStatement
        );
        assert!(package.agent_shards.is_empty());
    }
}
