//! Cognitive-offloading detection.
//!
//! The detector looks for three patterns of a learner outsourcing the
//! reasoning to the tutor, with explicit exceptions for legitimate
//! follow-ups so genuine curiosity is never punished.

use super::types::OffloadingType;
use crate::classification::{
    ConversationPatterns, CoreClassification, EngagementLevel, InteractionType,
};
use tracing::debug;

/// New design aspects a learner may legitimately ask about even when topics
/// repeat (asking about "lighting" after "circulation" is progress, not
/// dependency).
const DESIGN_ASPECT_WORDS: &[&str] =
    &["circulation", "lighting", "structure", "materials", "program", "context"];

/// The detector's verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct OffloadingIndicators {
    /// Whether offloading was detected.
    pub detected: bool,
    /// The pattern that fired.
    pub offloading_type: Option<OffloadingType>,
    /// Confidence in the detection, in [0,1].
    pub confidence: f64,
    /// Human-readable evidence.
    pub indicators: Vec<String>,
}

impl OffloadingIndicators {
    fn none() -> Self {
        Self { detected: false, offloading_type: None, confidence: 0.0, indicators: Vec::new() }
    }

    fn found(offloading_type: OffloadingType, confidence: f64, indicator: &str) -> Self {
        Self {
            detected: true,
            offloading_type: Some(offloading_type),
            confidence,
            indicators: vec![indicator.to_string()],
        }
    }
}

/// Detects cognitive offloading in the current turn.
///
/// # Arguments
/// * `classification` - Classification of the current input
/// * `patterns` - Conversation patterns over the recent window
/// * `input` - The raw learner input
/// * `user_message_count` - Learner messages so far, including this one
#[must_use]
pub fn detect_cognitive_offloading(
    classification: &CoreClassification,
    patterns: &ConversationPatterns,
    input: &str,
    user_message_count: usize,
) -> OffloadingIndicators {
    // Pattern 1: seeking evaluation before any exploration happened.
    if classification.interaction_type == InteractionType::FeedbackRequest
        && user_message_count < 3
    {
        debug!(count = user_message_count, "premature feedback seeking");
        return OffloadingIndicators::found(
            OffloadingType::PrematureAnswerSeeking,
            0.8,
            "asking for answers before exploration",
        );
    }

    // Pattern 2: certainty without engagement.
    if classification.demonstrates_overconfidence
        && classification.engagement_level == EngagementLevel::Low
    {
        return OffloadingIndicators::found(
            OffloadingType::SuperficialConfidence,
            0.7,
            "overconfident but not engaged",
        );
    }

    // Pattern 3: the same topics keep coming back without new reasoning.
    if patterns.has_repetitive_topics {
        // A legitimate answer to the tutor's question is not dependency.
        if classification.interaction_type == InteractionType::QuestionResponse {
            return OffloadingIndicators::none();
        }
        // Knowledge-seeking follow-ups deserve direct answers.
        if classification.interaction_type == InteractionType::KnowledgeRequest {
            debug!("knowledge-seeking follow-up, not repetitive dependency");
            return OffloadingIndicators::none();
        }
        // Asking about a different design aspect is progress.
        let lower = input.to_lowercase();
        if DESIGN_ASPECT_WORDS.iter().any(|w| lower.contains(w)) {
            debug!("new design aspect, not repetitive dependency");
            return OffloadingIndicators::none();
        }

        return OffloadingIndicators::found(
            OffloadingType::RepetitiveDependency,
            0.6,
            "repeating the same questions",
        );
    }

    OffloadingIndicators::none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::ConfidenceLevel;

    fn classification(interaction_type: InteractionType) -> CoreClassification {
        CoreClassification { interaction_type, ..CoreClassification::default() }
    }

    #[test]
    fn test_premature_feedback_seeking() {
        let c = classification(InteractionType::FeedbackRequest);
        let result = detect_cognitive_offloading(
            &c,
            &ConversationPatterns::default(),
            "what do you think of my plan?",
            2,
        );
        assert!(result.detected);
        assert_eq!(result.offloading_type, Some(OffloadingType::PrematureAnswerSeeking));
        assert_eq!(result.confidence, 0.8);
    }

    #[test]
    fn test_feedback_after_exploration_is_fine() {
        let c = classification(InteractionType::FeedbackRequest);
        let result = detect_cognitive_offloading(
            &c,
            &ConversationPatterns::default(),
            "what do you think of my plan?",
            6,
        );
        assert!(!result.detected);
    }

    #[test]
    fn test_superficial_confidence() {
        let c = CoreClassification {
            confidence_level: ConfidenceLevel::Overconfident,
            demonstrates_overconfidence: true,
            engagement_level: EngagementLevel::Low,
            ..CoreClassification::default()
        };
        let result = detect_cognitive_offloading(
            &c,
            &ConversationPatterns::default(),
            "done, it's perfect",
            8,
        );
        assert!(result.detected);
        assert_eq!(result.offloading_type, Some(OffloadingType::SuperficialConfidence));
    }

    #[test]
    fn test_repetitive_dependency() {
        let patterns =
            ConversationPatterns { has_repetitive_topics: true, ..ConversationPatterns::default() };
        let c = classification(InteractionType::GeneralQuestion);
        let result = detect_cognitive_offloading(&c, &patterns, "so what should it be?", 7);
        assert!(result.detected);
        assert_eq!(result.offloading_type, Some(OffloadingType::RepetitiveDependency));
    }

    #[test]
    fn test_new_design_aspect_is_not_dependency() {
        let patterns =
            ConversationPatterns { has_repetitive_topics: true, ..ConversationPatterns::default() };
        let c = classification(InteractionType::GeneralQuestion);
        let result =
            detect_cognitive_offloading(&c, &patterns, "and what about the lighting?", 7);
        assert!(!result.detected);
    }

    #[test]
    fn test_knowledge_follow_up_is_not_dependency() {
        let patterns =
            ConversationPatterns { has_repetitive_topics: true, ..ConversationPatterns::default() };
        let c = classification(InteractionType::KnowledgeRequest);
        let result = detect_cognitive_offloading(&c, &patterns, "tell me about acoustics", 7);
        assert!(!result.detected);
    }

    #[test]
    fn test_question_response_is_not_dependency() {
        let patterns =
            ConversationPatterns { has_repetitive_topics: true, ..ConversationPatterns::default() };
        let c = classification(InteractionType::QuestionResponse);
        let result = detect_cognitive_offloading(&c, &patterns, "yes, twice", 7);
        assert!(!result.detected);
    }
}
