//! Two-stage classification pipeline with manual-override priority.

use super::patterns;
use super::types::{
    ConfidenceLevel, CoreClassification, EngagementLevel, InteractionType, ThreadContext,
    UnderstandingLevel,
};
use crate::llm::LlmClient;
use crate::state::ConversationState;
use tracing::debug;

/// Confidence floor recorded when a pattern override decided the type.
const OVERRIDE_CONFIDENCE: f64 = 0.85;

/// Confidence recorded when the heuristic fallback filled the axes.
const HEURISTIC_CONFIDENCE: f64 = 0.55;

/// Signals of certainty beyond the evidence.
const OVERCONFIDENCE_MARKERS: &[&str] = &[
    "obviously",
    "perfect",
    "definitely",
    "clearly the best",
    "of course",
    "no doubt",
    "works for everyone",
    "work for everyone",
    "flawless",
    "certainly",
];

/// Hedging signals.
const UNCERTAINTY_MARKERS: &[&str] = &[
    "maybe",
    "not sure",
    "i guess",
    "perhaps",
    "might",
    "i suppose",
    "possibly",
    "i'm unsure",
    "no idea",
];

/// The classification pipeline: pattern stage, LLM stage, heuristic
/// fallback.
pub struct ClassificationPipeline {
    llm: LlmClient,
    classification_temperature: f32,
}

impl ClassificationPipeline {
    /// Creates a pipeline over the shared LLM client.
    #[must_use]
    pub fn new(llm: LlmClient, classification_temperature: f32) -> Self {
        Self { llm, classification_temperature }
    }

    /// Classifies one learner input against the session state.
    ///
    /// The interaction type is decided by the deterministic pattern stage;
    /// the LLM only fills the understanding/confidence/engagement axes, so
    /// classifying the same input twice always yields the same type.
    pub async fn classify(&self, state: &ConversationState, input: &str) -> CoreClassification {
        let (interaction_type, is_response) = patterns::match_interaction_type(input, state);
        let shows_confusion = patterns::contains_confusion_phrasing(input);

        let (understanding, confidence, engagement, axis_confidence) =
            if interaction_type.is_manual_override() {
                // Override types skip the LLM for the type but still get
                // heuristic axes; the LLM adds nothing the patterns missed.
                let (u, c, e) = heuristic_axes(input);
                (u, c, e, OVERRIDE_CONFIDENCE)
            } else {
                self.llm_axes(state, input).await
            };

        // Pattern-detected confusion dominates everything, including the
        // LLM verdict. Callers preferring the LLM verdict flip this rule.
        let interaction_type = if shows_confusion {
            InteractionType::ConfusionExpression
        } else {
            interaction_type
        };

        let classification_confidence = if interaction_type.is_manual_override() {
            axis_confidence.max(OVERRIDE_CONFIDENCE)
        } else {
            axis_confidence
        };

        let classification = CoreClassification {
            interaction_type,
            understanding_level: understanding,
            confidence_level: confidence,
            engagement_level: engagement,
            is_response_to_question: is_response,
            is_technical_question: interaction_type == InteractionType::TechnicalQuestion,
            is_feedback_request: interaction_type == InteractionType::FeedbackRequest,
            shows_confusion,
            demonstrates_overconfidence: confidence == ConfidenceLevel::Overconfident,
            classification_confidence,
            thread_context: if is_response {
                ThreadContext::AnsweringPreviousQuestion
            } else {
                ThreadContext::NormalTurn
            },
        };

        debug!(
            interaction_type = classification.interaction_type.as_str(),
            confidence = classification.classification_confidence,
            shows_confusion = classification.shows_confusion,
            "classified learner input"
        );

        classification
    }

    /// Stage B: asks the LLM for the three non-type axes, falling back to
    /// the keyword heuristic on any failure.
    async fn llm_axes(
        &self,
        state: &ConversationState,
        input: &str,
    ) -> (UnderstandingLevel, ConfidenceLevel, EngagementLevel, f64) {
        let prompt = build_axis_prompt(state, input);
        let value = self
            .llm
            .complete_json(&prompt, self.classification_temperature, serde_json::Value::Null)
            .await;

        if value.is_null() {
            let (u, c, e) = heuristic_axes(input);
            return (u, c, e, HEURISTIC_CONFIDENCE);
        }

        let (hu, hc, he) = heuristic_axes(input);
        let understanding = value["understanding_level"]
            .as_str()
            .and_then(UnderstandingLevel::parse)
            .unwrap_or(hu);
        let confidence = value["confidence_level"]
            .as_str()
            .and_then(ConfidenceLevel::parse)
            .unwrap_or(hc);
        let engagement = value["engagement_level"]
            .as_str()
            .and_then(EngagementLevel::parse)
            .unwrap_or(he);
        let self_confidence = value["classification_confidence"]
            .as_f64()
            .map_or(HEURISTIC_CONFIDENCE, |c| c.clamp(0.0, 1.0));

        (understanding, confidence, engagement, self_confidence)
    }
}

/// Deterministic axis heuristic used for override types and LLM failures.
#[must_use]
pub fn heuristic_axes(input: &str) -> (UnderstandingLevel, ConfidenceLevel, EngagementLevel) {
    let lower = input.to_lowercase();
    let word_count = lower.split_whitespace().count();

    let confidence = if OVERCONFIDENCE_MARKERS.iter().any(|m| lower.contains(m)) {
        ConfidenceLevel::Overconfident
    } else if UNCERTAINTY_MARKERS.iter().any(|m| lower.contains(m))
        || patterns::contains_confusion_phrasing(input)
    {
        ConfidenceLevel::Uncertain
    } else {
        ConfidenceLevel::Confident
    };

    let understanding = if patterns::contains_confusion_phrasing(input) {
        UnderstandingLevel::Low
    } else if word_count > 25 && patterns::has_technical_indicators(input) {
        UnderstandingLevel::High
    } else {
        UnderstandingLevel::Medium
    };

    let engagement = if word_count < 4 {
        EngagementLevel::Low
    } else if word_count > 30 {
        EngagementLevel::High
    } else {
        EngagementLevel::Medium
    };

    (understanding, confidence, engagement)
}

fn build_axis_prompt(state: &ConversationState, input: &str) -> String {
    let recent: Vec<String> = state
        .messages
        .iter()
        .rev()
        .take(4)
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect();
    format!(
        "You assess an architecture student's message.\n\
         Recent conversation (newest first):\n{}\n\n\
         Student message: {input}\n\n\
         Reply with JSON only:\n\
         {{\"understanding_level\": \"low|medium|high\", \
         \"confidence_level\": \"uncertain|confident|overconfident\", \
         \"engagement_level\": \"low|medium|high\", \
         \"classification_confidence\": 0.0, \
         \"reasoning\": \"one sentence\"}}",
        recent.join("\n")
    )
}
