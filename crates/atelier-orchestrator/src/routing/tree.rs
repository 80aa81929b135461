//! The routing decision tree.
//!
//! Rule-ordered dispatch from classification and conversation context to an
//! execution path. The first matching rule wins and the decision records
//! which rule fired, so routing stays auditable turn by turn.

use super::offloading::detect_cognitive_offloading;
use super::types::{OffloadingType, RouteType, RoutingContext, RoutingDecision};
use crate::classification::{
    extract_topics, is_example_request_text, jaccard_overlap, ConfidenceLevel, EngagementLevel,
    InteractionType, UnderstandingLevel,
};
use crate::state::MessageRole;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Phrasings that announce a deliberate topic change.
const TOPIC_TRANSITION_MARKERS: &[&str] = &[
    "let's talk about",
    "lets talk about",
    "switching to",
    "moving on",
    "what about the",
    "different topic",
    "now i want to",
    "next i want to",
    "instead let's",
];

/// Design-decision phrasings that deserve questioning over answers.
const DESIGN_DECISION_MARKERS: &[&str] = &[
    "which should i",
    "which one should",
    "recommend",
    "recommendation",
    "better option",
    "or should i",
    "what would you pick",
];

/// Phrasings asking the tutor to clarify itself.
const CLARIFICATION_MARKERS: &[&str] = &[
    "what do you mean",
    "why did you ask",
    "can you rephrase",
    "what are you asking",
    "i'm not sure what you're asking",
];

/// Interaction types that keep the opening turn on the progressive path.
/// Requests (examples, feedback, direct answers) bypass the opener so the
/// guard rules below still see them.
fn is_opening_interaction(interaction_type: InteractionType) -> bool {
    matches!(
        interaction_type,
        InteractionType::ProjectDescription
            | InteractionType::GeneralStatement
            | InteractionType::GeneralQuestion
            | InteractionType::ImplementationRequest
            | InteractionType::DesignProblem
    )
}

/// The advanced routing decision tree.
pub struct RoutingTree {
    /// User messages below this reroute example requests to intervention.
    cooling_off_messages: usize,
    /// Jaccard cutoff for the topic-transition rule. Tunable.
    topic_overlap_threshold: f64,
    /// Context-agent suggestions at or above this confidence win rule 13.
    suggestion_confidence_threshold: f64,
}

impl RoutingTree {
    /// Creates a tree with the given cooling-off window.
    #[must_use]
    pub fn new(cooling_off_messages: usize) -> Self {
        Self {
            cooling_off_messages,
            topic_overlap_threshold: 0.2,
            suggestion_confidence_threshold: 0.6,
        }
    }

    /// Overrides the topic-transition overlap cutoff.
    #[must_use]
    pub fn with_topic_overlap_threshold(mut self, threshold: f64) -> Self {
        self.topic_overlap_threshold = threshold;
        self
    }

    /// Decides the route for one turn. First matching rule wins.
    #[must_use]
    pub fn decide(&self, ctx: &RoutingContext<'_>) -> RoutingDecision {
        let decision = self.decide_inner(ctx);
        info!(
            route = %decision.route,
            rule = %decision.rule_applied,
            confidence = decision.confidence,
            offloading = decision.cognitive_offloading_detected,
            "routing decision"
        );
        decision
    }

    fn decide_inner(&self, ctx: &RoutingContext<'_>) -> RoutingDecision {
        let classification = ctx.classification;
        let user_count = ctx.state.user_message_count();

        // Rule 1: the opening turn gets the progressive path, unless the
        // learner opened with a request the guard rules must see.
        if user_count == 0
            || (user_count <= 1 && is_opening_interaction(classification.interaction_type))
        {
            return RoutingDecision::new(
                RouteType::ProgressiveOpening,
                "Progressive conversation opening".to_string(),
                0.95,
                "rule_1_first_message",
            );
        }

        // Rule 2: deliberate topic change with little overlap to the recent
        // focus.
        if let Some(decision) = self.check_topic_transition(ctx) {
            return decision;
        }

        // Rule 3: the learner answered the tutor's question.
        if classification.interaction_type == InteractionType::QuestionResponse {
            return RoutingDecision::new(
                RouteType::SocraticExploration,
                "Learner answered the previous question; continue the exploration".to_string(),
                0.85,
                "rule_3_question_response",
            );
        }

        // Rule 4: cognitive offloading, including the cooling-off window for
        // early example requests.
        if let Some(decision) = self.check_offloading(ctx, user_count) {
            return decision;
        }

        let lower = ctx.input.to_lowercase();

        // Rule 5: pure example request, past the cooling-off window.
        if classification.interaction_type == InteractionType::ExampleRequest
            || (is_example_request_text(ctx.input)
                && classification.interaction_type != InteractionType::DesignGuidanceRequest)
        {
            return RoutingDecision::new(
                RouteType::KnowledgeOnly,
                "User requested examples; pure knowledge delivery".to_string(),
                0.9,
                "rule_5_example_request",
            );
        }

        // Rule 6: design-decision question; question the decision rather
        // than make it.
        if DESIGN_DECISION_MARKERS.iter().any(|m| lower.contains(m)) {
            return RoutingDecision::new(
                RouteType::SocraticFocus,
                "Design decision question; focus questioning on the choice".to_string(),
                0.8,
                "rule_6_design_decision",
            );
        }

        // Rule 7: design guidance.
        if classification.interaction_type == InteractionType::DesignGuidanceRequest {
            return RoutingDecision::new(
                RouteType::DesignGuidance,
                "Design guidance requested".to_string(),
                0.85,
                "rule_7_design_guidance",
            );
        }

        // Rule 8: the learner wants the tutor to clarify itself.
        if CLARIFICATION_MARKERS.iter().any(|m| lower.contains(m)) {
            return RoutingDecision::new(
                RouteType::SocraticClarification,
                "Clarification of the tutor's question needed".to_string(),
                0.8,
                "rule_8_clarification",
            );
        }

        // Rule 9: technical question.
        if classification.interaction_type == InteractionType::TechnicalQuestion {
            return RoutingDecision::new(
                RouteType::KnowledgeOnly,
                "Technical question; deliver the requirement directly".to_string(),
                0.9,
                "rule_9_technical_question",
            );
        }

        // Rule 10: confusion or low understanding.
        if classification.shows_confusion
            || classification.understanding_level == UnderstandingLevel::Low
        {
            let (route, rule) =
                if classification.confidence_level == ConfidenceLevel::Uncertain {
                    (RouteType::FoundationalBuilding, "rule_10_foundational_building")
                } else {
                    (RouteType::SupportiveScaffolding, "rule_10_supportive_scaffolding")
                };
            return RoutingDecision::new(
                route,
                "User expressed confusion or low understanding; scaffold supportively"
                    .to_string(),
                0.85,
                rule,
            );
        }

        // Rule 11: overconfidence or low engagement deserves a challenge.
        if classification.demonstrates_overconfidence
            || classification.engagement_level == EngagementLevel::Low
        {
            let mut decision = RoutingDecision::new(
                RouteType::CognitiveChallenge,
                "User appears overconfident or disengaged; challenge appropriately".to_string(),
                0.8,
                "rule_11_cognitive_challenge",
            );
            if classification.demonstrates_overconfidence {
                decision.cognitive_offloading_detected = true;
                decision.cognitive_offloading_type = Some(OffloadingType::SuperficialConfidence);
            }
            return decision;
        }

        // Rule 12: feedback request (past the premature window) gets the
        // full pass.
        if classification.interaction_type == InteractionType::FeedbackRequest {
            return RoutingDecision::new(
                RouteType::MultiAgentComprehensive,
                "User requested feedback; comprehensive multi-agent response".to_string(),
                0.85,
                "rule_12_feedback_request",
            );
        }

        // Rule 13: a confident context-agent suggestion not contradicted by
        // the rules above.
        if ctx.suggestions.confidence >= self.suggestion_confidence_threshold {
            if let Some(route) = RouteType::parse(&ctx.suggestions.primary_route) {
                let mut decision = RoutingDecision::new(
                    route,
                    format!(
                        "Context agent suggested '{}' with {:.0}% confidence",
                        ctx.suggestions.primary_route,
                        ctx.suggestions.confidence * 100.0
                    ),
                    ctx.suggestions.confidence,
                    "rule_13_context_agent_suggestion",
                );
                decision.context_agent_override = true;
                return decision;
            }
        }

        // Rule 14: balanced default.
        RoutingDecision::new(
            RouteType::BalancedGuidance,
            "Balanced guidance approach".to_string(),
            0.6,
            "rule_14_default",
        )
    }

    fn check_topic_transition(&self, ctx: &RoutingContext<'_>) -> Option<RoutingDecision> {
        let lower = ctx.input.to_lowercase();
        if !TOPIC_TRANSITION_MARKERS.iter().any(|m| lower.contains(m)) {
            return None;
        }

        // Compare the current topics against the focus of earlier learner
        // messages, excluding this one.
        let current: BTreeSet<String> = extract_topics(&lower).into_iter().collect();
        let previous: BTreeSet<String> = ctx
            .state
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .rev()
            .skip(1)
            .take(4)
            .flat_map(|m| extract_topics(&m.content.to_lowercase()))
            .collect();

        if previous.is_empty() || current.is_empty() {
            return None;
        }

        let overlap = jaccard_overlap(&current, &previous);
        debug!(overlap, threshold = self.topic_overlap_threshold, "topic transition check");
        if overlap >= self.topic_overlap_threshold {
            return None;
        }

        Some(RoutingDecision::new(
            RouteType::TopicTransition,
            "Topic transition detected; bridge before continuing".to_string(),
            0.85,
            "rule_2_topic_transition",
        ))
    }

    fn check_offloading(
        &self,
        ctx: &RoutingContext<'_>,
        user_count: usize,
    ) -> Option<RoutingDecision> {
        // Cooling-off: example requests before the Nth user message are
        // reclassified and intercepted.
        if is_example_request_text(ctx.input) && user_count < self.cooling_off_messages {
            let mut decision = RoutingDecision::new(
                RouteType::CognitiveIntervention,
                format!(
                    "Example request within the first {} messages; scaffold before precedents",
                    self.cooling_off_messages
                ),
                0.9,
                "rule_4_cooling_off_example",
            );
            decision.cognitive_offloading_detected = true;
            decision.cognitive_offloading_type = Some(OffloadingType::PrematureAnswerSeeking);
            decision.metadata.insert(
                "reclassified_as".to_string(),
                serde_json::json!("premature_example_request"),
            );
            return Some(decision);
        }

        let indicators = detect_cognitive_offloading(
            ctx.classification,
            ctx.patterns,
            ctx.input,
            user_count,
        );
        if !indicators.detected {
            return None;
        }

        let mut decision = RoutingDecision::new(
            RouteType::CognitiveIntervention,
            "Cognitive offloading detected".to_string(),
            indicators.confidence,
            "rule_4_cognitive_offloading",
        );
        decision.cognitive_offloading_detected = true;
        decision.cognitive_offloading_type = indicators.offloading_type;
        decision
            .metadata
            .insert("indicators".to_string(), serde_json::json!(indicators.indicators));
        Some(decision)
    }
}
