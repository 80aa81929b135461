//! Routing value types.

use crate::classification::{ContentAnalysis, ConversationPatterns, CoreClassification};
use crate::context::{ContextualMetadata, RoutingSuggestions};
use crate::state::ConversationState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Execution path selected for a turn.
///
/// Adding a route means extending this enum, the graph's dispatch table,
/// and the decision tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteType {
    /// Opening-turn grounding response.
    ProgressiveOpening,
    /// Bridge into a new topic.
    TopicTransition,
    /// Counter cognitive offloading.
    CognitiveIntervention,
    /// Open questioning on the learner's answer.
    SocraticExploration,
    /// Guidance on a design move.
    DesignGuidance,
    /// Full multi-agent pass.
    MultiAgentComprehensive,
    /// Knowledge delivery plus a challenge.
    KnowledgeWithChallenge,
    /// Clarify the tutor's own question.
    SocraticClarification,
    /// Support a struggling learner.
    SupportiveScaffolding,
    /// Push an overconfident or disengaged learner.
    CognitiveChallenge,
    /// Rebuild fundamentals.
    FoundationalBuilding,
    /// Balanced knowledge-plus-questions default.
    BalancedGuidance,
    /// Knowledge delivery alone.
    KnowledgeOnly,
    /// Focused Socratic questioning on a decision.
    SocraticFocus,
    /// Catch-all.
    Default,
}

impl RouteType {
    /// Stable string form used in metadata and suggestions.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RouteType::ProgressiveOpening => "progressive_opening",
            RouteType::TopicTransition => "topic_transition",
            RouteType::CognitiveIntervention => "cognitive_intervention",
            RouteType::SocraticExploration => "socratic_exploration",
            RouteType::DesignGuidance => "design_guidance",
            RouteType::MultiAgentComprehensive => "multi_agent_comprehensive",
            RouteType::KnowledgeWithChallenge => "knowledge_with_challenge",
            RouteType::SocraticClarification => "socratic_clarification",
            RouteType::SupportiveScaffolding => "supportive_scaffolding",
            RouteType::CognitiveChallenge => "cognitive_challenge",
            RouteType::FoundationalBuilding => "foundational_building",
            RouteType::BalancedGuidance => "balanced_guidance",
            RouteType::KnowledgeOnly => "knowledge_only",
            RouteType::SocraticFocus => "socratic_focus",
            RouteType::Default => "default",
        }
    }

    /// Parses the snake_case form used in context-agent suggestions.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "progressive_opening" => Some(RouteType::ProgressiveOpening),
            "topic_transition" => Some(RouteType::TopicTransition),
            "cognitive_intervention" => Some(RouteType::CognitiveIntervention),
            "socratic_exploration" => Some(RouteType::SocraticExploration),
            "design_guidance" => Some(RouteType::DesignGuidance),
            "multi_agent_comprehensive" => Some(RouteType::MultiAgentComprehensive),
            "knowledge_with_challenge" => Some(RouteType::KnowledgeWithChallenge),
            "socratic_clarification" => Some(RouteType::SocraticClarification),
            "supportive_scaffolding" => Some(RouteType::SupportiveScaffolding),
            "cognitive_challenge" => Some(RouteType::CognitiveChallenge),
            "foundational_building" => Some(RouteType::FoundationalBuilding),
            "balanced_guidance" => Some(RouteType::BalancedGuidance),
            "knowledge_only" => Some(RouteType::KnowledgeOnly),
            "socratic_focus" => Some(RouteType::SocraticFocus),
            "default" => Some(RouteType::Default),
            _ => None,
        }
    }

    /// All routes, for completeness checks.
    #[must_use]
    pub fn all() -> &'static [RouteType] {
        &[
            RouteType::ProgressiveOpening,
            RouteType::TopicTransition,
            RouteType::CognitiveIntervention,
            RouteType::SocraticExploration,
            RouteType::DesignGuidance,
            RouteType::MultiAgentComprehensive,
            RouteType::KnowledgeWithChallenge,
            RouteType::SocraticClarification,
            RouteType::SupportiveScaffolding,
            RouteType::CognitiveChallenge,
            RouteType::FoundationalBuilding,
            RouteType::BalancedGuidance,
            RouteType::KnowledgeOnly,
            RouteType::SocraticFocus,
            RouteType::Default,
        ]
    }
}

impl std::fmt::Display for RouteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of cognitive offloading detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffloadingType {
    /// Asking for answers before exploring.
    PrematureAnswerSeeking,
    /// Overconfident but disengaged.
    SuperficialConfidence,
    /// Re-asking the same questions instead of reasoning.
    RepetitiveDependency,
}

impl OffloadingType {
    /// Stable string form used in metadata.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OffloadingType::PrematureAnswerSeeking => "premature_answer_seeking",
            OffloadingType::SuperficialConfidence => "superficial_confidence",
            OffloadingType::RepetitiveDependency => "repetitive_dependency",
        }
    }
}

/// Everything the decision tree reads.
pub struct RoutingContext<'a> {
    /// Classification of the current input.
    pub classification: &'a CoreClassification,
    /// Content analysis of the current input.
    pub content: &'a ContentAnalysis,
    /// Patterns across the recent conversation.
    pub patterns: &'a ConversationPatterns,
    /// Derived pedagogical signals.
    pub metadata: &'a ContextualMetadata,
    /// Context-agent route suggestion.
    pub suggestions: &'a RoutingSuggestions,
    /// The session state.
    pub state: &'a ConversationState,
    /// The raw learner input.
    pub input: &'a str,
}

/// The routing verdict for a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// The selected route.
    pub route: RouteType,
    /// Human-readable reasoning.
    pub reason: String,
    /// Confidence in the decision, in [0,1].
    pub confidence: f64,
    /// Which rule row fired.
    pub rule_applied: String,
    /// Whether cognitive offloading was detected.
    pub cognitive_offloading_detected: bool,
    /// The kind of offloading, when detected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cognitive_offloading_type: Option<OffloadingType>,
    /// Whether the context agent's suggestion decided the route.
    pub context_agent_override: bool,
    /// Extra decision facts (e.g. the cooling-off reclassification).
    pub metadata: HashMap<String, serde_json::Value>,
}

impl RoutingDecision {
    /// Builds a decision with empty metadata.
    #[must_use]
    pub fn new(route: RouteType, reason: String, confidence: f64, rule_applied: &str) -> Self {
        Self {
            route,
            reason,
            confidence,
            rule_applied: rule_applied.to_string(),
            cognitive_offloading_detected: false,
            cognitive_offloading_type: None,
            context_agent_override: false,
            metadata: HashMap::new(),
        }
    }

    /// Whether the cooling-off rule reclassified this turn's example
    /// request.
    #[must_use]
    pub fn is_premature_example_request(&self) -> bool {
        self.metadata
            .get("reclassified_as")
            .and_then(|v| v.as_str())
            .is_some_and(|v| v == "premature_example_request")
    }
}
