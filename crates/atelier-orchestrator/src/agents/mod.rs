//! The reasoning agents and their shared contract.
//!
//! Every agent reads the per-turn [`WorkflowState`] and returns an
//! [`AgentResponse`] value object; the executor merges results. Agent
//! failures become error responses, never panics, and synthesis treats them
//! as absent.

mod analysis;
mod cognitive;
mod context_agent;
mod domain_expert;
mod socratic;

pub use analysis::AnalysisAgent;
pub use cognitive::{ChallengeSpec, ChallengeType, CognitiveEnhancementAgent};
pub use context_agent::{extract_building_type, ContextAgent};
pub use domain_expert::DomainExpertAgent;
pub use socratic::SocraticTutorAgent;

use crate::error::OrchestrationError;
use crate::knowledge::PassageMetadata;
use crate::state::WorkflowState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Pedagogical property an agent's output supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CognitiveFlag {
    /// Output pushes the learner to reason further.
    DeepThinkingEncouraged,
    /// Output provides partial structure to complete.
    ScaffoldingProvided,
    /// Output responds to detected offloading.
    CognitiveOffloadingDetected,
    /// Output keeps the learner in the loop.
    EngagementMaintained,
    /// Output ties new knowledge to prior work.
    KnowledgeIntegration,
    /// Output advances the learning trajectory.
    LearningProgression,
    /// Output prompts reflection on the learner's own thinking.
    MetacognitiveAwareness,
    /// The learner needs encouragement before challenge.
    NeedsEncouragement,
    /// A challenge is appropriate right now.
    ChallengeAppropriate,
    /// Output grounds theory in application.
    PracticalApplication,
}

impl CognitiveFlag {
    /// Stable string form used in metadata.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CognitiveFlag::DeepThinkingEncouraged => "deep_thinking_encouraged",
            CognitiveFlag::ScaffoldingProvided => "scaffolding_provided",
            CognitiveFlag::CognitiveOffloadingDetected => "cognitive_offloading_detected",
            CognitiveFlag::EngagementMaintained => "engagement_maintained",
            CognitiveFlag::KnowledgeIntegration => "knowledge_integration",
            CognitiveFlag::LearningProgression => "learning_progression",
            CognitiveFlag::MetacognitiveAwareness => "metacognitive_awareness",
            CognitiveFlag::NeedsEncouragement => "needs_encouragement",
            CognitiveFlag::ChallengeAppropriate => "challenge_appropriate",
            CognitiveFlag::PracticalApplication => "practical_application",
        }
    }
}

/// The six enhancement scores plus their derived aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancementMetrics {
    /// How well the output prevents cognitive offloading.
    pub cognitive_offloading_prevention: f64,
    /// How deeply the output engages the learner's thinking.
    pub deep_thinking_engagement: f64,
    /// How well knowledge ties into the learner's project.
    pub knowledge_integration: f64,
    /// Quality of the provided scaffolding.
    pub scaffolding_effectiveness: f64,
    /// Support for reflection on the learner's own reasoning.
    pub metacognitive_awareness: f64,
    /// Contribution to the learning trajectory.
    pub learning_progression: f64,
    /// Arithmetic mean of the six component scores.
    pub overall_cognitive_score: f64,
    /// Confidence in the measurement itself.
    pub scientific_confidence: f64,
}

impl Default for EnhancementMetrics {
    fn default() -> Self {
        Self::new(0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5)
    }
}

impl EnhancementMetrics {
    /// Builds metrics from the six components, deriving the mean.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        cognitive_offloading_prevention: f64,
        deep_thinking_engagement: f64,
        knowledge_integration: f64,
        scaffolding_effectiveness: f64,
        metacognitive_awareness: f64,
        learning_progression: f64,
        scientific_confidence: f64,
    ) -> Self {
        let overall_cognitive_score = (cognitive_offloading_prevention
            + deep_thinking_engagement
            + knowledge_integration
            + scaffolding_effectiveness
            + metacognitive_awareness
            + learning_progression)
            / 6.0;
        Self {
            cognitive_offloading_prevention,
            deep_thinking_engagement,
            knowledge_integration,
            scaffolding_effectiveness,
            metacognitive_awareness,
            learning_progression,
            overall_cognitive_score,
            scientific_confidence,
        }
    }

    /// Averages metrics across agents, component-wise.
    #[must_use]
    pub fn average<'a, I: IntoIterator<Item = &'a EnhancementMetrics>>(metrics: I) -> Self {
        let collected: Vec<&EnhancementMetrics> = metrics.into_iter().collect();
        if collected.is_empty() {
            return Self::default();
        }
        let n = collected.len() as f64;
        Self::new(
            collected.iter().map(|m| m.cognitive_offloading_prevention).sum::<f64>() / n,
            collected.iter().map(|m| m.deep_thinking_engagement).sum::<f64>() / n,
            collected.iter().map(|m| m.knowledge_integration).sum::<f64>() / n,
            collected.iter().map(|m| m.scaffolding_effectiveness).sum::<f64>() / n,
            collected.iter().map(|m| m.metacognitive_awareness).sum::<f64>() / n,
            collected.iter().map(|m| m.learning_progression).sum::<f64>() / n,
            collected.iter().map(|m| m.scientific_confidence).sum::<f64>() / n,
        )
    }
}

/// The value object every agent returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    /// The agent's text contribution.
    pub response_text: String,
    /// What kind of contribution it is (e.g., "knowledge", "question").
    pub response_type: String,
    /// Sources the text is grounded on.
    pub sources_used: Vec<PassageMetadata>,
    /// Pedagogical flags the output supports.
    pub cognitive_flags: BTreeSet<CognitiveFlag>,
    /// Enhancement scores for this contribution.
    pub enhancement_metrics: EnhancementMetrics,
    /// Agent-specific extras.
    pub metadata: HashMap<String, serde_json::Value>,
    /// Set when the agent failed; synthesis treats the response as absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentResponse {
    /// Builds a plain text response.
    #[must_use]
    pub fn text<S: Into<String>, T: Into<String>>(text: S, response_type: T) -> Self {
        Self {
            response_text: text.into(),
            response_type: response_type.into(),
            sources_used: Vec::new(),
            cognitive_flags: BTreeSet::new(),
            enhancement_metrics: EnhancementMetrics::default(),
            metadata: HashMap::new(),
            error: None,
        }
    }

    /// Builds the error response the executor records for a failed agent.
    #[must_use]
    pub fn from_error(message: String) -> Self {
        Self {
            response_text: String::new(),
            response_type: "error".to_string(),
            sources_used: Vec::new(),
            cognitive_flags: BTreeSet::new(),
            enhancement_metrics: EnhancementMetrics::default(),
            metadata: HashMap::new(),
            error: Some(message),
        }
    }

    /// Adds a cognitive flag.
    #[must_use]
    pub fn with_flag(mut self, flag: CognitiveFlag) -> Self {
        self.cognitive_flags.insert(flag);
        self
    }

    /// Sets the enhancement metrics.
    #[must_use]
    pub fn with_metrics(mut self, metrics: EnhancementMetrics) -> Self {
        self.enhancement_metrics = metrics;
        self
    }
}

/// Uniform agent contract: read the turn state, return a response.
#[async_trait]
pub trait TutorAgent: Send + Sync {
    /// Agent name as recorded in `agent_results` and metadata.
    fn name(&self) -> &'static str;

    /// Processes the turn.
    ///
    /// # Errors
    /// Returns an error the executor traps into an error `AgentResponse`.
    async fn process(&self, workflow: &WorkflowState)
        -> Result<AgentResponse, OrchestrationError>;
}

/// The scaffold served instead of precedents during the cooling-off window:
/// three meta-questions the learner answers before examples are useful.
/// Shared by the domain expert and the cognitive enhancement agent.
#[must_use]
pub fn premature_example_scaffold(topic: &str, building_type: &str) -> String {
    let topic = if topic.trim().is_empty() { "this topic" } else { topic.trim() };
    format!(
        "Let's build your understanding before we look at precedents of {topic}.\n\n\
         Before diving into examples, work through these:\n\n\
         1. What specific aspect of {topic} are you most curious about, and why does it \
         matter for your {building_type}?\n\
         2. What challenge in your own scheme makes you feel you need precedents right now?\n\
         3. What have you already considered about this, and where does your current \
         thinking run out?\n\n\
         Answer any of these and I'll meet you there. Once you've explored the ideas \
         in a few more messages, I'll gladly bring in specific precedents to test your \
         thinking against."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_score_is_mean_within_tolerance() {
        let metrics = EnhancementMetrics::new(0.9, 0.8, 0.4, 0.6, 0.5, 0.7, 0.8);
        let expected = (0.9 + 0.8 + 0.4 + 0.6 + 0.5 + 0.7) / 6.0;
        assert!((metrics.overall_cognitive_score - expected).abs() < 1e-6);
    }

    #[test]
    fn test_average_across_agents() {
        let a = EnhancementMetrics::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0);
        let b = EnhancementMetrics::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let avg = EnhancementMetrics::average([&a, &b]);
        assert!((avg.overall_cognitive_score - 0.5).abs() < 1e-6);
        assert!((avg.deep_thinking_engagement - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_average_of_nothing_is_default() {
        let avg = EnhancementMetrics::average(std::iter::empty());
        assert_eq!(avg, EnhancementMetrics::default());
    }

    #[test]
    fn test_error_response_shape() {
        let response = AgentResponse::from_error("model unavailable".to_string());
        assert!(response.response_text.is_empty());
        assert_eq!(response.response_type, "error");
        assert_eq!(response.error.as_deref(), Some("model unavailable"));
    }

    #[test]
    fn test_premature_scaffold_has_three_questions() {
        let scaffold = premature_example_scaffold("adaptive reuse", "community center");
        assert_eq!(scaffold.matches('?').count(), 3);
        assert!(scaffold.contains("1."));
        assert!(scaffold.contains("2."));
        assert!(scaffold.contains("3."));
        // It never names a project.
        assert!(!scaffold.contains("Tate"));
    }
}
