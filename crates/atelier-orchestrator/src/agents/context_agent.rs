//! Context agent: classification, analysis, and the per-turn package.
//!
//! Runs first on every turn and never blocks the pipeline; any sub-step
//! failure degrades to the fallback package.

use crate::classification::{
    ClassificationPipeline, ContentAnalyzer, ConversationPatternAnalyzer, InteractionType,
};
use crate::context::{generate_metadata, ContextPackage, RoutingSuggestions};
use crate::state::ConversationState;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Building types the tutor recognizes in briefs and conversation.
const BUILDING_TYPES: &[(&str, &str)] = &[
    ("community center", "community_center"),
    ("community centre", "community_center"),
    ("museum", "museum"),
    ("library", "library"),
    ("school", "school"),
    ("housing", "housing"),
    ("residential", "housing"),
    ("office", "office"),
    ("gallery", "gallery"),
    ("theater", "theater"),
    ("theatre", "theater"),
    ("pavilion", "pavilion"),
    ("market", "market"),
];

/// Extracts the project's building type from the brief and conversation,
/// defaulting to "project".
#[must_use]
pub fn extract_building_type(state: &ConversationState) -> String {
    let mut haystack = state.current_design_brief.to_lowercase();
    for message in state.user_messages() {
        haystack.push(' ');
        haystack.push_str(&message.content.to_lowercase());
    }
    BUILDING_TYPES
        .iter()
        .find(|(marker, _)| haystack.contains(marker))
        .map_or_else(|| "project".to_string(), |(_, name)| (*name).to_string())
}

/// The context agent.
pub struct ContextAgent {
    pipeline: ClassificationPipeline,
    content: ContentAnalyzer,
    patterns: ConversationPatternAnalyzer,
}

impl ContextAgent {
    /// Agent name as recorded in metadata.
    pub const NAME: &'static str = "context_agent";

    /// Creates the agent over the classification pipeline.
    #[must_use]
    pub fn new(pipeline: ClassificationPipeline) -> Self {
        Self {
            pipeline,
            content: ContentAnalyzer::new(),
            patterns: ConversationPatternAnalyzer::new(),
        }
    }

    /// Builds the per-turn context package. Infallible: every sub-step
    /// failure falls back rather than erroring.
    pub async fn analyze(&self, state: &ConversationState, input: &str) -> ContextPackage {
        let classification = self.pipeline.classify(state, input).await;
        let content_analysis = self.content.analyze(input);
        let conversation_patterns = self.patterns.analyze(state);
        let metadata =
            generate_metadata(&classification, &content_analysis, &conversation_patterns);
        let routing_suggestions = suggest_route(&classification, metadata.challenge_readiness);

        let mut agent_shards = HashMap::new();
        let building_type = extract_building_type(state);
        let topic = content_analysis
            .key_topics
            .first()
            .cloned()
            .unwrap_or_else(|| "design approach".to_string());
        insert_shard(
            &mut agent_shards,
            "domain_expert",
            &serde_json::json!({ "topic": topic, "building_type": building_type }),
        );
        insert_shard(
            &mut agent_shards,
            "socratic_tutor",
            &serde_json::json!({ "focus_topic": topic }),
        );
        insert_shard(
            &mut agent_shards,
            "cognitive_enhancement",
            &serde_json::json!({ "skill_level": state.student_profile.skill_level }),
        );

        debug!(
            interaction_type = classification.interaction_type.as_str(),
            suggested_route = %routing_suggestions.primary_route,
            "context package built"
        );

        ContextPackage {
            classification,
            content_analysis,
            conversation_patterns,
            metadata,
            routing_suggestions,
            agent_shards,
        }
    }
}

fn insert_shard<T: Serialize>(
    shards: &mut HashMap<String, serde_json::Value>,
    agent: &str,
    value: &T,
) {
    match serde_json::to_value(value) {
        Ok(v) => {
            shards.insert(agent.to_string(), v);
        }
        Err(e) => warn!(agent, error = %e, "failed to serialize agent shard"),
    }
}

/// Maps the classification to a route suggestion for the router's rule 13.
fn suggest_route(
    classification: &crate::classification::CoreClassification,
    challenge_ready: bool,
) -> RoutingSuggestions {
    match classification.interaction_type {
        InteractionType::KnowledgeRequest if challenge_ready => RoutingSuggestions {
            primary_route: "knowledge_with_challenge".to_string(),
            confidence: 0.65,
            reasoning: vec!["knowledge request from a learner ready for a push".to_string()],
        },
        InteractionType::ImprovementSeeking => RoutingSuggestions {
            primary_route: "multi_agent_comprehensive".to_string(),
            confidence: 0.65,
            reasoning: vec!["improvement seeking benefits from the full pass".to_string()],
        },
        InteractionType::ProjectDescription => RoutingSuggestions {
            primary_route: "balanced_guidance".to_string(),
            confidence: 0.6,
            reasoning: vec!["project description; balance knowledge and questions".to_string()],
        },
        _ => RoutingSuggestions {
            primary_route: "default".to_string(),
            confidence: 0.4,
            reasoning: vec!["no strong signal".to_string()],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use crate::llm::LlmClient;
    use atelier_models::MockModel;
    use std::sync::Arc;

    fn agent() -> ContextAgent {
        let config = OrchestratorConfig::default();
        let llm = LlmClient::new(Arc::new(MockModel::new("mock-model".to_string())), &config);
        ContextAgent::new(ClassificationPipeline::new(llm, 0.2))
    }

    fn state() -> ConversationState {
        ConversationState::with_brief("Design a 2000 m2 community center.")
    }

    #[tokio::test]
    async fn test_package_carries_all_parts() {
        let mut s = state();
        s.add_user_message("Tell me about courtyard circulation");
        let package = agent().analyze(&s, "Tell me about courtyard circulation").await;

        assert_eq!(
            package.classification.interaction_type,
            InteractionType::KnowledgeRequest
        );
        assert!(package.agent_shards.contains_key("domain_expert"));
        assert!(package.agent_shards.contains_key("socratic_tutor"));
        assert!(package.agent_shards.contains_key("cognitive_enhancement"));
        let shard = &package.agent_shards["domain_expert"];
        assert_eq!(shard["building_type"], "community_center");
    }

    #[tokio::test]
    async fn test_knowledge_request_suggests_challenge_when_ready() {
        let mut s = state();
        s.add_user_message("Tell me about courtyard circulation");
        let package = agent().analyze(&s, "Tell me about courtyard circulation").await;
        if package.metadata.challenge_readiness {
            assert_eq!(package.routing_suggestions.primary_route, "knowledge_with_challenge");
            assert!(package.routing_suggestions.confidence >= 0.6);
        }
    }

    #[test]
    fn test_building_type_extraction() {
        assert_eq!(extract_building_type(&state()), "community_center");

        let mut other = ConversationState::with_brief("A small exhibition space.");
        assert_eq!(extract_building_type(&other), "project");
        other.add_user_message("It is becoming more of a museum really.");
        assert_eq!(extract_building_type(&other), "museum");
    }
}
