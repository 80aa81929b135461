//! Pedagogical multi-agent orchestrator for architectural design tutoring.
//!
//! A learner submits design briefs and conversational turns; the engine
//! classifies each input, routes it through a directed graph of reasoning
//! agents (context, analysis, domain expert, Socratic tutor, cognitive
//! enhancement), and synthesizes a response with cognitive-offloading
//! protection plus rich telemetry.
//!
//! The public surface is [`Orchestrator::process_student_input`]: one
//! invocation is one turn, run single-threaded and cooperative, and it
//! always emits a response; provider failures degrade to heuristic output,
//! never to an error page. Per-session serial execution is the caller's
//! contract: a [`ConversationState`] is never shared between concurrent
//! turns.

pub mod agents;
pub mod classification;
pub mod config;
pub mod context;
pub mod error;
pub mod first_response;
pub mod graph;
pub mod knowledge;
pub mod llm;
pub mod progression;
pub mod routing;
pub mod state;
pub mod synthesis;
pub mod telemetry;

pub use agents::{AgentResponse, CognitiveFlag, EnhancementMetrics, TutorAgent};
pub use classification::{ClassificationPipeline, CoreClassification, InteractionType};
pub use config::OrchestratorConfig;
pub use context::ContextPackage;
pub use error::{OrchestrationError, Result};
pub use graph::{GraphExecutor, GraphNode};
pub use knowledge::{
    InMemoryVectorStore, KnowledgeRetriever, VectorStore, WebSearchProvider,
};
pub use llm::LlmClient;
pub use progression::{MilestoneGuidance, ProgressionManager};
pub use routing::{RouteType, RoutingDecision, RoutingTree};
pub use state::{ConversationState, DesignPhase, Message, MessageRole, WorkflowState};
pub use synthesis::ResponseMetadata;

use agents::{
    AnalysisAgent, CognitiveEnhancementAgent, ContextAgent, DomainExpertAgent,
    SocraticTutorAgent,
};
use atelier_abstraction::Model;
use first_response::ProgressiveResponseGenerator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use synthesis::Synthesizer;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Progression facts surfaced with every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionSnapshot {
    /// Phase after the turn.
    pub phase: DesignPhase,
    /// Fraction of the phase's milestones complete.
    pub phase_progress: f64,
}

/// Everything one turn returns to the hosting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// The synthesized response text; never empty.
    pub response: String,
    /// Response metadata (see [`ResponseMetadata`]).
    pub metadata: ResponseMetadata,
    /// The route that was executed.
    pub routing_path: String,
    /// The full routing decision, including offloading detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_decision: Option<RoutingDecision>,
    /// Classification of the learner input.
    pub classification: CoreClassification,
    /// Progression facts after the turn.
    pub conversation_progression: ProgressionSnapshot,
    /// Milestone guidance the agents worked under, when one applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_guidance: Option<MilestoneGuidance>,
}

/// The tutoring orchestrator. Owns the agents and shared clients;
/// per-learner state stays with the caller.
pub struct Orchestrator {
    executor: GraphExecutor,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Wires an orchestrator over a model, a vector store, and an ordered
    /// list of web search providers.
    #[must_use]
    pub fn new(
        model: Arc<dyn Model>,
        store: Arc<dyn VectorStore>,
        web_providers: Vec<Arc<dyn WebSearchProvider>>,
        config: OrchestratorConfig,
    ) -> Self {
        let llm = LlmClient::new(model, &config);
        let pipeline =
            ClassificationPipeline::new(llm.clone(), config.classification_temperature());
        let retriever = KnowledgeRetriever::new(store, web_providers, config.search_timeout)
            .with_llm(llm.clone());

        let executor = GraphExecutor::new(
            ContextAgent::new(pipeline),
            AnalysisAgent::new(),
            DomainExpertAgent::new(retriever, llm.clone()),
            SocraticTutorAgent::new(llm.clone(), config.creative_temperature()),
            CognitiveEnhancementAgent::new(),
            RoutingTree::new(config.cooling_off_messages),
            ProgressionManager::new(
                config.phase_completion_threshold,
                config.criterion_coverage_threshold,
            ),
            ProgressiveResponseGenerator::new()
                .with_llm(llm, config.creative_temperature()),
            Synthesizer::new(config.show_scientific_metrics, config.max_response_words_budget),
        );

        Self { executor, config }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Processes the learner's latest input (already appended to `state`)
    /// and appends the tutor's response.
    ///
    /// # Errors
    /// Returns `TurnCancelled` only through
    /// [`Orchestrator::process_student_input_with_cancel`]; this entry
    /// cannot be cancelled and always produces a response.
    pub async fn process_student_input(
        &self,
        state: &mut ConversationState,
    ) -> Result<TurnOutcome> {
        self.process_student_input_with_cancel(state, &CancellationToken::new())
            .await
    }

    /// Cancellable variant of [`Orchestrator::process_student_input`].
    ///
    /// On cancellation the partial turn is discarded: `state` is untouched
    /// and no response is emitted.
    ///
    /// # Errors
    /// Returns `TurnCancelled` when the token fires at a node boundary.
    pub async fn process_student_input_with_cancel(
        &self,
        state: &mut ConversationState,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        let mut workflow = WorkflowState::new(state.clone());
        let telemetry = self.executor.run_turn(&mut workflow, cancel).await?;

        let response = workflow
            .final_response
            .clone()
            .unwrap_or_else(|| {
                "I'd be happy to help you with your architectural project. What specific \
                 aspect would you like to explore?"
                    .to_string()
            });
        let metadata = workflow.response_metadata.clone().unwrap_or_else(|| {
            // The synthesizer always sets metadata; this covers the type
            // system, not a real path.
            synthesis::Synthesizer::new(false, self.config.max_response_words_budget)
                .compose(&workflow, None, telemetry.elapsed_seconds(), Vec::new())
                .1
        });

        let outcome = TurnOutcome {
            response: response.clone(),
            routing_path: metadata.routing_path.clone(),
            routing_decision: workflow.routing_decision.clone(),
            classification: workflow.classification.clone().unwrap_or_default(),
            conversation_progression: ProgressionSnapshot {
                phase: workflow.state.design_phase,
                phase_progress: workflow.state.phase_progress,
            },
            milestone_guidance: workflow.milestone_guidance.clone(),
            metadata,
        };

        // Persist the evolved snapshot, then the response. Cancellation
        // never reaches this point, so partial turns are never persisted.
        *state = workflow.state;
        state.add_assistant_message(&response);

        if state.show_response_summary {
            info!(
                input = %workflow.last_message,
                response_type = %outcome.metadata.response_type,
                agents = ?outcome.metadata.agents_used,
                route = %outcome.routing_path,
                response_words = outcome.response.split_whitespace().count(),
                "turn summary"
            );
        }

        info!(
            route = %outcome.routing_path,
            interaction = outcome.classification.interaction_type.as_str(),
            phase = %outcome.conversation_progression.phase,
            "student input processed"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_models::MockModel;

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(
            Arc::new(MockModel::new("mock-model".to_string())),
            Arc::new(InMemoryVectorStore::new()),
            Vec::new(),
            OrchestratorConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_turn_appends_assistant_message() {
        let mut state = ConversationState::with_brief("Design a 2000 m2 community center.");
        state.add_user_message("I am designing a community center for my town.");

        let outcome = orchestrator().process_student_input(&mut state).await.unwrap();

        assert!(!outcome.response.is_empty());
        assert_eq!(
            state.last_assistant_message().map(|m| m.content.clone()),
            Some(outcome.response.clone())
        );
    }

    #[tokio::test]
    async fn test_cancelled_turn_leaves_state_untouched(){
        let mut state = ConversationState::with_brief("Design a 2000 m2 community center.");
        state.add_user_message("Tell me about circulation.");
        let before = state.clone();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = orchestrator()
            .process_student_input_with_cancel(&mut state, &cancel)
            .await;

        assert!(matches!(result, Err(OrchestrationError::TurnCancelled)));
        assert_eq!(state.messages, before.messages);
        assert_eq!(state.agent_context, before.agent_context);
    }

    #[tokio::test]
    async fn test_continuity_keys_persisted() {
        let mut state = ConversationState::with_brief("Design a 2000 m2 community center.");
        state.add_user_message("I am designing the circulation for my community center.");

        orchestrator().process_student_input(&mut state).await.unwrap();

        assert_eq!(state.context_str("last_topic"), Some("circulation"));
        assert!(state.context_str("last_route").is_some());
    }
}
