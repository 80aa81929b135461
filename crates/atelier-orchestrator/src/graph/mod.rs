//! The directed agent graph and its executor.
//!
//! Nodes run single-threaded and cooperative: each is awaited to completion
//! before the next, results land in `agent_results` in invocation order, and
//! a cancellation token is observed at every node boundary. Node failures
//! are trapped into error responses; only cancellation aborts the turn.

mod validator;

pub use validator::{Diagnostic, Severity, StateValidator};

use crate::agents::{
    AgentResponse, AnalysisAgent, CognitiveEnhancementAgent, ContextAgent, DomainExpertAgent,
    SocraticTutorAgent, TutorAgent,
};
use crate::classification::extract_topics;
use crate::error::{OrchestrationError, Result};
use crate::first_response::ProgressiveResponseGenerator;
use crate::progression::ProgressionManager;
use crate::routing::{RouteType, RoutingContext, RoutingTree};
use crate::state::WorkflowState;
use crate::synthesis::Synthesizer;
use crate::telemetry::TurnTelemetry;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Typed graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphNode {
    /// Classification and context packaging.
    ContextAgent,
    /// Route selection.
    Router,
    /// Phase and gap analysis.
    AnalysisAgent,
    /// Grounded knowledge.
    DomainExpert,
    /// Open questioning.
    SocraticTutor,
    /// Structured challenges.
    CognitiveEnhancement,
    /// Response composition.
    Synthesizer,
    /// Terminal.
    End,
}

impl GraphNode {
    /// Stable string form used in telemetry and diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GraphNode::ContextAgent => "context_agent",
            GraphNode::Router => "router",
            GraphNode::AnalysisAgent => "analysis_agent",
            GraphNode::DomainExpert => "domain_expert",
            GraphNode::SocraticTutor => "socratic_tutor",
            GraphNode::CognitiveEnhancement => "cognitive_enhancement",
            GraphNode::Synthesizer => "synthesizer",
            GraphNode::End => "end",
        }
    }
}

/// The agent nodes a route dispatches to, in execution order. The
/// `after_analysis`, `after_domain_expert`, and `after_socratic` predicates
/// of the graph are folded into this table.
#[must_use]
pub fn node_sequence(route: RouteType, technical: bool) -> Vec<GraphNode> {
    match route {
        // The context node already produced the final response.
        RouteType::ProgressiveOpening | RouteType::TopicTransition => Vec::new(),
        RouteType::CognitiveIntervention | RouteType::CognitiveChallenge => {
            vec![GraphNode::CognitiveEnhancement]
        }
        RouteType::SocraticExploration
        | RouteType::DesignGuidance
        | RouteType::SocraticClarification
        | RouteType::SupportiveScaffolding
        | RouteType::SocraticFocus
        | RouteType::FoundationalBuilding => vec![GraphNode::SocraticTutor],
        RouteType::MultiAgentComprehensive => vec![
            GraphNode::AnalysisAgent,
            GraphNode::DomainExpert,
            GraphNode::SocraticTutor,
            GraphNode::CognitiveEnhancement,
        ],
        RouteType::BalancedGuidance | RouteType::Default => vec![
            GraphNode::AnalysisAgent,
            GraphNode::DomainExpert,
            GraphNode::SocraticTutor,
        ],
        RouteType::KnowledgeWithChallenge => vec![
            GraphNode::DomainExpert,
            GraphNode::SocraticTutor,
            GraphNode::CognitiveEnhancement,
        ],
        // A technical answer is served verbatim; questioning it helps nobody.
        RouteType::KnowledgeOnly if technical => vec![GraphNode::DomainExpert],
        RouteType::KnowledgeOnly => vec![GraphNode::DomainExpert, GraphNode::SocraticTutor],
    }
}

/// The graph executor: owns the agents and runs one turn at a time.
pub struct GraphExecutor {
    context_agent: ContextAgent,
    analysis_agent: AnalysisAgent,
    domain_expert: DomainExpertAgent,
    socratic_tutor: SocraticTutorAgent,
    cognitive_enhancement: CognitiveEnhancementAgent,
    routing_tree: RoutingTree,
    progression: ProgressionManager,
    first_response: ProgressiveResponseGenerator,
    synthesizer: Synthesizer,
}

impl GraphExecutor {
    /// Wires the executor from its parts.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        context_agent: ContextAgent,
        analysis_agent: AnalysisAgent,
        domain_expert: DomainExpertAgent,
        socratic_tutor: SocraticTutorAgent,
        cognitive_enhancement: CognitiveEnhancementAgent,
        routing_tree: RoutingTree,
        progression: ProgressionManager,
        first_response: ProgressiveResponseGenerator,
        synthesizer: Synthesizer,
    ) -> Self {
        Self {
            context_agent,
            analysis_agent,
            domain_expert,
            socratic_tutor,
            cognitive_enhancement,
            routing_tree,
            progression,
            first_response,
            synthesizer,
        }
    }

    /// Runs one turn through the graph, leaving the final response and
    /// metadata on the workflow.
    ///
    /// # Errors
    /// Returns `TurnCancelled` when the token fires at a node boundary;
    /// every other failure is trapped and the turn completes.
    pub async fn run_turn(
        &self,
        workflow: &mut WorkflowState,
        cancel: &CancellationToken,
    ) -> Result<TurnTelemetry> {
        let mut telemetry = TurnTelemetry::new();
        let mut validator = StateValidator::new(workflow);
        let mut errors: Vec<String> = Vec::new();

        validator.check(workflow, "entry");

        // Node: context agent.
        self.ensure_live(cancel)?;
        let node_start = Instant::now();
        self.run_context_node(workflow).await;
        validator.check(workflow, GraphNode::ContextAgent.as_str());
        telemetry.record_node(GraphNode::ContextAgent.as_str(), node_start);

        // Node: router.
        self.ensure_live(cancel)?;
        let node_start = Instant::now();
        let route = self.run_router_node(workflow).await;
        validator.check(workflow, GraphNode::Router.as_str());
        telemetry.record_node(GraphNode::Router.as_str(), node_start);

        // Conditional dispatch.
        let technical = workflow
            .classification
            .as_ref()
            .is_some_and(|c| c.is_technical_question);
        for node in node_sequence(route, technical) {
            self.ensure_live(cancel)?;
            validator.check(workflow, node.as_str());
            let node_start = Instant::now();

            let agent: &dyn TutorAgent = match node {
                GraphNode::AnalysisAgent => &self.analysis_agent,
                GraphNode::DomainExpert => &self.domain_expert,
                GraphNode::SocraticTutor => &self.socratic_tutor,
                GraphNode::CognitiveEnhancement => &self.cognitive_enhancement,
                _ => continue,
            };

            match agent.process(workflow).await {
                Ok(response) => workflow.record_agent_result(agent.name(), response),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(node = node.as_str(), error = %e, "agent failed; trapping");
                    telemetry.counters.agent_errors += 1;
                    errors.push(format!("{}: {e}", node.as_str()));
                    workflow
                        .record_agent_result(agent.name(), AgentResponse::from_error(e.to_string()));
                }
            }

            validator.check(workflow, node.as_str());
            telemetry.record_node(node.as_str(), node_start);
        }

        // Node: synthesizer.
        self.ensure_live(cancel)?;
        validator.check(workflow, GraphNode::Synthesizer.as_str());
        let node_start = Instant::now();
        let pending_question = workflow
            .milestone_guidance
            .as_ref()
            .map(|g| g.guiding_question.clone())
            .filter(|q| !q.is_empty());
        telemetry.counters.validation_warnings = validator.diagnostics().len();
        let (text, mut metadata) = self.synthesizer.compose(
            workflow,
            pending_question.as_deref(),
            telemetry.elapsed_seconds(),
            errors,
        );
        metadata.processing_time = telemetry.elapsed_seconds();
        workflow.final_response = Some(text);
        workflow.response_metadata = Some(metadata);
        telemetry.record_node(GraphNode::Synthesizer.as_str(), node_start);

        // Inter-turn continuity lives in the scratchpad.
        let topic = extract_topics(&workflow.last_message.to_lowercase())
            .into_iter()
            .next();
        if let Some(topic) = topic {
            workflow.state.set_context("last_topic", serde_json::json!(topic));
        }
        workflow
            .state
            .set_context("last_route", serde_json::json!(route.as_str()));

        info!(
            turn_id = %telemetry.turn_id,
            route = %route,
            nodes = telemetry.counters.nodes_executed,
            errors = telemetry.counters.agent_errors,
            elapsed_s = telemetry.elapsed_seconds(),
            "turn complete"
        );
        Ok(telemetry)
    }

    fn ensure_live(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(OrchestrationError::TurnCancelled);
        }
        Ok(())
    }

    /// The context node: progression bookkeeping plus the context package.
    async fn run_context_node(&self, workflow: &mut WorkflowState) {
        let input = workflow.last_message.clone();
        let user_count = workflow.state.user_message_count();

        if user_count <= 1 {
            let analysis = self.progression.analyze_first_message(&input);
            debug!(phase_label = %analysis.phase_label, "first message analyzed");
            // Only overwrite a default profile; a host-provided one wins.
            if workflow.state.student_profile == crate::state::StudentProfile::default() {
                workflow.state.student_profile = analysis.user_profile;
            }
        } else {
            let last_assistant = workflow
                .state
                .last_assistant_message()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            let update = self.progression.progress(&mut workflow.state, &input, &last_assistant);
            debug!(
                phase = %update.phase,
                progress = update.milestone_progress,
                transitioned = update.phase_transitioned,
                "progression updated"
            );
        }

        workflow.milestone_guidance =
            Some(self.progression.get_milestone_driven_agent_guidance(&workflow.state, &input));

        let package = self.context_agent.analyze(&workflow.state, &input).await;
        workflow.classification = Some(package.classification.clone());
        workflow.context_package = Some(package);
    }

    /// The router node: decide the route, and prepare the progressive
    /// response for the paths that bypass the agents.
    async fn run_router_node(&self, workflow: &mut WorkflowState) -> RouteType {
        let decision = {
            let package = workflow.context_package.as_ref();
            let fallback = crate::context::ContextPackage::fallback();
            let package = package.unwrap_or(&fallback);
            let ctx = RoutingContext {
                classification: &package.classification,
                content: &package.content_analysis,
                patterns: &package.conversation_patterns,
                metadata: &package.metadata,
                suggestions: &package.routing_suggestions,
                state: &workflow.state,
                input: &workflow.last_message,
            };
            self.routing_tree.decide(&ctx)
        };

        let route = decision.route;
        workflow.routing_decision = Some(decision);

        match route {
            RouteType::ProgressiveOpening => {
                let text = self
                    .first_response
                    .opening(&workflow.state, &workflow.last_message)
                    .await;
                workflow.final_response = Some(text);
            }
            RouteType::TopicTransition => {
                let previous = workflow
                    .state
                    .context_str("last_topic")
                    .unwrap_or("your earlier focus")
                    .to_string();
                let text = self
                    .first_response
                    .topic_transition(&previous, &workflow.last_message);
                workflow.final_response = Some(text);
            }
            _ => {}
        }

        route
    }
}
