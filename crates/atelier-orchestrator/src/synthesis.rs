//! Response synthesis: per-route composition and metadata assembly.

use crate::agents::{
    AgentResponse, AnalysisAgent, CognitiveEnhancementAgent, DomainExpertAgent,
    EnhancementMetrics, SocraticTutorAgent,
};
use crate::classification::CoreClassification;
use crate::knowledge::PassageMetadata;
use crate::routing::RouteType;
use crate::state::WorkflowState;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Marker prepended to the milestone question suffix.
const MILESTONE_MARKER: &str = "\n\n🎯 Milestone Question: ";

/// Fallback when a Socratic path produced nothing.
const SOCRATIC_FALLBACK: &str = "I'd be happy to help you explore this topic together. \
                                 What specific aspects would you like to think about?";

/// Fallback when an intervention path produced nothing.
const INTERVENTION_FALLBACK: &str = "I notice you're asking for specific answers early in \
                                     your design process. Let's explore this together instead.";

/// Fallback when no agent produced anything at all.
const GENERIC_FALLBACK: &str = "I'd be happy to help you with your architectural project. \
                                What specific aspect would you like to explore?";

/// Metadata assembled alongside the final response text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Composition type actually used.
    pub response_type: String,
    /// Agents whose text contributed to the final response.
    pub agents_used: Vec<String>,
    /// The route that was executed.
    pub routing_path: String,
    /// The router's reasoning.
    pub routing_reason: String,
    /// The analysis agent's phase reading, when it ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_analysis: Option<serde_json::Value>,
    /// Enhancement metrics averaged across contributing agents.
    pub enhancement_metrics: EnhancementMetrics,
    /// Union of cognitive flags across agents.
    pub cognitive_state: Vec<String>,
    /// Sources cited by the contributing agents.
    pub sources: Vec<PassageMetadata>,
    /// Turn wall-clock, in seconds.
    pub processing_time: f64,
    /// Classification of the input that produced this response.
    pub classification: CoreClassification,
    /// Errors trapped during the turn.
    pub errors: Vec<String>,
}

/// The response synthesizer.
pub struct Synthesizer {
    show_scientific_metrics: bool,
    max_response_words: usize,
}

impl Synthesizer {
    /// Creates a synthesizer with the given composition options.
    #[must_use]
    pub fn new(show_scientific_metrics: bool, max_response_words: usize) -> Self {
        Self { show_scientific_metrics, max_response_words }
    }

    /// Composes the final response and its metadata.
    ///
    /// Always returns non-empty text; every failure path degrades to a
    /// fallback prompt.
    #[must_use]
    pub fn compose(
        &self,
        workflow: &WorkflowState,
        pending_milestone_question: Option<&str>,
        processing_time: f64,
        errors: Vec<String>,
    ) -> (String, ResponseMetadata) {
        let route =
            workflow.routing_decision.as_ref().map_or(RouteType::Default, |d| d.route);
        let technical = workflow
            .classification
            .as_ref()
            .is_some_and(|c| c.is_technical_question);

        let (mut text, response_type, contributors) = self.compose_route(workflow, route, technical);

        if text.trim().is_empty() {
            text = GENERIC_FALLBACK.to_string();
        }

        // Milestone question, when the route leaves room for one.
        // Interventions, clarifications, and scaffolding already end on a
        // single question; piling a milestone question on top dilutes them.
        let appendable = !matches!(
            route,
            RouteType::CognitiveIntervention
                | RouteType::CognitiveChallenge
                | RouteType::SocraticClarification
                | RouteType::SupportiveScaffolding
                | RouteType::FoundationalBuilding
        ) && !(route == RouteType::KnowledgeOnly && technical);
        if appendable {
            if let Some(question) = pending_milestone_question {
                if !question.is_empty() && word_count(&text) < self.max_response_words {
                    text.push_str(MILESTONE_MARKER);
                    text.push_str(question);
                }
            }
        }

        let contributing: Vec<&AgentResponse> = contributors
            .iter()
            .filter_map(|name| workflow.agent_result(name))
            .filter(|r| r.error.is_none())
            .collect();

        let enhancement_metrics =
            EnhancementMetrics::average(contributing.iter().map(|r| &r.enhancement_metrics));

        // Opt-in cognitive assessment block; omitted by default.
        if (self.show_scientific_metrics || workflow.state.show_scientific_metrics)
            && !contributing.is_empty()
        {
            text.push_str(&format!(
                "\n\n---\nCognitive assessment: overall {:.2} (offloading prevention {:.2}, \
                 deep thinking {:.2}, knowledge integration {:.2}, scaffolding {:.2}, \
                 metacognition {:.2}, progression {:.2})",
                enhancement_metrics.overall_cognitive_score,
                enhancement_metrics.cognitive_offloading_prevention,
                enhancement_metrics.deep_thinking_engagement,
                enhancement_metrics.knowledge_integration,
                enhancement_metrics.scaffolding_effectiveness,
                enhancement_metrics.metacognitive_awareness,
                enhancement_metrics.learning_progression,
            ));
        }

        text = self.soft_cap(text);

        let cognitive_state: Vec<String> = {
            let mut flags: Vec<String> = contributing
                .iter()
                .flat_map(|r| r.cognitive_flags.iter().map(|f| f.as_str().to_string()))
                .collect();
            flags.sort();
            flags.dedup();
            flags
        };

        let sources: Vec<PassageMetadata> = contributing
            .iter()
            .flat_map(|r| r.sources_used.iter().cloned())
            .collect();

        let phase_analysis = workflow
            .agent_result(AnalysisAgent::NAME)
            .and_then(|r| r.metadata.get("phase_analysis").cloned());

        let metadata = ResponseMetadata {
            response_type,
            agents_used: contributors
                .into_iter()
                .filter(|name| {
                    workflow.agent_result(name).is_some_and(|r| r.error.is_none())
                })
                .collect(),
            routing_path: route.as_str().to_string(),
            routing_reason: workflow
                .routing_decision
                .as_ref()
                .map_or_else(String::new, |d| d.reason.clone()),
            phase_analysis,
            enhancement_metrics,
            cognitive_state,
            sources,
            processing_time,
            classification: workflow.classification.clone().unwrap_or_default(),
            errors,
        };

        debug!(
            response_type = %metadata.response_type,
            route = %metadata.routing_path,
            agents = ?metadata.agents_used,
            "response synthesized"
        );

        (text, metadata)
    }

    /// The per-route composition table.
    fn compose_route(
        &self,
        workflow: &WorkflowState,
        route: RouteType,
        technical: bool,
    ) -> (String, String, Vec<String>) {
        let domain = non_empty(workflow, DomainExpertAgent::NAME);
        let socratic = non_empty(workflow, SocraticTutorAgent::NAME);
        let cognitive = non_empty(workflow, CognitiveEnhancementAgent::NAME);

        match route {
            RouteType::ProgressiveOpening | RouteType::TopicTransition => {
                match &workflow.final_response {
                    Some(text) if !text.is_empty() => {
                        (text.clone(), "progressive_opening".to_string(), Vec::new())
                    }
                    _ => self.default_composition(domain, socratic, cognitive),
                }
            }
            RouteType::KnowledgeOnly if technical => (
                domain.clone().unwrap_or_default(),
                "technical".to_string(),
                vec![DomainExpertAgent::NAME.to_string()],
            ),
            RouteType::KnowledgeOnly => match (&domain, &socratic) {
                (Some(d), Some(s)) => (
                    format!("{d}\n\n{s}"),
                    "knowledge_with_socratic".to_string(),
                    vec![
                        DomainExpertAgent::NAME.to_string(),
                        SocraticTutorAgent::NAME.to_string(),
                    ],
                ),
                (Some(d), None) => (
                    d.clone(),
                    "knowledge_only".to_string(),
                    vec![DomainExpertAgent::NAME.to_string()],
                ),
                _ => (GENERIC_FALLBACK.to_string(), "fallback".to_string(), Vec::new()),
            },
            RouteType::SocraticExploration
            | RouteType::SocraticFocus
            | RouteType::SocraticClarification
            | RouteType::FoundationalBuilding
            | RouteType::SupportiveScaffolding
            | RouteType::DesignGuidance => match socratic {
                Some(s) => (
                    s,
                    "socratic_guidance".to_string(),
                    vec![SocraticTutorAgent::NAME.to_string()],
                ),
                None => (SOCRATIC_FALLBACK.to_string(), "fallback".to_string(), Vec::new()),
            },
            RouteType::CognitiveIntervention | RouteType::CognitiveChallenge => match cognitive {
                Some(c) => (
                    c,
                    "cognitive_intervention".to_string(),
                    vec![CognitiveEnhancementAgent::NAME.to_string()],
                ),
                None => (INTERVENTION_FALLBACK.to_string(), "fallback".to_string(), Vec::new()),
            },
            RouteType::KnowledgeWithChallenge => {
                let mut parts = Vec::new();
                let mut used = Vec::new();
                if let Some(d) = &domain {
                    parts.push(d.clone());
                    used.push(DomainExpertAgent::NAME.to_string());
                }
                if let Some(s) = &socratic {
                    parts.push(s.clone());
                    used.push(SocraticTutorAgent::NAME.to_string());
                }
                if let Some(c) = &cognitive {
                    parts.push(c.clone());
                    used.push(CognitiveEnhancementAgent::NAME.to_string());
                }
                if parts.is_empty() {
                    (GENERIC_FALLBACK.to_string(), "fallback".to_string(), Vec::new())
                } else {
                    (parts.join("\n\n"), "knowledge_with_challenge".to_string(), used)
                }
            }
            RouteType::MultiAgentComprehensive | RouteType::BalancedGuidance | RouteType::Default => {
                self.default_composition(domain, socratic, cognitive)
            }
        }
    }

    fn default_composition(
        &self,
        domain: Option<String>,
        socratic: Option<String>,
        cognitive: Option<String>,
    ) -> (String, String, Vec<String>) {
        match (domain, socratic, cognitive) {
            (Some(d), Some(s), _) => (
                format!("{d}\n\n{s}"),
                "multi_agent_synthesis".to_string(),
                vec![
                    DomainExpertAgent::NAME.to_string(),
                    SocraticTutorAgent::NAME.to_string(),
                ],
            ),
            (Some(d), None, _) => (
                d,
                "domain_knowledge".to_string(),
                vec![DomainExpertAgent::NAME.to_string()],
            ),
            (None, Some(s), _) => (
                s,
                "socratic_guidance".to_string(),
                vec![SocraticTutorAgent::NAME.to_string()],
            ),
            (None, None, Some(c)) => (
                c,
                "cognitive_enhancement".to_string(),
                vec![CognitiveEnhancementAgent::NAME.to_string()],
            ),
            (None, None, None) => {
                (GENERIC_FALLBACK.to_string(), "fallback".to_string(), Vec::new())
            }
        }
    }

    /// Soft word cap: trim at the last sentence boundary under the budget.
    fn soft_cap(&self, text: String) -> String {
        if word_count(&text) <= self.max_response_words {
            return text;
        }
        let words: Vec<&str> = text.split_whitespace().collect();
        let head = words[..self.max_response_words].join(" ");
        match head.rfind(['.', '?', '!']) {
            Some(pos) if pos > head.len() / 2 => head[..=pos].to_string(),
            _ => head,
        }
    }
}

fn non_empty(workflow: &WorkflowState, agent: &str) -> Option<String> {
    workflow
        .agent_result(agent)
        .filter(|r| r.error.is_none() && !r.response_text.trim().is_empty())
        .map(|r| r.response_text.clone())
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
