//! Analysis agent: phase reading, knowledge-gap detection, milestone
//! integration.

use super::{AgentResponse, CognitiveFlag, EnhancementMetrics, TutorAgent};
use crate::error::OrchestrationError;
use crate::state::{DesignPhase, WorkflowState};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Phase signal words, per phase.
const IDEATION_MARKERS: &[&str] =
    &["concept", "idea", "brief", "users", "site", "parti", "problem", "goal"];
const VISUALIZATION_MARKERS: &[&str] =
    &["plan", "section", "massing", "form", "layout", "circulation", "space", "sketch"];
const MATERIALIZATION_MARKERS: &[&str] =
    &["material", "detail", "structure", "construction", "system", "assembly", "code"];

/// The analysis agent's reading of which phase the learner is working in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseAnalysis {
    /// The phase the conversation evidence points to.
    pub phase: DesignPhase,
    /// Confidence in the reading, in [0,1].
    pub confidence: f64,
    /// The signals that produced it.
    pub indicators: Vec<String>,
}

/// The analysis agent.
#[derive(Debug, Default)]
pub struct AnalysisAgent;

impl AnalysisAgent {
    /// Agent name as recorded in `agent_results`.
    pub const NAME: &'static str = "analysis_agent";

    /// Creates the agent.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn phase_analysis(input: &str, current: DesignPhase) -> PhaseAnalysis {
        let lower = input.to_lowercase();
        let scores = [
            (DesignPhase::Ideation, count_hits(&lower, IDEATION_MARKERS)),
            (DesignPhase::Visualization, count_hits(&lower, VISUALIZATION_MARKERS)),
            (DesignPhase::Materialization, count_hits(&lower, MATERIALIZATION_MARKERS)),
        ];
        let (phase, hits) = scores
            .iter()
            .max_by_key(|(_, hits)| *hits)
            .copied()
            .unwrap_or((current, 0));

        if hits == 0 {
            // No signal in the input; trust the state machine.
            return PhaseAnalysis { phase: current, confidence: 0.4, indicators: Vec::new() };
        }

        let indicators = phase_markers(phase)
            .iter()
            .filter(|m| lower.contains(*m))
            .map(|m| (*m).to_string())
            .collect();
        PhaseAnalysis {
            phase,
            confidence: (0.4 + hits as f64 * 0.15).min(0.95),
            indicators,
        }
    }
}

fn phase_markers(phase: DesignPhase) -> &'static [&'static str] {
    match phase {
        DesignPhase::Ideation => IDEATION_MARKERS,
        DesignPhase::Visualization => VISUALIZATION_MARKERS,
        DesignPhase::Materialization => MATERIALIZATION_MARKERS,
    }
}

fn count_hits(lower: &str, markers: &[&str]) -> usize {
    markers.iter().filter(|m| lower.contains(*m)).count()
}

/// Derives the primary knowledge gap from the first cognitive flag,
/// stripping `needs_` and `_guidance` affixes; defaults to
/// `brief_development`.
#[must_use]
pub fn primary_knowledge_gap(flags: &std::collections::BTreeSet<CognitiveFlag>) -> String {
    flags.iter().next().map_or_else(
        || "brief_development".to_string(),
        |flag| {
            flag.as_str()
                .trim_start_matches("needs_")
                .trim_end_matches("_guidance")
                .to_string()
        },
    )
}

#[async_trait]
impl TutorAgent for AnalysisAgent {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn process(
        &self,
        workflow: &WorkflowState,
    ) -> Result<AgentResponse, OrchestrationError> {
        let package = workflow.context_package.as_ref();
        let phase_analysis =
            Self::phase_analysis(&workflow.last_message, workflow.state.design_phase);

        let mut response = AgentResponse::text(String::new(), "analysis");

        // Flags mirror what the context signals say the learner needs.
        if let Some(package) = package {
            if package.metadata.explanation_need {
                response.cognitive_flags.insert(CognitiveFlag::NeedsEncouragement);
                response.cognitive_flags.insert(CognitiveFlag::ScaffoldingProvided);
            }
            if package.metadata.challenge_readiness {
                response.cognitive_flags.insert(CognitiveFlag::ChallengeAppropriate);
            }
            if !package.content_analysis.key_topics.is_empty() {
                response.cognitive_flags.insert(CognitiveFlag::LearningProgression);
            }
        }

        let primary_gap = primary_knowledge_gap(&response.cognitive_flags);

        response.metadata.insert(
            "phase_analysis".to_string(),
            serde_json::to_value(&phase_analysis)?,
        );
        response
            .metadata
            .insert("primary_gap".to_string(), serde_json::json!(primary_gap));
        if let Some(guidance) = &workflow.milestone_guidance {
            response
                .metadata
                .insert("milestone_guidance".to_string(), serde_json::to_value(guidance)?);
        }
        // Upstream sketch analysis passes through untouched.
        if let Some(visual) = workflow.state.agent_context.get("visual_analysis") {
            response.metadata.insert("visual_analysis".to_string(), visual.clone());
        }

        response.enhancement_metrics =
            EnhancementMetrics::new(0.5, 0.6, 0.6, 0.5, 0.6, 0.6, phase_analysis.confidence);

        debug!(
            phase = %phase_analysis.phase,
            confidence = phase_analysis.confidence,
            primary_gap = %primary_gap,
            "analysis complete"
        );

        Ok(response)
    }
}
