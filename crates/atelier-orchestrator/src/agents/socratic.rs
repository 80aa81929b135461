//! Socratic tutor agent: open-ended questions tuned to the learner.

use super::{AgentResponse, CognitiveFlag, EnhancementMetrics, TutorAgent};
use crate::classification::{ConfidenceLevel, UnderstandingLevel};
use crate::error::OrchestrationError;
use crate::llm::LlmClient;
use crate::routing::RouteType;
use crate::state::WorkflowState;
use async_trait::async_trait;
use tracing::debug;

/// Concept glossary for clarifying responses to confusion. Short, concrete,
/// free of jargon.
const CONCEPT_GLOSSARY: &[(&str, &str)] = &[
    (
        "spatial organization",
        "Spatial organization means how the rooms and open areas of a building are \
         arranged relative to each other: what sits next to what, what you pass through \
         to reach what, and which spaces dominate.",
    ),
    (
        "circulation",
        "Circulation is the system of paths people use to move through a building: \
         corridors, stairs, lobbies, and the sequence in which they connect.",
    ),
    (
        "massing",
        "Massing is the overall three-dimensional bulk of a building: how its volumes \
         stack, step, and sit on the site before any detail is drawn.",
    ),
    (
        "parti",
        "A parti is the single organizing idea behind a design, the one-line diagram \
         the whole scheme answers to.",
    ),
    (
        "datum",
        "A datum is a reference element, like a wall, slab, or axis, that other parts \
         of the composition line up against.",
    ),
    (
        "program",
        "The program is the list of uses and spaces a building must provide, with their \
         sizes and relationships.",
    ),
];

/// Nouns worth anchoring a question to, checked in input order.
const SALIENT_TERMS: &[&str] = &[
    "courtyard",
    "atrium",
    "facade",
    "entrance",
    "lobby",
    "stair",
    "roof",
    "circulation",
    "massing",
    "daylight",
    "lighting",
    "structure",
    "material",
    "program",
    "site",
    "section",
    "plan",
];

/// The Socratic tutor agent.
pub struct SocraticTutorAgent {
    llm: LlmClient,
    creative_temperature: f32,
}

impl SocraticTutorAgent {
    /// Agent name as recorded in `agent_results`.
    pub const NAME: &'static str = "socratic_tutor";

    /// Creates the agent over the shared LLM client.
    #[must_use]
    pub fn new(llm: LlmClient, creative_temperature: f32) -> Self {
        Self { llm, creative_temperature }
    }

    /// Salient subjects of the input, in order of appearance, at most two.
    fn salient_subjects(input: &str) -> Vec<&'static str> {
        let lower = input.to_lowercase();
        let mut found: Vec<(usize, &'static str)> = SALIENT_TERMS
            .iter()
            .filter_map(|term| lower.find(term).map(|pos| (pos, *term)))
            .collect();
        found.sort_by_key(|(pos, _)| *pos);
        found.into_iter().map(|(_, term)| term).take(2).collect()
    }

    /// A definition plus exactly one clarifying question, for confusion.
    fn clarifying_response(input: &str) -> String {
        let lower = input.to_lowercase();
        let definition = CONCEPT_GLOSSARY
            .iter()
            .find(|(concept, _)| lower.contains(concept))
            .map_or_else(
                || {
                    "Let's slow down and name the idea precisely before building on it."
                        .to_string()
                },
                |(_, definition)| (*definition).to_string(),
            );
        let subject = Self::salient_subjects(input)
            .first()
            .copied()
            .unwrap_or("your project");
        format!(
            "{definition}\n\nWhich part of {subject} would you like to look at together first?"
        )
    }

    /// Template questions tuned to the learner's levels.
    fn template_questions(
        subjects: &[&str],
        understanding: UnderstandingLevel,
        confidence: ConfidenceLevel,
        question_count: usize,
    ) -> String {
        let first = subjects.first().copied().unwrap_or("your current design move");
        let second = subjects.get(1).copied().unwrap_or(first);

        let q1 = match (confidence, understanding) {
            (ConfidenceLevel::Overconfident, _) => format!(
                "What evidence would convince you that your approach to the {first} \
                 doesn't work for its least typical user?"
            ),
            (ConfidenceLevel::Uncertain, _) => format!(
                "What is one thing about the {first} you already feel sure of, and what \
                 makes you sure?"
            ),
            (_, UnderstandingLevel::Low) => format!(
                "When you picture the {first}, what do you see people actually doing there?"
            ),
            (_, UnderstandingLevel::High) => format!(
                "What would your scheme lose if you inverted your strategy for the {first}?"
            ),
            _ => format!(
                "What is the {first} doing for your scheme beyond solving the immediate \
                 problem?"
            ),
        };

        if question_count < 2 {
            return q1;
        }

        let q2 = if second == first {
            format!(
                "And if the {first} had to work twice as hard, say for double the \
                 visitors, what would you change first?"
            )
        } else {
            format!(
                "How does your thinking about the {first} change when you bring the \
                 {second} into the picture?"
            )
        };

        format!("{q1}\n\n{q2}")
    }

    /// Questions that interrogate the examples the domain expert just gave.
    fn questions_about_examples(subjects: &[&str]) -> String {
        let subject = subjects.first().copied().unwrap_or("your project");
        format!(
            "Looking at the precedents above, which one comes closest to what you want \
             for the {subject}, and what did its architects give up to get there?\n\n\
             What would you have to change about it before it belonged to your project?"
        )
    }

    /// Accepts LLM output only when it looks like 1-2 real questions.
    fn acceptable(text: &str, expected_questions: usize) -> bool {
        let questions = text.matches('?').count();
        let words = text.split_whitespace().count();
        questions >= 1 && questions <= expected_questions + 1 && words < 140
    }
}

#[async_trait]
impl TutorAgent for SocraticTutorAgent {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn process(
        &self,
        workflow: &WorkflowState,
    ) -> Result<AgentResponse, OrchestrationError> {
        let package = workflow.context_package.as_ref();
        let classification = package.map(|p| &p.classification);
        let route = workflow.routing_decision.as_ref().map(|d| d.route);
        let subjects = Self::salient_subjects(&workflow.last_message);

        let understanding = classification
            .map_or(UnderstandingLevel::Medium, |c| c.understanding_level);
        let confidence = classification.map_or(ConfidenceLevel::Confident, |c| c.confidence_level);
        let shows_confusion = classification.is_some_and(|c| c.shows_confusion);

        // Confusion gets a definition and exactly one clarifying question;
        // no generation roulette on a struggling learner.
        if shows_confusion
            || matches!(
                route,
                Some(RouteType::SupportiveScaffolding | RouteType::FoundationalBuilding)
            )
        {
            let response = AgentResponse::text(
                Self::clarifying_response(&workflow.last_message),
                "clarifying_question",
            )
            .with_flag(CognitiveFlag::ScaffoldingProvided)
            .with_flag(CognitiveFlag::NeedsEncouragement)
            .with_metrics(EnhancementMetrics::new(0.6, 0.6, 0.4, 0.9, 0.6, 0.6, 0.8));
            return Ok(response);
        }

        let followed_domain_expert = workflow
            .agent_result(super::DomainExpertAgent::NAME)
            .is_some_and(|r| r.error.is_none() && !r.response_text.is_empty());

        let expected_questions = 2;
        let template = if followed_domain_expert {
            Self::questions_about_examples(&subjects)
        } else {
            Self::template_questions(&subjects, understanding, confidence, expected_questions)
        };

        // Let the model phrase the questions in its own voice, but only
        // keep output that still reads as one or two open questions.
        let milestone_focus = workflow
            .milestone_guidance
            .as_ref()
            .map(|g| g.agent_guidance.clone())
            .unwrap_or_default();
        let prompt = format!(
            "You are a Socratic architecture tutor. The student said: \"{}\".\n\
             {milestone_focus}\n\
             Rephrase the following into {expected_questions} open-ended questions, \
             keeping their intent and subjects. Questions only, no preamble:\n{template}",
            workflow.last_message
        );
        let text = match self.llm.complete(&prompt, self.creative_temperature).await {
            Ok(generated) if Self::acceptable(&generated, expected_questions) => generated,
            Ok(_) | Err(_) => {
                debug!("using template questions");
                template
            }
        };

        let response = AgentResponse::text(text, "socratic_questions")
            .with_flag(CognitiveFlag::DeepThinkingEncouraged)
            .with_flag(CognitiveFlag::EngagementMaintained)
            .with_flag(CognitiveFlag::MetacognitiveAwareness)
            .with_metrics(EnhancementMetrics::new(0.8, 0.9, 0.5, 0.7, 0.8, 0.7, 0.8));
        Ok(response)
    }
}
