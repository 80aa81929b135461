//! Conversation state and the per-turn workflow bag.
//!
//! [`ConversationState`] is owned by the session, one per learner, and
//! round-trips through JSON. [`WorkflowState`] is owned by the graph
//! executor for a single turn and discarded after its metadata is persisted
//! back into `agent_context`.

use crate::agents::AgentResponse;
use crate::classification::CoreClassification;
use crate::context::ContextPackage;
use crate::progression::MilestoneGuidance;
use crate::routing::RoutingDecision;
use crate::synthesis::ResponseMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Learner input.
    User,
    /// Tutor output.
    Assistant,
    /// The design brief; always the first message once one exists.
    Brief,
    /// Host-injected instruction.
    System,
}

impl MessageRole {
    /// Stable string form used in metadata and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Brief => "brief",
            MessageRole::System => "system",
        }
    }
}

/// A single conversation message. The sequence is ordered and never
/// reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who produced the message.
    pub role: MessageRole,
    /// Message text.
    pub content: String,
    /// Submission time.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message stamped now.
    #[must_use]
    pub fn new<S: Into<String>>(role: MessageRole, content: S) -> Self {
        Self { role, content: content.into(), timestamp: Utc::now() }
    }

    /// Creates a learner message.
    #[must_use]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates a tutor message.
    #[must_use]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Learner skill level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    /// New to architectural design.
    #[default]
    Beginner,
    /// Comfortable with fundamentals.
    Intermediate,
    /// Working at studio level.
    Advanced,
}

/// The learner profile carried on the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StudentProfile {
    /// Assessed skill level.
    pub skill_level: SkillLevel,
    /// Optional learning-style tag (e.g., "visual").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_style: Option<String>,
    /// Optional cognitive-load estimate in [0,1].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cognitive_load: Option<f64>,
}

/// Design phase of the project conversation.
///
/// Phases only advance monotonically except on explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DesignPhase {
    /// Problem framing.
    #[default]
    Ideation,
    /// Spatial and form development.
    Visualization,
    /// Technical resolution.
    Materialization,
}

impl DesignPhase {
    /// Ordering index used for the monotonicity invariant.
    #[must_use]
    pub fn index(self) -> u8 {
        match self {
            DesignPhase::Ideation => 0,
            DesignPhase::Visualization => 1,
            DesignPhase::Materialization => 2,
        }
    }

    /// The phase after this one, if any.
    #[must_use]
    pub fn next(self) -> Option<DesignPhase> {
        match self {
            DesignPhase::Ideation => Some(DesignPhase::Visualization),
            DesignPhase::Visualization => Some(DesignPhase::Materialization),
            DesignPhase::Materialization => None,
        }
    }

    /// Stable string form used in metadata and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DesignPhase::Ideation => "ideation",
            DesignPhase::Visualization => "visualization",
            DesignPhase::Materialization => "materialization",
        }
    }
}

impl std::fmt::Display for DesignPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session state: one per learner, owned by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    /// Ordered conversation history. `messages[0].role == Brief` once a
    /// brief exists.
    pub messages: Vec<Message>,
    /// The current design brief text.
    pub current_design_brief: String,
    /// Current design phase.
    pub design_phase: DesignPhase,
    /// Progress through the current phase, in [0,1].
    pub phase_progress: f64,
    /// Learner profile.
    pub student_profile: StudentProfile,
    /// Inter-turn scratchpad (last topic, last route, turn counters).
    pub agent_context: HashMap<String, serde_json::Value>,
    /// Appends the cognitive-assessment block to responses.
    pub show_scientific_metrics: bool,
    /// Logs a per-turn response summary.
    pub show_response_summary: bool,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationState {
    /// Creates an empty session in the ideation phase.
    #[must_use]
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            current_design_brief: String::new(),
            design_phase: DesignPhase::Ideation,
            phase_progress: 0.0,
            student_profile: StudentProfile::default(),
            agent_context: HashMap::new(),
            show_scientific_metrics: false,
            show_response_summary: false,
        }
    }

    /// Creates a session seeded with a design brief.
    #[must_use]
    pub fn with_brief<S: Into<String>>(brief: S) -> Self {
        let mut state = Self::new();
        state.set_brief(brief.into());
        state
    }

    /// Sets the design brief, keeping it as the first message.
    pub fn set_brief(&mut self, brief: String) {
        self.current_design_brief.clone_from(&brief);
        match self.messages.first_mut() {
            Some(first) if first.role == MessageRole::Brief => {
                first.content = brief;
            }
            _ => self.messages.insert(0, Message::new(MessageRole::Brief, brief)),
        }
    }

    /// Appends a learner message.
    pub fn add_user_message<S: Into<String>>(&mut self, content: S) {
        self.messages.push(Message::user(content));
    }

    /// Appends a tutor message.
    pub fn add_assistant_message<S: Into<String>>(&mut self, content: S) {
        self.messages.push(Message::assistant(content));
    }

    /// All learner messages, in order.
    pub fn user_messages(&self) -> impl DoubleEndedIterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role == MessageRole::User)
    }

    /// Number of learner messages so far.
    #[must_use]
    pub fn user_message_count(&self) -> usize {
        self.user_messages().count()
    }

    /// The most recent learner message, if any.
    #[must_use]
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == MessageRole::User)
    }

    /// The most recent tutor message, if any.
    #[must_use]
    pub fn last_assistant_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == MessageRole::Assistant)
    }

    /// The tutor message preceding the latest learner message, used by the
    /// response-to-question check.
    #[must_use]
    pub fn assistant_message_before_last_user(&self) -> Option<&Message> {
        let last_user_idx = self
            .messages
            .iter()
            .rposition(|m| m.role == MessageRole::User)?;
        self.messages[..last_user_idx]
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
    }

    /// Advances the phase, enforcing monotonicity. Returns `true` when the
    /// phase actually changed.
    pub fn advance_phase(&mut self, phase: DesignPhase) -> bool {
        if phase.index() > self.design_phase.index() {
            self.design_phase = phase;
            self.phase_progress = 0.0;
            true
        } else {
            false
        }
    }

    /// Explicit reset back to ideation; the only path by which a phase
    /// regresses.
    pub fn reset_phases(&mut self) {
        self.design_phase = DesignPhase::Ideation;
        self.phase_progress = 0.0;
    }

    /// Reads a scratchpad value as a string.
    #[must_use]
    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.agent_context.get(key).and_then(|v| v.as_str())
    }

    /// Writes a scratchpad value.
    pub fn set_context<S: Into<String>>(&mut self, key: S, value: serde_json::Value) {
        self.agent_context.insert(key.into(), value);
    }
}

/// Per-turn value bag threaded through the graph.
///
/// Nodes read the bag and append their results; the executor owns it and
/// merges agent outputs in invocation order.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    /// Snapshot of the session state for this turn.
    pub state: ConversationState,
    /// The learner input that started the turn.
    pub last_message: String,
    /// Set by the context node.
    pub classification: Option<CoreClassification>,
    /// Set by the context node.
    pub context_package: Option<ContextPackage>,
    /// Set by the router node.
    pub routing_decision: Option<RoutingDecision>,
    /// Agent results in invocation order.
    pub agent_results: Vec<(String, AgentResponse)>,
    /// Set by the analysis agent when milestone guidance applies.
    pub milestone_guidance: Option<MilestoneGuidance>,
    /// Set by the first-response path or the synthesizer.
    pub final_response: Option<String>,
    /// Set by the synthesizer.
    pub response_metadata: Option<ResponseMetadata>,
}

impl WorkflowState {
    /// Creates the turn bag for the given session snapshot.
    #[must_use]
    pub fn new(state: ConversationState) -> Self {
        let last_message = state
            .last_user_message()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Self {
            state,
            last_message,
            classification: None,
            context_package: None,
            routing_decision: None,
            agent_results: Vec::new(),
            milestone_guidance: None,
            final_response: None,
            response_metadata: None,
        }
    }

    /// Records an agent result, preserving invocation order.
    pub fn record_agent_result<S: Into<String>>(&mut self, agent: S, response: AgentResponse) {
        self.agent_results.push((agent.into(), response));
    }

    /// Looks up an agent result by name.
    #[must_use]
    pub fn agent_result(&self, agent: &str) -> Option<&AgentResponse> {
        self.agent_results
            .iter()
            .find(|(name, _)| name == agent)
            .map(|(_, response)| response)
    }

    /// Names of agents that produced a non-error result, in order.
    #[must_use]
    pub fn agents_used(&self) -> Vec<String> {
        self.agent_results
            .iter()
            .filter(|(_, r)| r.error.is_none())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brief_stays_first_message() {
        let mut state = ConversationState::new();
        state.add_user_message("hello");
        state.set_brief("Design a 2000 m2 community center.".to_string());

        assert_eq!(state.messages[0].role, MessageRole::Brief);
        assert_eq!(state.current_design_brief, "Design a 2000 m2 community center.");

        // Re-setting replaces rather than duplicating.
        state.set_brief("Design a library.".to_string());
        assert_eq!(state.messages[0].content, "Design a library.");
        assert_eq!(
            state.messages.iter().filter(|m| m.role == MessageRole::Brief).count(),
            1
        );
    }

    #[test]
    fn test_phase_never_regresses() {
        let mut state = ConversationState::new();
        assert!(state.advance_phase(DesignPhase::Visualization));
        assert!(!state.advance_phase(DesignPhase::Ideation));
        assert_eq!(state.design_phase, DesignPhase::Visualization);

        assert!(state.advance_phase(DesignPhase::Materialization));
        assert!(!state.advance_phase(DesignPhase::Visualization));

        state.reset_phases();
        assert_eq!(state.design_phase, DesignPhase::Ideation);
    }

    #[test]
    fn test_assistant_message_before_last_user() {
        let mut state = ConversationState::with_brief("A community center.");
        state.add_user_message("I am designing a community center.");
        state.add_assistant_message("What site constraints are you working with?");
        state.add_user_message("The site slopes toward the river.");

        let preceding = state.assistant_message_before_last_user().unwrap();
        assert!(preceding.content.contains("site constraints"));
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let mut state = ConversationState::with_brief("Design a museum.");
        state.add_user_message("Where do I start?");
        state.add_assistant_message("Start with the visitors.");
        state.design_phase = DesignPhase::Visualization;
        state.phase_progress = 0.4;
        state.student_profile.skill_level = SkillLevel::Intermediate;
        state.set_context("last_topic", serde_json::json!("circulation"));

        let json = serde_json::to_string(&state).unwrap();
        let back: ConversationState = serde_json::from_str(&json).unwrap();

        assert_eq!(back.messages, state.messages);
        assert_eq!(back.design_phase, DesignPhase::Visualization);
        assert_eq!(back.current_design_brief, "Design a museum.");
        assert_eq!(back.student_profile, state.student_profile);
        assert_eq!(back.context_str("last_topic"), Some("circulation"));
    }

    #[test]
    fn test_workflow_state_records_results_in_order() {
        use crate::agents::AgentResponse;

        let mut state = ConversationState::with_brief("A school.");
        state.add_user_message("How should I organize classrooms?");
        let mut workflow = WorkflowState::new(state);

        assert_eq!(workflow.last_message, "How should I organize classrooms?");

        workflow.record_agent_result("domain_expert", AgentResponse::text("clusters", "knowledge"));
        workflow.record_agent_result("socratic_tutor", AgentResponse::text("why?", "question"));

        assert_eq!(workflow.agents_used(), vec!["domain_expert", "socratic_tutor"]);
        assert!(workflow.agent_result("domain_expert").is_some());
        assert!(workflow.agent_result("cognitive_enhancement").is_none());
    }
}
