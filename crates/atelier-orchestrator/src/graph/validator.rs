//! State validation at node boundaries.
//!
//! Violations are diagnostics, never aborts: a turn with a broken invariant
//! still produces a response, but the record lands in the metadata and the
//! log.

use crate::state::{MessageRole, WorkflowState};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Unexpected but harmless.
    Warning,
    /// A contract the caller relies on did not hold.
    Error,
}

/// A recorded invariant violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Node at whose boundary the check ran.
    pub node: String,
    /// Which invariant failed.
    pub invariant: String,
    /// How bad it is.
    pub severity: Severity,
}

/// Validator run before and after every node.
#[derive(Debug)]
pub struct StateValidator {
    /// Phase index at turn start, for the monotonicity check.
    initial_phase_index: u8,
    diagnostics: Vec<Diagnostic>,
}

impl StateValidator {
    /// Creates a validator pinned to the turn's starting phase.
    #[must_use]
    pub fn new(workflow: &WorkflowState) -> Self {
        Self {
            initial_phase_index: workflow.state.design_phase.index(),
            diagnostics: Vec::new(),
        }
    }

    /// Runs the boundary checks for a node. Returns the number of new
    /// diagnostics.
    pub fn check(&mut self, workflow: &WorkflowState, node: &str) -> usize {
        let before = self.diagnostics.len();

        // Invariant 1: message ordering; the brief leads once it exists.
        if !workflow.state.current_design_brief.is_empty()
            && workflow.state.messages.first().map(|m| m.role) != Some(MessageRole::Brief)
        {
            self.record(node, "brief_is_first_message", Severity::Error);
        }
        let mut last_timestamp = None;
        for message in &workflow.state.messages {
            if let Some(previous) = last_timestamp {
                if message.timestamp < previous {
                    self.record(node, "messages_ordered", Severity::Warning);
                    break;
                }
            }
            last_timestamp = Some(message.timestamp);
        }

        // Invariant 2: the phase never regresses within a turn, and phase
        // progress stays in range.
        if workflow.state.design_phase.index() < self.initial_phase_index {
            self.record(node, "phase_monotonic", Severity::Error);
        }
        if !(0.0..=1.0).contains(&workflow.state.phase_progress) {
            self.record(node, "phase_progress_in_range", Severity::Warning);
        }

        // Invariant 3: classification exists once the context node ran.
        if node != "context_agent" && node != "entry" && workflow.classification.is_none() {
            self.record(node, "classification_present", Severity::Error);
        }

        // Invariant 4: a routing decision exists once the router ran.
        let routed = !matches!(node, "entry" | "context_agent" | "router");
        if routed && workflow.routing_decision.is_none() {
            self.record(node, "routing_decision_present", Severity::Error);
        }
        if let Some(decision) = &workflow.routing_decision {
            if decision.rule_applied.is_empty() {
                self.record(node, "rule_applied_non_empty", Severity::Warning);
            }
        }

        // Invariant 5: the synthesizer has something to compose from.
        if node == "synthesizer"
            && workflow.final_response.is_none()
            && workflow.agent_results.is_empty()
        {
            self.record(node, "synthesizer_has_input", Severity::Error);
        }

        self.diagnostics.len() - before
    }

    fn record(&mut self, node: &str, invariant: &str, severity: Severity) {
        warn!(node, invariant, severity = ?severity, "state invariant violated");
        self.diagnostics.push(Diagnostic {
            node: node.to_string(),
            invariant: invariant.to_string(),
            severity,
        });
    }

    /// All diagnostics recorded this turn.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
