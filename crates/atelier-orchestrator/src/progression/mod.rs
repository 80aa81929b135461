//! Conversation progression: the three-phase milestone state machine.
//!
//! Phases advance `ideation -> visualization -> materialization` and never
//! regress automatically. Milestone evidence is scored with deterministic
//! keyword coverage so the same transcript always produces the same
//! progression.

mod grading;
mod milestones;

pub use grading::{grade_answer, Grade, PhaseProgress};
pub use milestones::{phase_milestones, Milestone};

use crate::classification::ContentAnalyzer;
use crate::state::{ConversationState, DesignPhase, SkillLevel, StudentProfile};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Scratchpad key holding the ids of completed milestones.
const COMPLETED_KEY: &str = "completed_milestones";
/// Scratchpad key holding the per-phase progress records.
const PROGRESS_KEY: &str = "phase_progress_detail";

/// How many recent learner messages count as milestone evidence.
const EVIDENCE_WINDOW: usize = 3;

/// Result of analyzing the opening message of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstMessageAnalysis {
    /// Conversation stage label; the opening turn is always "discovery".
    pub phase_label: String,
    /// Profile inferred from the opening message.
    pub user_profile: StudentProfile,
}

/// Result of a progression step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Phase after the step.
    pub phase: DesignPhase,
    /// Fraction of the phase's milestones complete, in [0,1].
    pub milestone_progress: f64,
    /// Whether this step crossed a phase boundary.
    pub phase_transitioned: bool,
}

/// Result of a milestone assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneAssessment {
    /// Whether the current milestone completed on this turn.
    pub milestone_complete: bool,
    /// The next milestone id, if one remains in the phase.
    pub next_milestone: Option<String>,
    /// The phase entered, when this turn completed a phase.
    pub phase_transition: Option<DesignPhase>,
}

/// Guidance handed to agents about the current milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneGuidance {
    /// Current milestone id.
    pub current_milestone: String,
    /// What the agents should focus on.
    pub agent_focus: String,
    /// How they should steer the learner.
    pub agent_guidance: String,
    /// The question the synthesizer may append.
    pub guiding_question: String,
}

/// The conversation progression manager.
pub struct ProgressionManager {
    phase_completion_threshold: f64,
    criterion_coverage_threshold: f64,
}

impl ProgressionManager {
    /// Creates a manager with the given thresholds.
    #[must_use]
    pub fn new(phase_completion_threshold: f64, criterion_coverage_threshold: f64) -> Self {
        Self { phase_completion_threshold, criterion_coverage_threshold }
    }

    /// Analyzes the opening message: stage label plus an inferred profile.
    #[must_use]
    pub fn analyze_first_message(&self, text: &str) -> FirstMessageAnalysis {
        let technical = ContentAnalyzer::new().analyze(text).technical_terms.len();
        let skill_level = if technical >= 3 {
            SkillLevel::Advanced
        } else if technical >= 1 {
            SkillLevel::Intermediate
        } else {
            SkillLevel::Beginner
        };
        FirstMessageAnalysis {
            phase_label: "discovery".to_string(),
            user_profile: StudentProfile { skill_level, ..StudentProfile::default() },
        }
    }

    /// Runs one progression step for the latest exchange: assesses the
    /// current milestone, updates phase progress on the state, and advances
    /// the phase when its completion threshold is crossed.
    pub fn progress(
        &self,
        state: &mut ConversationState,
        user_text: &str,
        last_assistant_text: &str,
    ) -> ProgressUpdate {
        let assessment = self.assess_milestone_completion(state, user_text, last_assistant_text);
        let fraction = self.phase_completion_fraction(state);
        state.phase_progress = fraction;

        ProgressUpdate {
            phase: state.design_phase,
            milestone_progress: fraction,
            phase_transitioned: assessment.phase_transition.is_some(),
        }
    }

    /// Assesses whether the current milestone completed on this turn.
    ///
    /// A milestone completes when the learner's recent messages cover every
    /// success criterion at or above the coverage threshold. Completing
    /// enough milestones completes the phase and advances it.
    pub fn assess_milestone_completion(
        &self,
        state: &mut ConversationState,
        user_text: &str,
        _last_assistant_text: &str,
    ) -> MilestoneAssessment {
        let Some(current) = self.current_milestone(state) else {
            return MilestoneAssessment {
                milestone_complete: false,
                next_milestone: None,
                phase_transition: self.try_phase_transition(state),
            };
        };

        let evidence = self.evidence_text(state, user_text);
        let complete = current
            .success_criteria
            .iter()
            .all(|criterion| self.criterion_met(criterion, &evidence));

        if !complete {
            return MilestoneAssessment {
                milestone_complete: false,
                next_milestone: Some(current.milestone_type),
                phase_transition: None,
            };
        }

        info!(milestone = %current.milestone_type, phase = %state.design_phase, "milestone complete");
        self.mark_completed(state, &current.milestone_type);
        self.record_grade(state, &current, user_text);

        let next_milestone = self.current_milestone(state).map(|m| m.milestone_type);
        let phase_transition = self.try_phase_transition(state);

        MilestoneAssessment { milestone_complete: true, next_milestone, phase_transition }
    }

    /// Produces the milestone-driven guidance agents receive this turn.
    #[must_use]
    pub fn get_milestone_driven_agent_guidance(
        &self,
        state: &ConversationState,
        user_text: &str,
    ) -> MilestoneGuidance {
        let Some(current) = self.current_milestone(state) else {
            return MilestoneGuidance {
                current_milestone: "phase_complete".to_string(),
                agent_focus: "consolidation".to_string(),
                agent_guidance: "The phase milestones are complete; consolidate and look ahead."
                    .to_string(),
                guiding_question: String::new(),
            };
        };

        let topics = ContentAnalyzer::new().analyze(user_text).key_topics;
        let agent_focus = topics
            .first()
            .cloned()
            .unwrap_or_else(|| current.milestone_type.clone());

        MilestoneGuidance {
            agent_guidance: format!(
                "Steer toward '{}': {}",
                current.milestone_type,
                current.required_actions.join("; ")
            ),
            guiding_question: current.guiding_question.clone(),
            current_milestone: current.milestone_type,
            agent_focus,
        }
    }

    /// The first unanswered milestone question of the current phase, if any.
    #[must_use]
    pub fn pending_question(&self, state: &ConversationState) -> Option<String> {
        self.current_milestone(state).map(|m| m.guiding_question)
    }

    /// Per-phase progress records accumulated so far.
    #[must_use]
    pub fn phase_progress_detail(&self, state: &ConversationState) -> PhaseProgress {
        state
            .agent_context
            .get(PROGRESS_KEY)
            .and_then(|v| v.get(state.design_phase.as_str()))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    fn current_milestone(&self, state: &ConversationState) -> Option<Milestone> {
        let completed = self.completed_ids(state);
        phase_milestones(state.design_phase)
            .into_iter()
            .find(|m| !completed.contains(&m.milestone_type))
    }

    fn phase_completion_fraction(&self, state: &ConversationState) -> f64 {
        let milestones = phase_milestones(state.design_phase);
        if milestones.is_empty() {
            return 1.0;
        }
        let completed = self.completed_ids(state);
        let done = milestones
            .iter()
            .filter(|m| completed.contains(&m.milestone_type))
            .count();
        done as f64 / milestones.len() as f64
    }

    fn try_phase_transition(&self, state: &mut ConversationState) -> Option<DesignPhase> {
        if self.phase_completion_fraction(state) < self.phase_completion_threshold {
            return None;
        }
        let next = state.design_phase.next()?;
        if state.advance_phase(next) {
            info!(phase = %next, "phase transition");
            Some(next)
        } else {
            None
        }
    }

    fn criterion_met(&self, criterion: &str, evidence_lower: &str) -> bool {
        let keywords: Vec<&str> = criterion.split_whitespace().collect();
        if keywords.is_empty() {
            return true;
        }
        let hits = keywords.iter().filter(|k| evidence_lower.contains(*k)).count();
        let coverage = hits as f64 / keywords.len() as f64;
        debug!(criterion, coverage, "criterion coverage");
        coverage >= self.criterion_coverage_threshold
    }

    fn evidence_text(&self, state: &ConversationState, user_text: &str) -> String {
        let mut parts: Vec<String> = state
            .user_messages()
            .rev()
            .take(EVIDENCE_WINDOW)
            .map(|m| m.content.to_lowercase())
            .collect();
        let current = user_text.to_lowercase();
        if !parts.contains(&current) {
            parts.push(current);
        }
        parts.join(" ")
    }

    fn completed_ids(&self, state: &ConversationState) -> Vec<String> {
        state
            .agent_context
            .get(COMPLETED_KEY)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    fn mark_completed(&self, state: &mut ConversationState, milestone_type: &str) {
        let mut completed = self.completed_ids(state);
        if !completed.contains(&milestone_type.to_string()) {
            completed.push(milestone_type.to_string());
        }
        state.set_context(COMPLETED_KEY, serde_json::json!(completed));
    }

    fn record_grade(&self, state: &mut ConversationState, milestone: &Milestone, answer: &str) {
        let grade = grade_answer(answer, &milestone.success_criteria);
        let mut detail = self.phase_progress_detail(state);
        detail.record_grade(milestone.milestone_type.clone(), grade);
        detail.completion_percent = self.phase_completion_fraction(state);
        detail.is_complete = detail.completion_percent >= self.phase_completion_threshold;

        let mut all: serde_json::Value = state
            .agent_context
            .get(PROGRESS_KEY)
            .cloned()
            .unwrap_or_else(|| serde_json::json!({}));
        if let Ok(value) = serde_json::to_value(&detail) {
            all[state.design_phase.as_str()] = value;
        }
        state.set_context(PROGRESS_KEY, all);
    }
}
