//! Milestone definitions per design phase.
//!
//! Each phase carries a fixed ladder of milestones with required actions and
//! success criteria. Criteria are phrased as keyword clusters so coverage
//! checks stay deterministic.

use crate::state::DesignPhase;
use serde::{Deserialize, Serialize};

/// A named learning objective within a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Stable milestone identifier (e.g., "site_and_context").
    pub milestone_type: String,
    /// The phase this milestone belongs to.
    pub phase: DesignPhase,
    /// What the learner is expected to do.
    pub required_actions: Vec<String>,
    /// Evidence clusters; a criterion counts as met when enough of its
    /// keywords appear in the learner's recent messages.
    pub success_criteria: Vec<String>,
    /// Signals that the milestone conversation has concluded.
    pub completion_indicators: Vec<String>,
    /// The probing question the synthesizer may append.
    pub guiding_question: String,
}

fn milestone(
    milestone_type: &str,
    phase: DesignPhase,
    required_actions: &[&str],
    success_criteria: &[&str],
    completion_indicators: &[&str],
    guiding_question: &str,
) -> Milestone {
    Milestone {
        milestone_type: milestone_type.to_string(),
        phase,
        required_actions: required_actions.iter().map(|s| (*s).to_string()).collect(),
        success_criteria: success_criteria.iter().map(|s| (*s).to_string()).collect(),
        completion_indicators: completion_indicators.iter().map(|s| (*s).to_string()).collect(),
        guiding_question: guiding_question.to_string(),
    }
}

/// The milestone ladder for a phase, in order.
#[must_use]
pub fn phase_milestones(phase: DesignPhase) -> Vec<Milestone> {
    match phase {
        DesignPhase::Ideation => vec![
            milestone(
                "brief_interpretation",
                phase,
                &["restate the brief in your own words", "identify the core design problem"],
                &["brief program purpose community", "problem question goal users"],
                &["names the central problem", "lists the program drivers"],
                "What is the single most important problem your brief is really asking you to solve?",
            ),
            milestone(
                "users_and_needs",
                phase,
                &["describe the user groups", "rank their competing needs"],
                &["users visitors people needs", "activity group age community"],
                &["distinguishes at least two user groups"],
                "Who uses this building at 9am on a Tuesday, and what do they need from it?",
            ),
            milestone(
                "site_and_context",
                phase,
                &["analyze the site conditions", "connect context to design moves"],
                &["site context climate orientation", "access street neighborhood slope"],
                &["relates a site condition to a design response"],
                "Which single site condition should shape your first design move, and why?",
            ),
            milestone(
                "concept_direction",
                phase,
                &["state a parti or organizing idea", "defend it against the brief"],
                &["concept parti idea organizing", "diagram strategy direction"],
                &["commits to one organizing idea"],
                "If you had to draw your concept as one diagram, what would it show?",
            ),
        ],
        DesignPhase::Visualization => vec![
            milestone(
                "spatial_organization",
                phase,
                &["lay out program adjacencies", "justify the spatial hierarchy"],
                &["space spatial organization adjacency layout", "zone public private hierarchy"],
                &["describes adjacencies with reasons"],
                "Which two spaces must never be far apart in your scheme, and which two must?",
            ),
            milestone(
                "massing_and_form",
                phase,
                &["develop the massing", "relate form to context and concept"],
                &["massing form volume shape", "scale height proportion roof"],
                &["relates massing to the concept"],
                "What does your massing give to the street that a simple box would not?",
            ),
            milestone(
                "circulation_strategy",
                phase,
                &["trace user movement", "resolve vertical and horizontal circulation"],
                &["circulation movement path corridor", "entrance stair lobby sequence"],
                &["narrates a user journey through the plan"],
                "Walk me through a first-time visitor's path from the street to the main space.",
            ),
            milestone(
                "light_and_envelope",
                phase,
                &["study daylight in key spaces", "develop the envelope response"],
                &["light daylight window glazing", "facade envelope shading orientation"],
                &["connects envelope decisions to daylight"],
                "Where does the most important daylight in your building come from, and when?",
            ),
        ],
        DesignPhase::Materialization => vec![
            milestone(
                "structural_approach",
                phase,
                &["choose a structural system", "check it against the spans"],
                &["structure structural column grid", "span beam load system"],
                &["names a system and its implications"],
                "What does your structural grid make easy, and what does it make hard?",
            ),
            milestone(
                "material_palette",
                phase,
                &["select primary materials", "argue durability and atmosphere"],
                &["material concrete timber brick", "texture finish atmosphere durability"],
                &["justifies materials beyond appearance"],
                "Which material carries the identity of the project, and what does it cost you?",
            ),
            milestone(
                "technical_integration",
                phase,
                &["integrate services and codes", "resolve one detail thoroughly"],
                &["detail technical systems ventilation", "code accessibility requirement integration"],
                &["resolves a technical conflict explicitly"],
                "Pick one junction in your building: how do structure, envelope, and services meet there?",
            ),
        ],
    }
}
