//! Five-dimension grading of answered milestone questions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Grade for one answered question. All dimensions live in [0,1];
/// `overall_score` is their arithmetic mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    /// Mean of the five dimensions.
    pub overall_score: f64,
    /// Did the answer cover the question?
    pub completeness: f64,
    /// Did it reason, not just assert?
    pub depth: f64,
    /// Did it stay on the asked topic?
    pub relevance: f64,
    /// Did it bring an idea of its own?
    pub innovation: f64,
    /// Did it use domain vocabulary correctly?
    pub technical: f64,
}

impl Grade {
    /// Builds a grade from the five dimensions, deriving the mean.
    #[must_use]
    pub fn from_dimensions(
        completeness: f64,
        depth: f64,
        relevance: f64,
        innovation: f64,
        technical: f64,
    ) -> Self {
        let overall_score =
            (completeness + depth + relevance + innovation + technical) / 5.0;
        Self { overall_score, completeness, depth, relevance, innovation, technical }
    }
}

/// Progress through one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PhaseProgress {
    /// Questions the learner has answered in this phase.
    pub questions_answered: usize,
    /// Milestone completion, in [0,1].
    pub completion_percent: f64,
    /// Mean overall score across graded questions.
    pub average_score: f64,
    /// Whether the phase is complete.
    pub is_complete: bool,
    /// Dimensions the learner scores well on.
    pub strengths: Vec<String>,
    /// Dimensions that need work.
    pub improvement_areas: Vec<String>,
    /// Grades keyed by question id (milestone id).
    pub grades: HashMap<String, Grade>,
}

impl PhaseProgress {
    /// Records a grade and refreshes the aggregate fields.
    pub fn record_grade(&mut self, question_id: String, grade: Grade) {
        self.grades.insert(question_id, grade);
        self.questions_answered = self.grades.len();
        self.average_score = if self.grades.is_empty() {
            0.0
        } else {
            self.grades.values().map(|g| g.overall_score).sum::<f64>() / self.grades.len() as f64
        };
        self.refresh_dimension_summary();
    }

    fn refresh_dimension_summary(&mut self) {
        if self.grades.is_empty() {
            return;
        }
        let n = self.grades.len() as f64;
        let dims: [(&str, f64); 5] = [
            ("completeness", self.grades.values().map(|g| g.completeness).sum::<f64>() / n),
            ("depth", self.grades.values().map(|g| g.depth).sum::<f64>() / n),
            ("relevance", self.grades.values().map(|g| g.relevance).sum::<f64>() / n),
            ("innovation", self.grades.values().map(|g| g.innovation).sum::<f64>() / n),
            ("technical", self.grades.values().map(|g| g.technical).sum::<f64>() / n),
        ];
        self.strengths = dims
            .iter()
            .filter(|(_, score)| *score >= 0.6)
            .map(|(name, _)| (*name).to_string())
            .collect();
        self.improvement_areas = dims
            .iter()
            .filter(|(_, score)| *score < 0.4)
            .map(|(name, _)| (*name).to_string())
            .collect();
    }
}

/// Markers of reasoning rather than assertion.
const DEPTH_MARKERS: &[&str] =
    &["because", "so that", "which means", "therefore", "the reason", "trade-off", "tension"];

/// Markers of the learner bringing their own idea.
const INNOVATION_MARKERS: &[&str] =
    &["what if", "instead", "alternatively", "my idea", "i propose", "unconventional", "experiment"];

/// Grades a learner answer against the criteria keywords of the question it
/// answers. Deterministic keyword scoring keeps grades reproducible.
#[must_use]
pub fn grade_answer(answer: &str, criteria: &[String]) -> Grade {
    let lower = answer.to_lowercase();
    let word_count = lower.split_whitespace().count();

    let completeness = (word_count as f64 / 60.0).min(1.0);

    let depth = (DEPTH_MARKERS.iter().filter(|m| lower.contains(*m)).count() as f64 * 0.35)
        .min(1.0);

    let criterion_words: Vec<&str> = criteria
        .iter()
        .flat_map(|c| c.split_whitespace())
        .collect();
    let relevance = if criterion_words.is_empty() {
        0.5
    } else {
        let hits = criterion_words.iter().filter(|w| lower.contains(*w)).count();
        (hits as f64 / criterion_words.len() as f64 * 2.0).min(1.0)
    };

    let innovation = (INNOVATION_MARKERS.iter().filter(|m| lower.contains(*m)).count() as f64
        * 0.4)
        .min(1.0);

    let technical =
        (crate::classification::ContentAnalyzer::new().analyze(answer).technical_terms.len()
            as f64
            * 0.25)
            .min(1.0);

    Grade::from_dimensions(completeness, depth, relevance, innovation, technical)
}
