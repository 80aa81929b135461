//! Conversation-pattern analysis across recent turns.

use super::content::extract_topics;
use crate::state::{ConversationState, MessageRole};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How many recent learner messages the pattern window covers.
const PATTERN_WINDOW: usize = 5;

/// Direction of a conversational trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Getting stronger turn over turn.
    Increasing,
    /// Holding steady.
    #[default]
    Stable,
    /// Weakening turn over turn.
    Decreasing,
}

/// Patterns observed across the recent conversation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConversationPatterns {
    /// The same topic keeps coming back.
    pub has_repetitive_topics: bool,
    /// Topics change with no overlap between consecutive turns.
    pub has_topic_jumping: bool,
    /// Engagement direction over the window.
    pub engagement_trend: Trend,
    /// Understanding direction over the window.
    pub understanding_progression: Trend,
    /// Topics of the most recent learner messages, newest last.
    pub recent_focus: Vec<String>,
}

/// Analyzer for cross-turn conversation patterns.
#[derive(Debug, Default)]
pub struct ConversationPatternAnalyzer;

impl ConversationPatternAnalyzer {
    /// Creates a new analyzer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Analyzes the recent learner messages of the session.
    #[must_use]
    pub fn analyze(&self, state: &ConversationState) -> ConversationPatterns {
        let recent: Vec<&str> = state
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .rev()
            .take(PATTERN_WINDOW)
            .map(|m| m.content.as_str())
            .collect();
        // Restore chronological order, oldest first.
        let recent: Vec<&str> = recent.into_iter().rev().collect();

        if recent.is_empty() {
            return ConversationPatterns::default();
        }

        let topic_sets: Vec<BTreeSet<String>> = recent
            .iter()
            .map(|m| extract_topics(&m.to_lowercase()).into_iter().collect())
            .collect();

        let recent_focus: Vec<String> = topic_sets
            .iter()
            .flat_map(|set| set.iter().cloned())
            .fold(Vec::new(), |mut acc, topic| {
                if !acc.contains(&topic) {
                    acc.push(topic);
                }
                acc
            });

        // Repetition: any topic appearing in three or more window messages.
        let has_repetitive_topics = recent_focus.iter().any(|topic| {
            topic_sets.iter().filter(|set| set.contains(topic)).count() >= 3
        });

        // Jumping: consecutive non-empty topic sets with zero overlap.
        let has_topic_jumping = topic_sets.windows(2).any(|pair| {
            !pair[0].is_empty() && !pair[1].is_empty() && pair[0].is_disjoint(&pair[1])
        });

        let lengths: Vec<usize> =
            recent.iter().map(|m| m.split_whitespace().count()).collect();
        let engagement_trend = trend_of(&lengths);

        // Understanding proxy: growth of on-domain vocabulary per message.
        let vocab: Vec<usize> = topic_sets.iter().map(BTreeSet::len).collect();
        let understanding_progression = trend_of(&vocab);

        ConversationPatterns {
            has_repetitive_topics,
            has_topic_jumping,
            engagement_trend,
            understanding_progression,
            recent_focus,
        }
    }
}

/// Compares the first and second half of the window.
fn trend_of(values: &[usize]) -> Trend {
    if values.len() < 2 {
        return Trend::Stable;
    }
    let mid = values.len() / 2;
    let early: f64 = values[..mid].iter().sum::<usize>() as f64 / mid.max(1) as f64;
    let late: f64 =
        values[mid..].iter().sum::<usize>() as f64 / (values.len() - mid).max(1) as f64;
    if late > early * 1.25 {
        Trend::Increasing
    } else if late < early * 0.75 {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// Jaccard overlap of two topic sets, used by the router's topic-transition
/// rule.
#[must_use]
pub fn jaccard_overlap(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_messages(messages: &[&str]) -> ConversationState {
        let mut state = ConversationState::with_brief("A community center.");
        for (i, m) in messages.iter().enumerate() {
            state.add_user_message(*m);
            if i + 1 < messages.len() {
                state.add_assistant_message("Tell me more.");
            }
        }
        state
    }

    #[test]
    fn test_repetitive_topics_detected() {
        let state = state_with_messages(&[
            "How does circulation work here?",
            "Still thinking about the corridor circulation.",
            "Can we talk about circulation flow again?",
        ]);
        let patterns = ConversationPatternAnalyzer::new().analyze(&state);
        assert!(patterns.has_repetitive_topics);
        assert!(patterns.recent_focus.contains(&"circulation".to_string()));
    }

    #[test]
    fn test_topic_jumping_detected() {
        let state = state_with_messages(&[
            "The concrete and timber palette feels right.",
            "What about the daylight in the reading room?",
        ]);
        let patterns = ConversationPatternAnalyzer::new().analyze(&state);
        assert!(patterns.has_topic_jumping);
    }

    #[test]
    fn test_no_messages_yields_default() {
        let state = ConversationState::with_brief("A library.");
        let patterns = ConversationPatternAnalyzer::new().analyze(&state);
        assert_eq!(patterns, ConversationPatterns::default());
    }

    #[test]
    fn test_engagement_trend_increasing() {
        let state = state_with_messages(&[
            "ok",
            "short answer",
            "Now I am writing a much longer reflection about how the entry sequence \
             shapes the visitor's first impression of the building and its program",
        ]);
        let patterns = ConversationPatternAnalyzer::new().analyze(&state);
        assert_eq!(patterns.engagement_trend, Trend::Increasing);
    }

    #[test]
    fn test_jaccard_overlap() {
        let a: BTreeSet<String> = ["circulation", "lighting"].iter().map(|s| s.to_string()).collect();
        let b: BTreeSet<String> = ["lighting", "structure"].iter().map(|s| s.to_string()).collect();
        let overlap = jaccard_overlap(&a, &b);
        assert!((overlap - 1.0 / 3.0).abs() < 1e-9);

        let empty = BTreeSet::new();
        assert_eq!(jaccard_overlap(&empty, &empty), 1.0);
        assert_eq!(jaccard_overlap(&a, &empty), 0.0);
    }
}
