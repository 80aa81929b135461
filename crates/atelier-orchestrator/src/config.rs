//! Orchestrator configuration.
//!
//! The hosting layer injects these values; the core mandates no CLI and no
//! environment variable list.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the orchestration engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Which LLM to use for all completions.
    pub default_model: String,
    /// Default sampling temperature. Classification runs cooler, creative
    /// prompts warmer; see [`OrchestratorConfig::classification_temperature`]
    /// and [`OrchestratorConfig::creative_temperature`].
    pub default_temperature: f32,
    /// Token ceiling per completion.
    pub max_tokens: u32,
    /// Number of user messages below which the first example request is
    /// rerouted to cognitive intervention.
    pub cooling_off_messages: usize,
    /// Fraction of milestones that must be complete before a phase advances.
    pub phase_completion_threshold: f64,
    /// Keyword coverage a milestone success criterion needs to count as met.
    pub criterion_coverage_threshold: f64,
    /// Appends the cognitive-assessment block to the final text.
    pub show_scientific_metrics: bool,
    /// Soft cap on synthesized response length, in words.
    pub max_response_words_budget: usize,
    /// Deadline for a single LLM call.
    #[serde(with = "duration_secs")]
    pub llm_timeout: Duration,
    /// Deadline for a single vector-store or web query.
    #[serde(with = "duration_secs")]
    pub search_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_model: "gpt-4o".to_string(),
            default_temperature: 0.3,
            max_tokens: 1200,
            cooling_off_messages: 5,
            phase_completion_threshold: 0.8,
            criterion_coverage_threshold: 0.6,
            show_scientific_metrics: false,
            max_response_words_budget: 400,
            llm_timeout: Duration::from_secs(20),
            search_timeout: Duration::from_secs(15),
        }
    }
}

impl OrchestratorConfig {
    /// Temperature used for classification completions.
    #[must_use]
    pub fn classification_temperature(&self) -> f32 {
        0.2
    }

    /// Temperature used for open-ended generation (Socratic questions,
    /// challenges).
    #[must_use]
    pub fn creative_temperature(&self) -> f32 {
        0.7
    }

    /// Sets the default model.
    #[must_use]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.default_model = model.into();
        self
    }

    /// Sets the default temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.default_temperature = temperature;
        self
    }

    /// Sets the cooling-off window in user messages.
    #[must_use]
    pub fn with_cooling_off_messages(mut self, count: usize) -> Self {
        self.cooling_off_messages = count;
        self
    }

    /// Enables the cognitive-assessment block on final responses.
    #[must_use]
    pub fn with_scientific_metrics(mut self, enabled: bool) -> Self {
        self.show_scientific_metrics = enabled;
        self
    }

    /// Sets the soft word budget for synthesized responses.
    #[must_use]
    pub fn with_word_budget(mut self, words: usize) -> Self {
        self.max_response_words_budget = words;
        self
    }
}

/// Serializes `Duration` as whole seconds so configs stay human-editable.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_recommended_values() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.max_tokens, 1200);
        assert_eq!(config.cooling_off_messages, 5);
        assert_eq!(config.phase_completion_threshold, 0.8);
        assert_eq!(config.criterion_coverage_threshold, 0.6);
        assert!(!config.show_scientific_metrics);
        assert_eq!(config.llm_timeout, Duration::from_secs(20));
        assert_eq!(config.search_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_builder_overrides() {
        let config = OrchestratorConfig::default()
            .with_model("gpt-4o-mini")
            .with_cooling_off_messages(3)
            .with_scientific_metrics(true);
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.cooling_off_messages, 3);
        assert!(config.show_scientific_metrics);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = OrchestratorConfig::default().with_word_budget(250);
        let json = serde_json::to_string(&config).unwrap();
        let back: OrchestratorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_response_words_budget, 250);
        assert_eq!(back.llm_timeout, config.llm_timeout);
    }
}
