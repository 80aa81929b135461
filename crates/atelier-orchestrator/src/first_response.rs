//! Progressive first-response generation.
//!
//! The opening turn and topic transitions get a dedicated grounding
//! response, prepared before the router runs so the synthesizer can pass it
//! through untouched.

use crate::agents::extract_building_type;
use crate::classification::extract_topics;
use crate::llm::LlmClient;
use crate::state::ConversationState;
use tracing::debug;

/// Generates opening-turn and topic-transition responses.
pub struct ProgressiveResponseGenerator {
    llm: Option<LlmClient>,
    creative_temperature: f32,
}

impl ProgressiveResponseGenerator {
    /// Creates a template-only generator.
    #[must_use]
    pub fn new() -> Self {
        Self { llm: None, creative_temperature: 0.7 }
    }

    /// Attaches an LLM used to phrase the opening in its own voice; the
    /// template stands when the model declines.
    #[must_use]
    pub fn with_llm(mut self, llm: LlmClient, creative_temperature: f32) -> Self {
        self.llm = Some(llm);
        self.creative_temperature = creative_temperature;
        self
    }

    /// The grounding response for the first interactive turn.
    pub async fn opening(&self, state: &ConversationState, input: &str) -> String {
        let building_type = extract_building_type(state).replace('_', " ");
        let topics = extract_topics(&input.to_lowercase());
        let template = Self::opening_template(&building_type, input, &topics);

        let Some(llm) = &self.llm else { return template };
        let prompt = format!(
            "You are an architecture tutor greeting a student starting a {building_type} \
             project. They wrote: \"{input}\". Rewrite the following welcome in a warm, \
             concise voice, keeping both questions:\n\n{template}"
        );
        match llm.complete(&prompt, self.creative_temperature).await {
            Ok(text) if text.matches('?').count() >= 1 && text.split_whitespace().count() < 160 => {
                text
            }
            _ => {
                debug!("using opening template");
                template
            }
        }
    }

    /// The bridge text for a deliberate topic change.
    #[must_use]
    pub fn topic_transition(&self, previous_topic: &str, input: &str) -> String {
        let new_topics = extract_topics(&input.to_lowercase());
        let new_topic = new_topics.first().map_or("this new direction", String::as_str);
        format!(
            "Good moment to shift ground. Before we leave {previous_topic}, hold on to \
             what you concluded there; it will constrain {new_topic} more than you expect.\n\n\
             So, on {new_topic}: what prompted the change of focus, and what do you already \
             suspect the answer looks like?"
        )
    }

    fn opening_template(building_type: &str, input: &str, topics: &[String]) -> String {
        let focus = topics.first().map_or_else(
            || "the core problem your brief is posing".to_string(),
            |t| format!("your interest in {t}"),
        );
        let acknowledgement = if input.trim().is_empty() {
            format!("A {building_type} is a rich project to take on.")
        } else {
            format!(
                "A {building_type} is a rich project to take on, and {focus} is a good \
                 place to start."
            )
        };
        format!(
            "{acknowledgement}\n\nBefore we design anything, let's ground the work: what \
             does success look like for the people this building serves? And which single \
             constraint of your site or brief worries you most right now?"
        )
    }
}

impl Default for ProgressiveResponseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_opening_names_building_type_and_asks_questions() {
        let state = ConversationState::with_brief("Design a 2000 m2 community center.");
        let generator = ProgressiveResponseGenerator::new();
        let text = generator
            .opening(&state, "I am designing a community center for my town.")
            .await;
        assert!(text.contains("community center"));
        assert!(text.matches('?').count() >= 2);
    }

    #[tokio::test]
    async fn test_opening_handles_empty_input() {
        let state = ConversationState::with_brief("Design a museum.");
        let text = ProgressiveResponseGenerator::new().opening(&state, "").await;
        assert!(!text.is_empty());
        assert!(text.contains("museum"));
    }

    #[test]
    fn test_topic_transition_bridges_old_and_new() {
        let generator = ProgressiveResponseGenerator::new();
        let text =
            generator.topic_transition("structure", "Let's talk about the lighting now.");
        assert!(text.contains("structure"));
        assert!(text.contains("lighting"));
        assert!(text.contains('?'));
    }
}
