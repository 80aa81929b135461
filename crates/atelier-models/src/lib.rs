//! Model implementations for Atelier.
//!
//! This crate provides concrete implementations of the `Model` trait.
//!
//! # Supported Providers
//!
//! - **Mock**: Testing and development; deterministic, offline
//! - **OpenAI**: OpenAI and OpenAI-compatible endpoints (API key required)

pub mod factory;
pub mod openai;

use async_trait::async_trait;
use atelier_abstraction::{
    ChatMessage, EmbeddingModel, Model, ModelError, ModelParameters, ModelResponse, ModelUsage,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::debug;

pub use factory::{ModelConfig, ModelFactory, ModelType};
pub use openai::OpenAIModel;

/// A mock implementation of the `Model` trait for testing and demonstration.
///
/// By default it echoes a summary of its input. Tests that need specific
/// completions can enqueue them with [`MockModel::with_canned_responses`];
/// canned responses are consumed in order and the mock falls back to the
/// echo once the queue is drained.
#[derive(Debug, Default)]
pub struct MockModel {
    id: String,
    canned: Mutex<VecDeque<String>>,
}

impl MockModel {
    /// Creates a new `MockModel` with the given ID.
    #[must_use]
    pub fn new(id: String) -> Self {
        Self { id, canned: Mutex::new(VecDeque::new()) }
    }

    /// Creates a mock that serves the given responses in order before
    /// falling back to echoes.
    #[must_use]
    pub fn with_canned_responses(id: String, responses: Vec<String>) -> Self {
        Self { id, canned: Mutex::new(responses.into()) }
    }

    fn next_content(&self, fallback: String) -> String {
        let mut canned = self.canned.lock().unwrap_or_else(|e| e.into_inner());
        canned.pop_front().unwrap_or(fallback)
    }
}

/// Rough token estimate used by the mock (~4 characters per token).
fn count_tokens(text: &str) -> u32 {
    (text.len() as f64 / 4.0).ceil() as u32
}

#[async_trait]
impl Model for MockModel {
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.id,
            prompt_len = prompt.len(),
            parameters = ?parameters,
            "MockModel generating text"
        );

        let content = self.next_content(format!("Mock response for: {prompt}"));

        let prompt_tokens = count_tokens(prompt);
        let completion_tokens = count_tokens(&content);

        Ok(ModelResponse {
            content,
            model_id: Some(self.id.clone()),
            usage: Some(ModelUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
            metadata: None,
        })
    }

    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.id,
            message_count = messages.len(),
            parameters = ?parameters,
            "MockModel generating chat completion"
        );

        let last = messages.last().map_or("", |m| m.content.as_str());
        let content = self.next_content(format!("Mock chat response for: {last}"));

        let prompt_tokens = messages.iter().map(|m| count_tokens(&m.content)).sum::<u32>();
        let completion_tokens = count_tokens(&content);

        Ok(ModelResponse {
            content,
            model_id: Some(self.id.clone()),
            usage: Some(ModelUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
            metadata: None,
        })
    }

    fn model_id(&self) -> &str {
        &self.id
    }
}

#[async_trait]
impl EmbeddingModel for MockModel {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        // Deterministic toy embedding: length and vowel counts, normalized.
        Ok(texts
            .iter()
            .map(|t| {
                let len = t.len() as f32;
                let vowels = t.chars().filter(|c| "aeiou".contains(*c)).count() as f32;
                vec![(len / 100.0).min(1.0), (vowels / 50.0).min(1.0)]
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_echoes_prompt() {
        let model = MockModel::new("mock-model".to_string());
        let response = model.generate_text("hello", None).await.unwrap();
        assert!(response.content.contains("hello"));
        assert_eq!(response.model_id.as_deref(), Some("mock-model"));
        assert!(response.usage.is_some());
    }

    #[tokio::test]
    async fn test_mock_serves_canned_responses_in_order() {
        let model = MockModel::with_canned_responses(
            "mock-model".to_string(),
            vec!["first".to_string(), "second".to_string()],
        );

        let r1 = model.generate_text("a", None).await.unwrap();
        let r2 = model.generate_text("b", None).await.unwrap();
        let r3 = model.generate_text("c", None).await.unwrap();

        assert_eq!(r1.content, "first");
        assert_eq!(r2.content, "second");
        assert!(r3.content.contains("c")); // queue drained, falls back to echo
    }

    #[tokio::test]
    async fn test_mock_chat_uses_last_message() {
        let model = MockModel::new("mock-model".to_string());
        let messages = vec![
            ChatMessage::system("tutor"),
            ChatMessage::user("what is massing?"),
        ];
        let response = model.generate_chat_completion(&messages, None).await.unwrap();
        assert!(response.content.contains("what is massing?"));
    }

    #[tokio::test]
    async fn test_mock_embeddings_are_deterministic() {
        let model = MockModel::new("mock-model".to_string());
        let texts = vec!["courtyard".to_string(), "circulation".to_string()];
        let a = model.embed(&texts).await.unwrap();
        let b = model.embed(&texts).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }
}
