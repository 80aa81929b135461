//! LLM client wrapper.
//!
//! Wraps the provider behind a small surface the agents share: plain
//! completions with one bounded retry, and JSON-shaped completions parsed
//! with a tolerant extractor. Callers always carry a deterministic fallback;
//! this wrapper never panics on provider weirdness.

use crate::config::OrchestratorConfig;
use atelier_abstraction::{ChatMessage, Model, ModelError, ModelParameters};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Shared completion client. Process-wide, stateless, safe to share.
#[derive(Clone)]
pub struct LlmClient {
    model: Arc<dyn Model>,
    llm_timeout: std::time::Duration,
    max_tokens: u32,
}

impl LlmClient {
    /// Creates a client over the given model.
    #[must_use]
    pub fn new(model: Arc<dyn Model>, config: &OrchestratorConfig) -> Self {
        Self { model, llm_timeout: config.llm_timeout, max_tokens: config.max_tokens }
    }

    /// Generates a single completion.
    ///
    /// Retries once on a retryable transport error; all other errors are
    /// returned to the caller, which must fall back deterministically.
    ///
    /// # Errors
    /// Returns a `ModelError` when both attempts fail.
    pub async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, ModelError> {
        let params = ModelParameters::new(temperature, self.max_tokens);
        match self.complete_once(prompt, params.clone()).await {
            Ok(text) => Ok(text),
            Err(e) if e.is_retryable() => {
                warn!(error = %e, "LLM call failed, retrying once");
                self.complete_once(prompt, params).await
            }
            Err(e) => Err(e),
        }
    }

    /// Generates a chat completion over explicit messages.
    ///
    /// # Errors
    /// Returns a `ModelError` when both attempts fail.
    pub async fn complete_chat(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, ModelError> {
        let params = ModelParameters::new(temperature, self.max_tokens);
        let attempt = || async {
            let call = self.model.generate_chat_completion(messages, Some(params.clone()));
            match timeout(self.llm_timeout, call).await {
                Ok(result) => result.map(|r| r.content),
                Err(_) => Err(ModelError::Timeout {
                    provider: self.model.model_id().to_string(),
                    seconds: self.llm_timeout.as_secs(),
                }),
            }
        };
        match attempt().await {
            Ok(text) => Ok(text),
            Err(e) if e.is_retryable() => {
                warn!(error = %e, "chat completion failed, retrying once");
                attempt().await
            }
            Err(e) => Err(e),
        }
    }

    /// Generates a JSON-shaped completion and parses it tolerantly.
    ///
    /// On any failure (transport, shape, parse) the provided `default` is
    /// returned, so classification and metadata paths never stall the turn.
    pub async fn complete_json(
        &self,
        prompt: &str,
        temperature: f32,
        default: serde_json::Value,
    ) -> serde_json::Value {
        let params =
            ModelParameters::new(temperature, self.max_tokens).with_json_output();
        match self.complete_once(prompt, params).await {
            Ok(text) => extract_json(&text).unwrap_or_else(|| {
                warn!(response_len = text.len(), "completion carried no parseable JSON");
                default
            }),
            Err(e) => {
                warn!(error = %e, "JSON completion failed, using default record");
                default
            }
        }
    }

    async fn complete_once(
        &self,
        prompt: &str,
        params: ModelParameters,
    ) -> Result<String, ModelError> {
        debug!(
            model_id = %self.model.model_id(),
            prompt_len = prompt.len(),
            "LLM completion"
        );
        let call = self.model.generate_text(prompt, Some(params));
        match timeout(self.llm_timeout, call).await {
            Ok(result) => result.map(|r| r.content),
            Err(_) => Err(ModelError::Timeout {
                provider: self.model.model_id().to_string(),
                seconds: self.llm_timeout.as_secs(),
            }),
        }
    }
}

/// Tolerant JSON extraction: take the slice from the first `{` to the last
/// `}` and parse it. Models decorate JSON with prose and code fences often
/// enough that strict parsing loses real answers.
#[must_use]
pub fn extract_json(text: &str) -> Option<serde_json::Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_models::MockModel;

    fn client_with(responses: Vec<String>) -> LlmClient {
        let model = Arc::new(MockModel::with_canned_responses(
            "mock-model".to_string(),
            responses,
        ));
        LlmClient::new(model, &OrchestratorConfig::default())
    }

    #[test]
    fn test_extract_json_from_fenced_block() {
        let text = "Here you go:\n```json\n{\"interaction_type\": \"example_request\"}\n```";
        let value = extract_json(text).unwrap();
        assert_eq!(value["interaction_type"], "example_request");
    }

    #[test]
    fn test_extract_json_rejects_garbage() {
        assert!(extract_json("no braces here").is_none());
        assert!(extract_json("} backwards {").is_none());
        assert!(extract_json("{not json}").is_none());
    }

    #[tokio::test]
    async fn test_complete_returns_model_text() {
        let client = client_with(vec!["daylight matters".to_string()]);
        let text = client.complete("why does daylight matter?", 0.3).await.unwrap();
        assert_eq!(text, "daylight matters");
    }

    #[tokio::test]
    async fn test_complete_json_falls_back_to_default() {
        let client = client_with(vec!["not json at all".to_string()]);
        let default = serde_json::json!({"understanding_level": "medium"});
        let value = client.complete_json("classify", 0.2, default.clone()).await;
        assert_eq!(value, default);
    }

    #[tokio::test]
    async fn test_complete_json_parses_decorated_output() {
        let client =
            client_with(vec!["Sure! {\"confidence_level\": \"uncertain\"} hope that helps".to_string()]);
        let value = client
            .complete_json("classify", 0.2, serde_json::json!({}))
            .await;
        assert_eq!(value["confidence_level"], "uncertain");
    }
}
