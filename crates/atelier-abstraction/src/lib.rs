//! Model abstraction layer for Atelier.
//!
//! This module defines the core traits and types for interacting with AI models.
//! The tutoring engine never talks to a provider directly; it only sees the
//! [`Model`] and [`EmbeddingModel`] traits defined here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Represents an error that can occur when interacting with an AI model.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelError {
    /// An error occurred during the API request (e.g., network issues, invalid request).
    #[error("Request Error: {0}")]
    RequestError(String),

    /// The model returned an error (e.g., invalid input, rate limiting).
    #[error("Model Response Error: {0}")]
    ModelResponseError(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization Error: {0}")]
    SerializationError(String),

    /// The model provider is not supported or configured.
    #[error("Unsupported Model Provider: {0}")]
    UnsupportedModelProvider(String),

    /// Provider quota exceeded or rate limit hit (hard stop error).
    #[error("Provider '{provider}' quota exceeded{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
    QuotaExceeded {
        /// The provider name (e.g., "openai").
        provider: String,
        /// Optional error message from the provider.
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// The request did not complete within the configured deadline.
    #[error("Request to '{provider}' timed out after {seconds}s")]
    Timeout {
        /// The provider name.
        provider: String,
        /// The deadline that was exceeded, in seconds.
        seconds: u64,
    },

    /// Other unexpected errors.
    #[error("Other Model Error: {0}")]
    Other(String),
}

impl ModelError {
    /// Returns `true` when a retry against the same provider could succeed.
    ///
    /// Quota and unsupported-provider errors are hard stops; transport-level
    /// failures and timeouts are worth one more attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ModelError::RequestError(_) | ModelError::Timeout { .. }
        )
    }
}

/// One turn of a provider-facing conversation.
///
/// Distinct from the session's own `Message` type: this is the wire shape
/// the orchestrator flattens history into when it calls a chat model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker tag the provider understands: "system", "user", or
    /// "assistant".
    pub role: String,
    /// The turn's text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    #[must_use]
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// Shape the caller expects the completion in.
///
/// The classification pipeline asks for [`ResponseFormat::Json`] so its
/// tolerant extractor has something structured to parse; everything
/// learner-facing stays [`ResponseFormat::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseFormat {
    /// Free prose, the default for tutoring output.
    Text,
    /// A JSON object, best effort; no schema is enforced.
    Json,
}

/// Knobs the orchestrator turns per call site.
///
/// The tutoring engine uses three presets: cool for classification, the
/// default for grounded knowledge, warm for Socratic questions and
/// challenges. Anything left `None` falls to the provider's own default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Sampling temperature. Classification runs cool (0.2), knowledge
    /// synthesis at the 0.3 default, question generation warm (0.7).
    pub temperature: Option<f32>,

    /// Nucleus-sampling cutoff; left at 1.0 so temperature alone steers
    /// variety.
    pub top_p: Option<f32>,

    /// Ceiling on completion length, in tokens. The orchestrator's word
    /// budget trims after the fact; this keeps the provider bill bounded
    /// before it.
    pub max_tokens: Option<u32>,

    /// Requested completion shape; omitted from the wire when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,

    /// Sequences that end generation early when the model emits them.
    pub stop_sequences: Option<Vec<String>>,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            temperature: Some(0.3),
            top_p: Some(1.0),
            max_tokens: Some(1200),
            response_format: None,
            stop_sequences: None,
        }
    }
}

impl ModelParameters {
    /// Creates parameters with the given temperature and token ceiling.
    #[must_use]
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
            ..Self::default()
        }
    }

    /// Requests a JSON-shaped completion.
    #[must_use]
    pub fn with_json_output(mut self) -> Self {
        self.response_format = Some(ResponseFormat::Json);
        self
    }
}

/// Token accounting for one call, as the provider reports it.
///
/// The orchestrator treats these as opaque counters: `LlmClient` passes
/// them through on [`ModelResponse`] so the hosting layer can meter a
/// session, and the mock fabricates plausible ones for tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelUsage {
    /// Tokens the request itself consumed (brief, history, instructions).
    pub prompt_tokens: u32,

    /// Tokens the model generated in reply.
    pub completion_tokens: u32,

    /// The provider's own total for the call; kept rather than derived
    /// because some providers bill tokens the two parts don't cover.
    pub total_tokens: u32,
}

/// The response from a text generation or chat completion model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The completion text the agents work with.
    pub content: String,

    /// Which model actually answered, when the provider says.
    pub model_id: Option<String>,

    /// Token accounting for the call, when the provider reports it.
    pub usage: Option<ModelUsage>,

    /// Whatever else the provider attached (finish_reason and friends),
    /// kept loose as JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl ModelResponse {
    /// Creates a bare response carrying only content.
    #[must_use]
    pub fn text<S: Into<String>>(content: S) -> Self {
        Self { content: content.into(), model_id: None, usage: None, metadata: None }
    }

    /// Gets the finish reason from metadata, if available.
    ///
    /// Common values: "stop", "length", "content_filter".
    pub fn get_finish_reason(&self) -> Option<String> {
        self.metadata
            .as_ref()?
            .get("finish_reason")?
            .as_str()
            .map(String::from)
    }
}

/// A trait for interacting with different AI models.
///
/// All models must be `Send + Sync` to allow concurrent use across threads.
/// The tutoring core issues exactly one completion per call; there is no
/// streaming surface.
#[async_trait]
pub trait Model: Send + Sync {
    /// Generates a text completion based on the given prompt.
    ///
    /// # Arguments
    /// * `prompt` - The input prompt for text generation
    /// * `parameters` - Optional parameters to control generation
    ///
    /// # Errors
    /// Returns a `ModelError` if generation fails.
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError>;

    /// Generates a chat completion based on the given conversation history.
    ///
    /// # Arguments
    /// * `messages` - The conversation history as a slice of chat messages
    /// * `parameters` - Optional parameters to control generation
    ///
    /// # Errors
    /// Returns a `ModelError` if generation fails.
    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError>;

    /// Returns the ID of the model.
    fn model_id(&self) -> &str;
}

/// A trait for models that can embed text into vectors.
///
/// Kept separate from [`Model`] so text-only providers (and the mock used in
/// tests) do not have to stub vector support.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Embeds a batch of texts into vectors.
    ///
    /// The returned vectors are in the same order as the input texts.
    ///
    /// # Errors
    /// Returns a `ModelError` if the embedding call fails.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_constructors() {
        let msg = ChatMessage::user("Hello");
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content, "Hello");

        let msg = ChatMessage::system("You are a tutor");
        assert_eq!(msg.role, "system");

        let msg = ChatMessage::assistant("Hi!");
        assert_eq!(msg.role, "assistant");
    }

    #[test]
    fn test_model_parameters_default() {
        let params = ModelParameters::default();
        assert_eq!(params.temperature, Some(0.3));
        assert_eq!(params.max_tokens, Some(1200));
        assert_eq!(params.response_format, None);
    }

    #[test]
    fn test_model_parameters_json_output() {
        let params = ModelParameters::new(0.2, 400).with_json_output();
        assert_eq!(params.temperature, Some(0.2));
        assert_eq!(params.max_tokens, Some(400));
        assert_eq!(params.response_format, Some(ResponseFormat::Json));
    }

    #[test]
    fn test_parameters_serialization_round_trip() {
        let params = ModelParameters::new(0.6, 800);
        let json = serde_json::to_string(&params).unwrap();
        let deserialized: ModelParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.temperature, Some(0.6));
        assert_eq!(deserialized.max_tokens, Some(800));
    }

    #[test]
    fn test_get_finish_reason() {
        let mut metadata = HashMap::new();
        metadata.insert(
            "finish_reason".to_string(),
            serde_json::Value::String("stop".to_string()),
        );

        let response = ModelResponse {
            content: "Test".to_string(),
            model_id: None,
            usage: None,
            metadata: Some(metadata),
        };

        assert_eq!(response.get_finish_reason(), Some("stop".to_string()));
    }

    #[test]
    fn test_get_finish_reason_missing() {
        let response = ModelResponse::text("Test");
        assert_eq!(response.get_finish_reason(), None);
    }

    #[test]
    fn test_error_retryability() {
        assert!(ModelError::RequestError("connection reset".to_string()).is_retryable());
        assert!(ModelError::Timeout { provider: "openai".to_string(), seconds: 20 }.is_retryable());
        assert!(!ModelError::QuotaExceeded { provider: "openai".to_string(), message: None }
            .is_retryable());
        assert!(!ModelError::ModelResponseError("bad input".to_string()).is_retryable());
    }

    #[test]
    fn test_quota_error_display() {
        let err = ModelError::QuotaExceeded {
            provider: "openai".to_string(),
            message: Some("monthly cap reached".to_string()),
        };
        let text = err.to_string();
        assert!(text.contains("openai"));
        assert!(text.contains("monthly cap reached"));
    }
}
