//! OpenAI model implementation.
//!
//! This module provides an implementation of the `Model` and `EmbeddingModel`
//! traits for OpenAI's API and OpenAI-compatible endpoints.

use async_trait::async_trait;
use atelier_abstraction::{
    ChatMessage, EmbeddingModel, Model, ModelError, ModelParameters, ModelResponse, ModelUsage,
    ResponseFormat,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{debug, error};

/// Default per-request deadline; the orchestrator fails fast past this.
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// OpenAI model implementation.
#[derive(Debug, Clone)]
pub struct OpenAIModel {
    /// The model ID (e.g., "gpt-4o").
    model_id: String,
    /// The embedding model ID used by [`EmbeddingModel::embed`].
    embedding_model_id: String,
    /// The API key for authentication.
    api_key: String,
    /// The base URL for the OpenAI API.
    base_url: String,
    /// Per-request deadline.
    timeout: Duration,
    /// HTTP client for making requests.
    client: Client,
}

impl OpenAIModel {
    /// Creates a new `OpenAIModel` with the given model ID.
    ///
    /// # Arguments
    /// * `model_id` - The OpenAI model ID to use (e.g., "gpt-4o")
    ///
    /// # Errors
    /// Returns a `ModelError` if the API key is not found in environment variables.
    pub fn new(model_id: String) -> Result<Self, ModelError> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            ModelError::UnsupportedModelProvider(
                "OPENAI_API_KEY environment variable not set".to_string(),
            )
        })?;

        Ok(Self::with_api_key(model_id, api_key))
    }

    /// Creates a new `OpenAIModel` with a custom API key.
    ///
    /// # Arguments
    /// * `model_id` - The OpenAI model ID to use
    /// * `api_key` - The API key for authentication
    #[must_use]
    pub fn with_api_key(model_id: String, api_key: String) -> Self {
        Self {
            model_id,
            embedding_model_id: "text-embedding-3-small".to_string(),
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            client: Client::new(),
        }
    }

    /// Sets the base URL (for OpenAI-compatible endpoints and tests).
    ///
    /// # Arguments
    /// * `base_url` - The base URL for the API endpoint (e.g., "http://localhost:8000/v1")
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Sets the per-request deadline.
    ///
    /// # Arguments
    /// * `timeout` - The deadline after which a request fails with `ModelError::Timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the embedding model ID.
    ///
    /// # Arguments
    /// * `embedding_model_id` - The model used for `embed` calls
    #[must_use]
    pub fn with_embedding_model(mut self, embedding_model_id: String) -> Self {
        self.embedding_model_id = embedding_model_id;
        self
    }

    /// Maps a non-success HTTP status to the right `ModelError`.
    fn map_error_status(status: reqwest::StatusCode, error_text: String) -> ModelError {
        // Quota and rate-limit responses are hard stops for the caller;
        // everything else is a plain response error.
        if status == 402 || status == 429 {
            return ModelError::QuotaExceeded {
                provider: "openai".to_string(),
                message: Some(error_text),
            };
        }
        ModelError::ModelResponseError(format!("API error ({}): {}", status, error_text))
    }

    fn map_transport_error(&self, e: &reqwest::Error) -> ModelError {
        if e.is_timeout() {
            ModelError::Timeout { provider: "openai".to_string(), seconds: self.timeout.as_secs() }
        } else {
            ModelError::RequestError(format!("Network error: {}", e))
        }
    }
}

#[async_trait]
impl Model for OpenAIModel {
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.model_id,
            prompt_len = prompt.len(),
            "OpenAIModel generating text"
        );

        // Convert single prompt to chat format for OpenAI
        let messages = vec![ChatMessage::user(prompt)];
        self.generate_chat_completion(&messages, parameters).await
    }

    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.model_id,
            message_count = messages.len(),
            "OpenAIModel generating chat completion"
        );

        let url = format!("{}/chat/completions", self.base_url);

        let openai_messages: Vec<OpenAIMessage> = messages
            .iter()
            .map(|msg| OpenAIMessage { role: msg.role.clone(), content: msg.content.clone() })
            .collect();

        let mut request_body = OpenAIRequest {
            model: self.model_id.clone(),
            messages: openai_messages,
            temperature: None,
            top_p: None,
            max_tokens: None,
            response_format: None,
            stop: None,
        };

        if let Some(params) = parameters {
            request_body.temperature = params.temperature;
            request_body.top_p = params.top_p;
            request_body.max_tokens = params.max_tokens;
            request_body.stop = params.stop_sequences;
            if params.response_format == Some(ResponseFormat::Json) {
                request_body.response_format =
                    Some(OpenAIResponseFormat { kind: "json_object".to_string() });
            }
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to OpenAI API");
                self.map_transport_error(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "OpenAI API returned error status");
            return Err(Self::map_error_status(status, error_text));
        }

        let openai_response: OpenAIChatResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse OpenAI API response");
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        let content = openai_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| {
                error!("No content in OpenAI API response");
                ModelError::ModelResponseError("No content in API response".to_string())
            })?;

        let usage = openai_response.usage.map(|u| ModelUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let metadata = openai_response
            .choices
            .first()
            .and_then(|c| c.finish_reason.clone())
            .map(|reason| {
                let mut map = std::collections::HashMap::new();
                map.insert("finish_reason".to_string(), serde_json::Value::String(reason));
                map
            });

        Ok(ModelResponse { content, model_id: Some(self.model_id.clone()), usage, metadata })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl EmbeddingModel for OpenAIModel {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        debug!(
            model_id = %self.embedding_model_id,
            text_count = texts.len(),
            "OpenAIModel embedding texts"
        );

        let url = format!("{}/embeddings", self.base_url);
        let request_body = OpenAIEmbeddingRequest {
            model: self.embedding_model_id.clone(),
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Self::map_error_status(status, error_text));
        }

        let embedding_response: OpenAIEmbeddingResponse =
            response.json().await.map_err(|e| {
                ModelError::SerializationError(format!("Failed to parse response: {}", e))
            })?;

        // The API may return data out of order; restore input order by index.
        let mut data = embedding_response.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

// OpenAI API request/response structures

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAIResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)] // Matches API naming
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OpenAIEmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_model_creation_with_api_key() {
        let model = OpenAIModel::with_api_key("gpt-4o".to_string(), "test-key".to_string());
        assert_eq!(model.model_id(), "gpt-4o");
    }

    #[test]
    fn test_error_status_mapping() {
        let err = OpenAIModel::map_error_status(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            "rate limit".to_string(),
        );
        assert!(matches!(err, ModelError::QuotaExceeded { .. }));

        let err = OpenAIModel::map_error_status(
            reqwest::StatusCode::BAD_REQUEST,
            "bad request".to_string(),
        );
        assert!(matches!(err, ModelError::ModelResponseError(_)));
    }

    #[tokio::test]
    async fn test_chat_completion_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "choices": [{
                "message": {"role": "assistant", "content": "A courtyard organizes circulation."},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 8, "total_tokens": 18}
        });
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let model = OpenAIModel::with_api_key("gpt-4o".to_string(), "test-key".to_string())
            .with_base_url(server.url());

        let messages = vec![ChatMessage::user("How do courtyards work?")];
        let response = model.generate_chat_completion(&messages, None).await.unwrap();

        assert_eq!(response.content, "A courtyard organizes circulation.");
        assert_eq!(response.get_finish_reason().as_deref(), Some("stop"));
        assert_eq!(response.usage.unwrap().total_tokens, 18);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embeddings_restore_input_order() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "data": [
                {"index": 1, "embedding": [0.2, 0.2]},
                {"index": 0, "embedding": [0.1, 0.1]}
            ]
        });
        let _mock = server
            .mock("POST", "/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let model = OpenAIModel::with_api_key("gpt-4o".to_string(), "test-key".to_string())
            .with_base_url(server.url());

        let vectors = model
            .embed(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors[0], vec![0.1, 0.1]);
        assert_eq!(vectors[1], vec![0.2, 0.2]);
    }
}
