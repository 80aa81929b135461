//! Model factory for creating model instances from configuration.
//!
//! This module provides functionality to create model instances based on
//! configuration, handling API key loading from environment variables.

use crate::{MockModel, OpenAIModel};
use atelier_abstraction::{Model, ModelError};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Model type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelType {
    /// Mock model for testing.
    Mock,
    /// OpenAI or OpenAI-compatible model.
    OpenAI,
}

impl FromStr for ModelType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "openai" | "openai-compatible" => Ok(Self::OpenAI),
            _ => Err(()),
        }
    }
}

/// Model configuration.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// The type of model to create.
    pub model_type: ModelType,
    /// The model ID (e.g., "gpt-4o").
    pub model_id: String,
    /// Optional API key (if not provided, will be loaded from environment).
    pub api_key: Option<String>,
    /// Optional base URL for OpenAI-compatible endpoints.
    pub base_url: Option<String>,
    /// Optional per-request deadline.
    pub timeout: Option<Duration>,
}

impl ModelConfig {
    /// Creates a new `ModelConfig` with the given type and model ID.
    ///
    /// # Arguments
    /// * `model_type` - The type of model
    /// * `model_id` - The model ID
    #[must_use]
    pub fn new(model_type: ModelType, model_id: String) -> Self {
        Self { model_type, model_id, api_key: None, base_url: None, timeout: None }
    }

    /// Sets the API key for this configuration.
    #[must_use]
    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Sets the base URL for this configuration.
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Sets the per-request deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Factory for creating model instances.
pub struct ModelFactory;

impl ModelFactory {
    /// Creates a model instance from a configuration.
    ///
    /// # Arguments
    /// * `config` - The model configuration
    ///
    /// # Errors
    /// Returns a `ModelError` if the model cannot be created (e.g., missing API key).
    pub fn create(config: &ModelConfig) -> Result<Arc<dyn Model>, ModelError> {
        debug!(model_type = ?config.model_type, model_id = %config.model_id, "Creating model");

        match config.model_type {
            ModelType::Mock => Ok(Arc::new(MockModel::new(config.model_id.clone()))),
            ModelType::OpenAI => {
                let mut model = match &config.api_key {
                    Some(key) => {
                        OpenAIModel::with_api_key(config.model_id.clone(), key.clone())
                    }
                    None => OpenAIModel::new(config.model_id.clone())?,
                };
                if let Some(base_url) = &config.base_url {
                    model = model.with_base_url(base_url.clone());
                }
                if let Some(timeout) = config.timeout {
                    model = model.with_timeout(timeout);
                }
                Ok(Arc::new(model))
            }
        }
    }

    /// Creates a model from an engine name and model ID.
    ///
    /// # Arguments
    /// * `engine` - The engine name (e.g., "openai", "mock")
    /// * `model_id` - The model ID
    ///
    /// # Errors
    /// Returns a `ModelError` if the engine is unknown or the model cannot be created.
    pub fn create_from_str(engine: &str, model_id: String) -> Result<Arc<dyn Model>, ModelError> {
        let model_type = ModelType::from_str(engine).map_err(|()| {
            ModelError::UnsupportedModelProvider(format!("Unsupported engine: {engine}"))
        })?;
        Self::create(&ModelConfig::new(model_type, model_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_type_parsing() {
        assert_eq!(ModelType::from_str("mock"), Ok(ModelType::Mock));
        assert_eq!(ModelType::from_str("OpenAI"), Ok(ModelType::OpenAI));
        assert_eq!(ModelType::from_str("openai-compatible"), Ok(ModelType::OpenAI));
        assert!(ModelType::from_str("unknown").is_err());
    }

    #[test]
    fn test_create_mock_model() {
        let model = ModelFactory::create_from_str("mock", "mock-model".to_string()).unwrap();
        assert_eq!(model.model_id(), "mock-model");
    }

    #[test]
    fn test_create_openai_with_explicit_key() {
        let config = ModelConfig::new(ModelType::OpenAI, "gpt-4o".to_string())
            .with_api_key("test-key".to_string())
            .with_timeout(Duration::from_secs(5));
        let model = ModelFactory::create(&config).unwrap();
        assert_eq!(model.model_id(), "gpt-4o");
    }

    #[test]
    fn test_unknown_engine_is_rejected() {
        let result = ModelFactory::create_from_str("gemini", "gemini-pro".to_string());
        assert!(matches!(result, Err(ModelError::UnsupportedModelProvider(_))));
    }
}
