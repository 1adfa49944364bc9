//! Ollama client implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use ragrade_core::{Error, GenerationConfig, GenerationResult, LLMProvider, Result};

use crate::config::OllamaConfig;

/// Ollama client
pub struct OllamaClient {
    config: OllamaConfig,
    client: Client,
    connected: bool,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client from configuration
    pub fn new(config: OllamaConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            config,
            client,
            connected: false,
        })
    }

    /// Create a new Ollama client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = OllamaConfig::from_env()?;
        Self::new(config)
    }

    /// Set the model to use for generation
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Whether `connect` has succeeded
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn default_generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            model_id: self.config.model.clone(),
            temperature: self.config.temperature,
            timeout: Duration::from_secs(self.config.timeout_secs),
            ..Default::default()
        }
    }

    /// Perform the actual generation request
    async fn perform_generation(&self, prompt: &str, config: &GenerationConfig) -> Result<GenerationResult> {
        let request_body = GenerateRequest {
            model: &config.model_id,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: config.max_tokens,
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                stop: config.stop_sequences.clone(),
            },
        };

        debug!(model = %config.model_id, prompt_chars = prompt.chars().count(), "sending generation request");

        let response = self
            .client
            .post(self.config.endpoint("api/generate"))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::LLMProvider(format!(
                "Ollama request failed with status {}: {}",
                status, error_text
            )));
        }

        let data: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        Ok(GenerationResult {
            text: data.response,
            model_id: config.model_id.clone(),
            tokens_used: data.eval_count,
        })
    }
}

#[async_trait]
impl LLMProvider for OllamaClient {
    async fn connect(&mut self) -> Result<()> {
        let response = self
            .client
            .get(self.config.endpoint("api/tags"))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Cannot reach Ollama at {}: {}", self.config.base_url, e)))?;

        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "Ollama health check failed: {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let wanted = &self.config.model;
        let available = tags
            .models
            .iter()
            .any(|m| m.name == *wanted || m.name.split(':').next() == Some(wanted.as_str()));
        if !available {
            return Err(Error::Configuration(format!(
                "Model '{}' is not available on the Ollama server; run `ollama pull {}`",
                wanted, wanted
            )));
        }

        self.connected = true;
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
        let config = self.default_generation_config();
        self.generate_with_config(prompt, &config).await
    }

    async fn generate_with_config(&self, prompt: &str, config: &GenerationConfig) -> Result<GenerationResult> {
        match timeout(config.timeout, self.perform_generation(prompt, config)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout("Request timed out".to_string())),
        }
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_url() {
        let config = OllamaConfig::new("not a url", "llama2");
        assert!(matches!(OllamaClient::new(config), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_with_model() {
        let client = OllamaClient::new(OllamaConfig::default())
            .unwrap()
            .with_model("qwen2.5:7b");
        assert_eq!(client.model_id(), "qwen2.5:7b");
        assert!(!client.is_connected());
    }

    #[test]
    fn test_default_generation_config_uses_client_settings() {
        let mut config = OllamaConfig::new("http://localhost:11434", "mistral");
        config.timeout_secs = 30;
        config.temperature = Some(0.1);
        let client = OllamaClient::new(config).unwrap();

        let generation = client.default_generation_config();
        assert_eq!(generation.model_id, "mistral");
        assert_eq!(generation.timeout, Duration::from_secs(30));
        assert_eq!(generation.temperature, Some(0.1));
    }
}
