//! Language-model access for plan synthesis.
//!
//! Plan synthesis only needs `generate(prompt) -> text`; any provider that
//! can do that plugs in through [`TextGenerator`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("model request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model returned no content")]
    EmptyResponse,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Fixed user turn sent after the instruction prompt.
const USER_TURN: &str = "Generate the travel plan.";

/// Chat-completions client for OpenAI-compatible endpoints (OpenRouter, OpenAI).
pub struct OpenAiCompatClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GenerateError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, GenerateError> {
        if config.llm_api_key.is_empty() {
            tracing::warn!("No model API key configured; plan generation requests will fail");
        }
        Self::new(
            config.llm_base_url.clone(),
            config.llm_api_key.clone(),
            config.llm_model.clone(),
            Duration::from_secs(config.llm_timeout_s.max(1)),
        )
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt },
                { "role": "user", "content": USER_TURN },
            ],
            "response_format": { "type": "json_object" },
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Requesting completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerateError::EmptyResponse)
    }
}
