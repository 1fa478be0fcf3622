use super::base::{Provider, Usage};
use super::configs::OllamaProviderConfig;
use super::utils::{create_request, get_usage, openai_response_to_text};
use crate::models::message::Message;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

pub const OLLAMA_HOST: &str = "http://localhost:11434";
pub const OLLAMA_MODEL: &str = "qwen2.5";

pub struct OllamaProvider {
    client: Client,
    config: OllamaProviderConfig,
}

impl OllamaProvider {
    pub fn new(config: OllamaProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self.client.post(&url).json(&payload).send().await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            status => Err(anyhow!(
                "Request failed: {}\nResponse: {}",
                status,
                response.text().await.unwrap_or_default()
            )),
        }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn complete(&self, messages: &[Message], schema: &Value) -> Result<(String, Usage)> {
        let payload = create_request(
            &self.config.model,
            messages,
            schema,
            self.config.temperature,
            self.config.max_tokens,
        );

        let response = self.post(payload).await?;

        if let Some(error) = response.get("error") {
            return Err(anyhow!("Ollama API error: {}", error));
        }

        let text = openai_response_to_text(&response)?;
        // Older Ollama builds leave usage out of the compatible endpoint
        let usage = get_usage(&response).unwrap_or_default();
        tracing::debug!(model = %self.config.model, ?usage, "ollama completion");

        Ok((text, usage))
    }
}
