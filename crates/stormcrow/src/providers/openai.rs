use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use super::base::{Provider, Usage};
use super::configs::OpenAiProviderConfig;
use super::utils::{
    check_openai_context_length_error, create_request, get_usage, openai_response_to_text,
};
use crate::models::message::Message;

pub const OPENAI_HOST: &str = "https://api.openai.com";
pub const OPENAI_MODEL: &str = "gpt-4o";

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
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

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            status => {
                let body: Value = response.json().await.unwrap_or(Value::Null);
                if let Some(err) = body.get("error").and_then(check_openai_context_length_error) {
                    return Err(err.into());
                }
                Err(anyhow!("Request failed: {}\nResponse: {}", status, body))
            }
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, messages: &[Message], schema: &Value) -> Result<(String, Usage)> {
        let payload = create_request(
            &self.config.model,
            messages,
            schema,
            self.config.temperature,
            self.config.max_tokens,
        );

        let response = self.post(payload).await?;

        // Raise specific error if context length is exceeded
        if let Some(error) = response.get("error") {
            if let Some(err) = check_openai_context_length_error(error) {
                return Err(err.into());
            }
            return Err(anyhow!("OpenAI API error: {}", error));
        }

        let text = openai_response_to_text(&response)?;
        let usage = get_usage(&response)?;
        tracing::debug!(model = %self.config.model, ?usage, "openai completion");

        Ok((text, usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::step::Step;
    use crate::providers::utils::ContextLengthExceededError;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(host: String) -> OpenAiProvider {
        OpenAiProvider::new(OpenAiProviderConfig {
            host,
            api_key: "test_api_key".to_string(),
            model: "gpt-4o".to_string(),
            temperature: Some(0.7),
            max_tokens: None,
        })
        .unwrap()
    }

    async fn _setup_mock_server(status: u16, response_body: Value) -> (MockServer, OpenAiProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test_api_key"))
            .respond_with(ResponseTemplate::new(status).set_body_json(response_body))
            .mount(&mock_server)
            .await;

        let provider = provider_for(mock_server.uri());
        (mock_server, provider)
    }

    #[tokio::test]
    async fn test_complete_step() -> Result<()> {
        let response_body = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "{\"step\":\"START\",\"content\":\"Weather in Paris?\",\"tool\":null,\"input\":null}",
                    "refusal": null
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 12,
                "completion_tokens": 15,
                "total_tokens": 27
            }
        });

        let (_server, provider) = _setup_mock_server(200, response_body).await;

        let messages = vec![
            Message::system("You are a weather assistant."),
            Message::user("Weather in Paris?"),
        ];
        let (raw, usage) = provider.complete(&messages, &Step::schema()).await?;

        assert_eq!(Step::decode(&raw)?, Step::start("Weather in Paris?"));
        assert_eq!(usage.input_tokens, Some(12));
        assert_eq!(usage.output_tokens, Some(15));
        assert_eq!(usage.total_tokens, Some(27));

        Ok(())
    }

    #[tokio::test]
    async fn test_complete_sends_schema() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "messages": [{"role": "user", "content": "Hi"}],
                "response_format": {"type": "json_schema"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"step\":\"OUTPUT\",\"content\":\"Hello\"}"}}],
                "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = provider_for(mock_server.uri());
        let (raw, _) = provider
            .complete(&[Message::user("Hi")], &Step::schema())
            .await?;
        assert_eq!(Step::decode(&raw)?, Step::output("Hello"));
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_context_length_error() {
        let (_server, provider) = _setup_mock_server(
            400,
            json!({
                "error": {
                    "code": "context_length_exceeded",
                    "message": "This model's maximum context length is 128000 tokens."
                }
            }),
        )
        .await;

        let err = provider
            .complete(&[Message::user("Hi")], &Step::schema())
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ContextLengthExceededError>().is_some());
    }

    #[tokio::test]
    async fn test_complete_server_error() {
        let (_server, provider) = _setup_mock_server(503, json!({})).await;

        let err = provider
            .complete(&[Message::user("Hi")], &Step::schema())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Server error"));
    }
}
