use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use super::base::Usage;
use crate::models::message::Message;

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role,
                "content": message.content,
            })
        })
        .collect()
}

/// Wrap a JSON schema into an OpenAI strict structured-output response format
pub fn response_format(schema: &Value) -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "agent_step",
            "strict": true,
            "schema": schema,
        }
    })
}

/// Build a chat completion payload, leaving out unset sampling parameters
pub fn create_request(
    model: &str,
    messages: &[Message],
    schema: &Value,
    temperature: Option<f32>,
    max_tokens: Option<i32>,
) -> Value {
    let mut payload = json!({
        "model": model,
        "messages": messages_to_openai_spec(messages),
        "response_format": response_format(schema),
    });

    if let Some(object) = payload.as_object_mut() {
        if let Some(temp) = temperature {
            object.insert("temperature".to_string(), json!(temp));
        }
        if let Some(tokens) = max_tokens {
            object.insert("max_tokens".to_string(), json!(tokens));
        }
    }

    payload
}

/// Extract the raw reply text from an OpenAI chat completion response
pub fn openai_response_to_text(response: &Value) -> Result<String> {
    let message = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| anyhow!("No message in response: {}", response))?;

    if let Some(refusal) = message.get("refusal").and_then(Value::as_str) {
        return Err(anyhow!("Model refused to answer: {}", refusal));
    }

    message
        .get("content")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| anyhow!("No text content in response message: {}", message))
}

pub fn get_usage(data: &Value) -> Result<Usage> {
    let usage = data
        .get("usage")
        .ok_or_else(|| anyhow!("No usage data in response"))?;

    let input_tokens = usage
        .get("prompt_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let output_tokens = usage
        .get("completion_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let total_tokens = usage
        .get("total_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32)
        .or_else(|| match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        });

    Ok(Usage::new(input_tokens, output_tokens, total_tokens))
}

#[derive(Debug, thiserror::Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ContextLengthExceededError(message))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::step::Step;

    #[test]
    fn test_messages_to_openai_spec() {
        let messages = vec![
            Message::system("You are a weather assistant."),
            Message::user("Weather in Delhi?"),
            Message::assistant(r#"{"step":"START","content":"Weather in Delhi?"}"#),
        ];
        let spec = messages_to_openai_spec(&messages);

        assert_eq!(spec.len(), 3);
        assert_eq!(spec[0]["role"], "system");
        assert_eq!(spec[1]["role"], "user");
        assert_eq!(spec[1]["content"], "Weather in Delhi?");
        assert_eq!(spec[2]["role"], "assistant");
        assert_eq!(
            spec[2]["content"],
            r#"{"step":"START","content":"Weather in Delhi?"}"#
        );
    }

    #[test]
    fn test_create_request() {
        let messages = vec![Message::user("Hi")];
        let payload = create_request("gpt-4o", &messages, &Step::schema(), Some(0.2), None);

        assert_eq!(payload["model"], "gpt-4o");
        assert_eq!(payload["messages"][0]["content"], "Hi");
        assert_eq!(payload["response_format"]["type"], "json_schema");
        assert_eq!(payload["response_format"]["json_schema"]["strict"], true);
        assert_eq!(
            payload["response_format"]["json_schema"]["schema"],
            Step::schema()
        );
        assert!((payload["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert!(payload.get("max_tokens").is_none());
    }

    #[test]
    fn test_openai_response_to_text() -> Result<()> {
        let response = json!({
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "{\"step\":\"PLAN\",\"content\":\"thinking\"}",
                    "refusal": null
                }
            }]
        });

        let text = openai_response_to_text(&response)?;
        assert_eq!(text, "{\"step\":\"PLAN\",\"content\":\"thinking\"}");
        Ok(())
    }

    #[test]
    fn test_openai_response_refusal() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "refusal": "I can't help with that."
                }
            }]
        });

        let err = openai_response_to_text(&response).unwrap_err();
        assert!(err.to_string().contains("I can't help with that."));
    }

    #[test]
    fn test_openai_response_without_choices() {
        assert!(openai_response_to_text(&json!({"choices": []})).is_err());
        assert!(openai_response_to_text(&json!({})).is_err());
    }

    #[test]
    fn test_get_usage_computes_total() -> Result<()> {
        let usage = get_usage(&json!({
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        }))?;
        assert_eq!(usage.total_tokens, Some(15));
        assert!(get_usage(&json!({})).is_err());
        Ok(())
    }

    #[test]
    fn test_check_openai_context_length_error() {
        let error = json!({
            "code": "context_length_exceeded",
            "message": "This message is too long"
        });

        let result = check_openai_context_length_error(&error);
        assert!(result.is_some());
        assert_eq!(
            result.unwrap().to_string(),
            "Context length exceeded. Message: This message is too long"
        );

        let error = json!({
            "code": "other_error",
            "message": "Some other error"
        });

        let result = check_openai_context_length_error(&error);
        assert!(result.is_none());
    }
}
