use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::message::Message;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// Base trait for AI providers (OpenAI, Ollama, etc)
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next reply for the conversation, constrained to the given JSON schema.
    ///
    /// Returns the reply text exactly as the model produced it.
    async fn complete(&self, messages: &[Message], schema: &Value) -> Result<(String, Usage)>;
}
