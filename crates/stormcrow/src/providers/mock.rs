use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::models::message::Message;
use crate::providers::base::{Provider, Usage};

/// A mock provider that returns pre-configured raw replies for testing
pub struct MockProvider {
    responses: Mutex<Vec<String>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of raw replies
    pub fn new<S: Into<String>>(responses: Vec<S>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// The message sequences the provider was called with, in order
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, messages: &[Message], _schema: &Value) -> Result<(String, Usage)> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(anyhow!("No more scripted responses"))
        } else {
            Ok((responses.remove(0), Usage::default()))
        }
    }
}

// Lets a test keep a handle on the mock after giving it to an agent
#[async_trait]
impl Provider for Arc<MockProvider> {
    async fn complete(&self, messages: &[Message], schema: &Value) -> Result<(String, Usage)> {
        self.as_ref().complete(messages, schema).await
    }
}
