use super::role::Role;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message to or from an LLM
///
/// The content is kept exactly as it was produced: free text for the system
/// instruction and the user's question, the raw JSON for model steps and the
/// serialized observation for tool results.
pub struct Message {
    pub role: Role,
    pub created: i64,
    pub content: String,
}

impl Message {
    fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Message {
            role,
            created: Utc::now().timestamp(),
            content: content.into(),
        }
    }

    /// Create a new system message with the current timestamp
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a new user message with the current timestamp
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message with the current timestamp
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn text(&self) -> &str {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_constructors_set_role() {
        assert_eq!(Message::system("s").role, Role::System);
        assert_eq!(Message::user("u").role, Role::User);
        assert_eq!(Message::assistant("a").role, Role::Assistant);
        assert_eq!(Message::user("hello").text(), "hello");
    }

    #[test]
    fn test_role_serializes_lowercase() -> anyhow::Result<()> {
        let value = serde_json::to_value(Message::assistant("{}"))?;
        assert_eq!(value["role"], json!("assistant"));
        assert_eq!(value["content"], json!("{}"));
        Ok(())
    }
}
