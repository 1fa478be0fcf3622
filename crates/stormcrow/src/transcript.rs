use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;
use crate::models::role::Role;
use crate::models::step::Observation;

/// The conversation for a single query
///
/// Seeded with the system instruction and the user's question, then only ever
/// appended to. The whole sequence is sent to the model on every turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new<S: Into<String>, Q: Into<String>>(system: S, query: Q) -> Self {
        Self {
            messages: vec![Message::system(system), Message::user(query)],
        }
    }

    /// Record the model's raw output exactly as it was received
    pub fn push_assistant<S: Into<String>>(&mut self, raw: S) {
        self.messages.push(Message::assistant(raw));
    }

    /// Record a tool result as an OBSERVE user message
    pub fn push_observation(&mut self, observation: &Observation) -> AgentResult<()> {
        let content = observation
            .encode()
            .map_err(|e| AgentError::Internal(e.to_string()))?;
        self.messages.push(Message::user(content));
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Roles and contents without timestamps, for comparing two runs
    pub fn shape(&self) -> Vec<(Role, String)> {
        self.messages
            .iter()
            .map(|message| (message.role, message.content.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_new_seeds_system_and_user() {
        let transcript = Transcript::new("be helpful", "weather in oslo?");
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[0].role, Role::System);
        assert_eq!(transcript.messages()[0].content, "be helpful");
        assert_eq!(transcript.messages()[1].role, Role::User);
        assert_eq!(transcript.messages()[1].content, "weather in oslo?");
    }

    #[test]
    fn test_push_assistant_is_verbatim() {
        let mut transcript = Transcript::new("s", "q");
        let raw = "  {\"step\": \"PLAN\", \"content\": \"x\"}\n";
        transcript.push_assistant(raw);

        let last = transcript.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, raw);
    }

    #[test]
    fn test_push_observation() -> anyhow::Result<()> {
        let mut transcript = Transcript::new("s", "q");
        transcript.push_observation(&Observation::new("get_weather", "paris", "Sunny +18°C"))?;

        let last = transcript.last().unwrap();
        assert_eq!(last.role, Role::User);
        let value: Value = serde_json::from_str(&last.content)?;
        assert_eq!(value["step"], json!("OBSERVE"));
        assert_eq!(value["output"], json!("Sunny +18°C"));
        Ok(())
    }

    #[test]
    fn test_shape_ignores_timestamps() {
        let mut a = Transcript::new("s", "q");
        let mut b = Transcript::new("s", "q");
        a.push_assistant("one");
        b.push_assistant("one");
        b.messages[2].created += 100;

        assert_ne!(a, b);
        assert_eq!(a.shape(), b.shape());
    }
}
