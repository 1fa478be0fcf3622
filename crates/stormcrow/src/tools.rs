use async_trait::async_trait;
use serde::Serialize;

pub mod registry;
pub mod weather;

pub use registry::ToolRegistry;
pub use weather::WeatherTool;

/// A capability the model can call with a TOOL step
///
/// Invocation is total: failures are reported as text in the returned string so
/// the conversation can continue with the error as the observation.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses in the `tool` field
    fn name(&self) -> &str;

    /// One line telling the model what the tool does and what input it takes
    fn description(&self) -> &str;

    /// Run the tool with the raw `input` string from the TOOL step
    async fn invoke(&self, input: &str) -> String;
}

/// Name and description of a registered tool, as rendered into the system prompt
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

impl ToolInfo {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}
