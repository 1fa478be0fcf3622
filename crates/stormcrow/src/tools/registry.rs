use std::collections::BTreeMap;

use super::{Tool, ToolInfo};
use crate::errors::{AgentError, AgentResult};

/// The tools available to one agent, keyed by name
///
/// Built up front with [`ToolRegistry::with_tool`] and then handed to the agent,
/// which only reads from it.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. A tool registered under an existing name replaces the old one.
    pub fn with_tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), Box::new(tool)).is_some() {
            tracing::warn!(tool = %name, "replacing previously registered tool");
        }
        self
    }

    pub fn resolve(&self, name: &str) -> AgentResult<&dyn Tool> {
        self.tools
            .get(name)
            .map(|tool| &**tool)
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))
    }

    pub async fn invoke(&self, name: &str, input: &str) -> AgentResult<String> {
        let tool = self.resolve(name)?;
        tracing::debug!(tool = name, input, "invoking tool");
        Ok(tool.invoke(input).await)
    }

    /// Tools in name order
    pub fn tools(&self) -> Vec<ToolInfo> {
        self.tools
            .values()
            .map(|tool| ToolInfo::new(tool.name(), tool.description()))
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes back the input"
        }

        async fn invoke(&self, input: &str) -> String {
            input.to_string()
        }
    }

    struct ShoutTool;

    #[async_trait]
    impl Tool for ShoutTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes back the input, loudly"
        }

        async fn invoke(&self, input: &str) -> String {
            input.to_uppercase()
        }
    }

    #[tokio::test]
    async fn test_invoke_registered_tool() -> anyhow::Result<()> {
        let registry = ToolRegistry::new().with_tool(EchoTool);
        assert_eq!(registry.invoke("echo", "hello").await?, "hello");
        Ok(())
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let registry = ToolRegistry::new().with_tool(EchoTool);
        let err = registry.invoke("get_stock_price", "AAPL").await.unwrap_err();
        assert!(matches!(err, AgentError::UnknownTool(name) if name == "get_stock_price"));
    }

    #[test]
    fn test_resolve() {
        let registry = ToolRegistry::new().with_tool(EchoTool);
        assert_eq!(registry.resolve("echo").unwrap().name(), "echo");
        assert!(registry.resolve("Echo").is_err());
    }

    #[tokio::test]
    async fn test_later_registration_replaces() -> anyhow::Result<()> {
        let registry = ToolRegistry::new().with_tool(EchoTool).with_tool(ShoutTool);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.invoke("echo", "hi").await?, "HI");
        Ok(())
    }

    #[test]
    fn test_tools_listing() {
        let registry = ToolRegistry::new().with_tool(EchoTool);
        assert_eq!(
            registry.tools(),
            vec![ToolInfo::new("echo", "Echoes back the input")]
        );
        assert_eq!(registry.names(), vec!["echo"]);
        assert!(ToolRegistry::new().is_empty());
    }
}
