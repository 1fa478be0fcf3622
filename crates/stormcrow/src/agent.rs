use futures::stream::BoxStream;
use futures::TryStreamExt;
use serde::Deserialize;
use std::collections::HashMap;
use strum_macros::{Display, EnumString};

use crate::errors::{AgentError, AgentResult};
use crate::models::step::{Observation, Step};
use crate::prompt_template::load_prompt_file;
use crate::providers::base::Provider;
use crate::tools::ToolRegistry;
use crate::transcript::Transcript;

pub const DEFAULT_MAX_TURNS: usize = 25;

/// What to do when the model asks for a tool that is not registered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UnknownToolPolicy {
    /// Abort the query with [`AgentError::UnknownTool`]
    Fail,
    /// Answer with an error observation so the model can pick a valid tool
    #[default]
    Observe,
}

/// Progress of a reply, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    Start(String),
    Plan(String),
    ToolCall { tool: String, input: String },
    Observation(Observation),
    Output(String),
}

/// The final answer to a query and the conversation that produced it
#[derive(Debug, Clone)]
pub struct Reply {
    pub content: String,
    pub transcript: Transcript,
}

/// Agent drives the step protocol between the LLM and the tools it may call
pub struct Agent {
    provider: Box<dyn Provider>,
    tools: ToolRegistry,
    max_turns: usize,
    unknown_tool_policy: UnknownToolPolicy,
}

impl Agent {
    /// Create a new Agent with the specified provider and tools
    pub fn new(provider: Box<dyn Provider>, tools: ToolRegistry) -> Self {
        Self {
            provider,
            tools,
            max_turns: DEFAULT_MAX_TURNS,
            unknown_tool_policy: UnknownToolPolicy::default(),
        }
    }

    /// Cap the number of model requests made for one query
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_unknown_tool_policy(mut self, policy: UnknownToolPolicy) -> Self {
        self.unknown_tool_policy = policy;
        self
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn system_prompt(&self) -> AgentResult<String> {
        let mut context = HashMap::new();
        context.insert("tools", self.tools.tools());
        load_prompt_file("system.md", &context).map_err(|e| AgentError::Internal(e.to_string()))
    }

    /// Seed a fresh transcript for a query
    pub fn start(&self, query: &str) -> AgentResult<Transcript> {
        Ok(Transcript::new(self.system_prompt()?, query))
    }

    /// Run the tool named by a TOOL step and wrap the result as an observation
    async fn observe(&self, tool: String, input: String) -> AgentResult<Observation> {
        let output = match self.tools.invoke(&tool, &input).await {
            Ok(output) => output,
            Err(AgentError::UnknownTool(name))
                if self.unknown_tool_policy == UnknownToolPolicy::Observe =>
            {
                tracing::warn!(tool = %name, "model requested an unknown tool");
                format!(
                    "Error: tool '{}' is not available. Available tools: {}",
                    name,
                    self.tools.names().join(", ")
                )
            }
            Err(e) => return Err(e),
        };
        Ok(Observation::new(tool, input, output))
    }

    /// Create a stream that yields each step of the reply as it is produced.
    ///
    /// Every model reply is appended to the transcript before it is decoded, and
    /// every tool result is appended as an OBSERVE message. The stream ends after
    /// the OUTPUT step, or with an error once `max_turns` replies produced no OUTPUT.
    pub fn reply<'a>(
        &'a self,
        transcript: &'a mut Transcript,
    ) -> BoxStream<'a, AgentResult<AgentEvent>> {
        Box::pin(async_stream::try_stream! {
            let schema = Step::schema();
            let mut turns = 0;

            loop {
                if turns == self.max_turns {
                    Err::<(), AgentError>(AgentError::TurnLimitExceeded(self.max_turns))?;
                }
                turns += 1;

                let (raw, usage) = self.provider.complete(transcript.messages(), &schema).await?;
                transcript.push_assistant(raw.as_str());

                let step = Step::decode(&raw)?;
                tracing::debug!(turn = turns, step = step.tag(), ?usage, "model step");

                match step {
                    Step::Start { content } => yield AgentEvent::Start(content),
                    Step::Plan { content } => yield AgentEvent::Plan(content),
                    Step::Tool { tool, input } => {
                        yield AgentEvent::ToolCall {
                            tool: tool.clone(),
                            input: input.clone(),
                        };

                        let observation = self.observe(tool, input).await?;
                        transcript.push_observation(&observation)?;
                        yield AgentEvent::Observation(observation);
                    }
                    Step::Output { content } => {
                        yield AgentEvent::Output(content);
                        break;
                    }
                }
            }
        })
    }

    /// Answer a single query, returning the OUTPUT content and the full transcript
    pub async fn run(&self, query: &str) -> AgentResult<Reply> {
        tracing::info!(query, "starting query");
        let mut transcript = self.start(query)?;

        let mut content = None;
        {
            let mut stream = self.reply(&mut transcript);
            while let Some(event) = stream.try_next().await? {
                if let AgentEvent::Output(text) = event {
                    content = Some(text);
                }
            }
        }

        let content = content
            .ok_or_else(|| AgentError::Internal("reply ended without an OUTPUT step".into()))?;
        Ok(Reply {
            content,
            transcript,
        })
    }
}
