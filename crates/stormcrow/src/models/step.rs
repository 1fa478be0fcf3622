use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::errors::DecodeError;

/// The tags a model is allowed to emit, in the order they usually appear
pub const STEP_TAGS: [&str; 4] = ["START", "PLAN", "TOOL", "OUTPUT"];

/// The tag used for tool results sent back to the model
pub const OBSERVE_TAG: &str = "OBSERVE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "UPPERCASE")]
/// One reasoning step produced by the model
pub enum Step {
    /// Echo of the user's query
    Start { content: String },
    /// Intermediate reasoning
    Plan { content: String },
    /// A request to run a tool
    Tool { tool: String, input: String },
    /// The final answer for the user
    Output { content: String },
}

impl Step {
    pub fn start<S: Into<String>>(content: S) -> Self {
        Step::Start {
            content: content.into(),
        }
    }

    pub fn plan<S: Into<String>>(content: S) -> Self {
        Step::Plan {
            content: content.into(),
        }
    }

    pub fn tool<T: Into<String>, I: Into<String>>(tool: T, input: I) -> Self {
        Step::Tool {
            tool: tool.into(),
            input: input.into(),
        }
    }

    pub fn output<S: Into<String>>(content: S) -> Self {
        Step::Output {
            content: content.into(),
        }
    }

    /// Decode raw model output into a step.
    ///
    /// The tag is checked before the variant fields so an unknown tag is always
    /// reported as such rather than as a missing field of some other variant.
    /// Fields that belong to other variants must be absent or `null`, which is
    /// the shape strict structured output produces.
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(raw.trim())
            .map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

        let object = value.as_object().ok_or(DecodeError::NotAnObject)?;
        let tag = object
            .get("step")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingTag)?
            .to_string();

        if !STEP_TAGS.contains(&tag.as_str()) {
            return Err(DecodeError::UnknownTag(tag));
        }

        let foreign: &[&str] = if tag == "TOOL" {
            &["content"]
        } else {
            &["tool", "input"]
        };
        if let Some(field) = foreign
            .iter()
            .find(|field| object.get(**field).is_some_and(|v| !v.is_null()))
        {
            return Err(DecodeError::Malformed {
                step: tag,
                reason: format!("field `{}` does not belong to this step", field),
            });
        }

        serde_json::from_value(value).map_err(|e| DecodeError::Malformed {
            step: tag,
            reason: e.to_string(),
        })
    }

    /// Serialize into the wire format the model uses
    pub fn encode(&self) -> String {
        // A Step only holds strings, serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    /// JSON schema for structured output.
    ///
    /// Every field is present and the variant fields are nullable, since strict
    /// structured output does not allow optional properties or `oneOf` at the root.
    pub fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "step": {
                    "type": "string",
                    "enum": STEP_TAGS
                },
                "content": {"type": ["string", "null"]},
                "tool": {"type": ["string", "null"]},
                "input": {"type": ["string", "null"]}
            },
            "required": ["step", "content", "tool", "input"],
            "additionalProperties": false
        })
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Step::Start { .. } => "START",
            Step::Plan { .. } => "PLAN",
            Step::Tool { .. } => "TOOL",
            Step::Output { .. } => "OUTPUT",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Start { content } | Step::Plan { content } | Step::Output { content } => {
                write!(f, "{}: {}", self.tag(), content)
            }
            Step::Tool { tool, input } => write!(f, "{}: {}({})", self.tag(), tool, input),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename = "OBSERVE")]
/// The result of running a tool, fed back to the model as a user message
pub struct Observation {
    pub tool: String,
    pub input: String,
    pub output: String,
}

impl Observation {
    pub fn new<T, I, O>(tool: T, input: I, output: O) -> Self
    where
        T: Into<String>,
        I: Into<String>,
        O: Into<String>,
    {
        Self {
            tool: tool.into(),
            input: input.into(),
            output: output.into(),
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
