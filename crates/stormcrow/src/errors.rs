use thiserror::Error;

/// Raw model output that does not match any step shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Model output is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Model output is not a JSON object")]
    NotAnObject,

    #[error("Model output has no string `step` field")]
    MissingTag,

    #[error("Unknown step: {0}")]
    UnknownTag(String),

    #[error("Malformed {step} step: {reason}")]
    Malformed { step: String, reason: String },
}

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Could not decode model output: {0}")]
    Decode(#[from] DecodeError),

    #[error("Tool not found: {0}")]
    UnknownTool(String),

    #[error("No final answer after {0} turns")]
    TurnLimitExceeded(usize),

    #[error("Provider error: {0:#}")]
    Provider(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
