//! These models represent the objects passed between the agent and the LLM
//!
//! The model speaks in steps: a JSON object tagged with `step` that is one of
//! START, PLAN, TOOL or OUTPUT. The agent answers tool calls with an OBSERVE
//! object sent back as a user message. Everything that crosses the wire is kept
//! as plain text in a [`message::Message`] so the transcript is replayed verbatim.
pub mod message;
pub mod role;
pub mod step;
