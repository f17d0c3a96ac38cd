//! Agents: a static definition bound to a model, tools and a conversation store.
//!
//! [`Agent::respond`] runs the tool calling loop for one user message and
//! persists the exchange once the final answer is ready.

mod definition;
mod runner;

pub use definition::{AgentDefinition, DEFAULT_MAX_TOOL_CALLS};
pub use runner::{Agent, AgentResponse, ToolCallRecord};
