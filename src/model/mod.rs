//! Model backend abstraction.
//!
//! Agents talk to the language model through [`ModelBackend`], which takes a
//! provider-neutral message list plus tool definitions and returns either a
//! final answer or a batch of tool invocations.

mod ollama;
mod scripted;

pub use ollama::OllamaModel;
pub use scripted::ScriptedModel;

use crate::error::Result;
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message author as seen by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Backend-assigned call ID, echoed back with the result.
    pub id: String,
    /// Function name.
    pub name: String,
    /// JSON-encoded arguments.
    pub arguments: String,
}

/// One message in the model context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// Tool calls made by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,
    /// For tool messages, the call this result answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::Assistant, content)
    }

    /// Assistant message carrying tool calls.
    pub fn assistant_tool_calls(content: Option<String>, calls: Vec<ToolInvocation>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.unwrap_or_default(),
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    /// Result of a tool call.
    pub fn tool_result(call_id: &str, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.to_string()),
        }
    }

    fn plain(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

/// What the model produced for one completion.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// Final answer text.
    Answer(String),
    /// The model wants tools run before it answers.
    ToolCalls {
        content: Option<String>,
        calls: Vec<ToolInvocation>,
    },
}

/// Trait for chat model backends.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Model identifier (e.g. "llama3.2").
    fn id(&self) -> &str;

    /// Run one completion. An empty `tools` slice disables tool calling.
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Result<ModelReply>;
}
