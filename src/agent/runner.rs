//! Agent runner with tool calling loop.

use super::definition::AgentDefinition;
use crate::error::{Result, SamtaleError};
use crate::model::{ChatMessage, ModelBackend, ModelReply, ToolInvocation};
use crate::storage::{ConversationStore, ConversationSummary, ConversationTurn, TurnRole};
use crate::tools::ToolRegistry;
use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Sent when the tool call budget is spent, before the final tool-less call.
const TOOL_LIMIT_NOTICE: &str = "You have reached the tool call limit for this message. \
Answer now using only the information gathered so far, and say if the answer may be incomplete.";

/// A configured agent: definition plus model, tools and conversation store.
pub struct Agent {
    definition: AgentDefinition,
    model: Arc<dyn ModelBackend>,
    tools: ToolRegistry,
    store: Arc<dyn ConversationStore>,
}

impl Agent {
    /// Bind a definition to its collaborators.
    pub fn new(
        definition: AgentDefinition,
        model: Arc<dyn ModelBackend>,
        tools: ToolRegistry,
        store: Arc<dyn ConversationStore>,
    ) -> Result<Self> {
        if definition.id.trim().is_empty() {
            return Err(SamtaleError::Config("Agent ID must not be empty".to_string()));
        }
        crate::storage::validate_table_name(&definition.storage_table)?;

        Ok(Self {
            definition,
            model,
            tools,
            store,
        })
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn definition(&self) -> &AgentDefinition {
        &self.definition
    }

    pub fn model_id(&self) -> &str {
        self.model.id()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.names()
    }

    /// Answer a user message within a conversation.
    ///
    /// Nothing is persisted unless the whole exchange succeeds; the user and
    /// agent turns are then appended together.
    #[instrument(skip(self, message), fields(agent = %self.definition.id))]
    pub async fn respond(&self, conversation_id: &str, message: &str) -> Result<AgentResponse> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SamtaleError::InvalidInput("Message must not be empty".to_string()));
        }
        if conversation_id.trim().is_empty() {
            return Err(SamtaleError::InvalidInput("Conversation ID must not be empty".to_string()));
        }

        let history = self
            .store
            .recent(&self.definition.storage_table, conversation_id, self.definition.history_window())
            .await?;

        info!(
            "Agent {} answering in {} with {} history turn(s)",
            self.definition.id,
            conversation_id,
            history.len()
        );

        let mut messages = self.build_context(&history, message);
        let definitions = self.tools.definitions();
        let limit = self.definition.max_tool_calls;

        let mut tool_calls_made: Vec<ToolCallRecord> = Vec::new();
        let mut iterations = 0;
        let mut incomplete = false;

        let answer = loop {
            iterations += 1;
            debug!("Agent iteration {}", iterations);

            match self.model.complete(&messages, definitions).await? {
                ModelReply::Answer(text) => break text,
                ModelReply::ToolCalls { content, calls } => {
                    if tool_calls_made.len() + calls.len() > limit {
                        warn!("{}", SamtaleError::ToolCallLimitExceeded(limit));
                        incomplete = true;
                        iterations += 1;
                        break self.forced_answer(&mut messages).await?;
                    }

                    let records = self.execute_tool_calls(&calls).await;

                    messages.push(ChatMessage::assistant_tool_calls(content, calls.clone()));
                    for (call, record) in calls.iter().zip(&records) {
                        messages.push(ChatMessage::tool_result(&call.id, record.result.clone()));
                    }
                    tool_calls_made.extend(records);
                }
            }
        };

        // The stored turn is the bare answer; the summary is display only
        self.store
            .append(
                &self.definition.storage_table,
                conversation_id,
                &[
                    ConversationTurn::user(message),
                    ConversationTurn::agent(&answer, tool_calls_made.clone()),
                ],
            )
            .await?;

        let content = if self.definition.show_tool_calls {
            with_tool_call_summary(&answer, &tool_calls_made)
        } else {
            answer
        };

        Ok(AgentResponse {
            content,
            tool_calls: tool_calls_made,
            iterations,
            incomplete,
        })
    }

    /// Every stored turn of a conversation.
    pub async fn history(&self, conversation_id: &str) -> Result<Vec<ConversationTurn>> {
        self.store
            .history(&self.definition.storage_table, conversation_id)
            .await
    }

    /// Conversations held by this agent.
    pub async fn sessions(&self) -> Result<Vec<ConversationSummary>> {
        self.store.list_conversations(&self.definition.storage_table).await
    }

    /// Forget a conversation.
    pub async fn delete_session(&self, conversation_id: &str) -> Result<usize> {
        self.store
            .delete_conversation(&self.definition.storage_table, conversation_id)
            .await
    }

    fn build_context(&self, history: &[ConversationTurn], message: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);

        let system = self.definition.system_message(Utc::now());
        if !system.is_empty() {
            messages.push(ChatMessage::system(system));
        }

        messages.extend(history.iter().map(|turn| match turn.role {
            TurnRole::User => ChatMessage::user(turn.content.clone()),
            TurnRole::Agent => ChatMessage::assistant(turn.content.clone()),
            TurnRole::Tool => ChatMessage::assistant(format!("Tool output: {}", turn.content)),
        }));

        messages.push(ChatMessage::user(message));
        messages
    }

    /// Run one batch of tool calls concurrently; records keep the model's order.
    async fn execute_tool_calls(&self, calls: &[ToolInvocation]) -> Vec<ToolCallRecord> {
        join_all(calls.iter().map(|call| self.execute_tool_call(call))).await
    }

    /// Execute a single tool call. Failures become a tool-error observation.
    async fn execute_tool_call(&self, call: &ToolInvocation) -> ToolCallRecord {
        info!("Agent calling tool: {} with args: {}", call.name, call.arguments);

        let (result, failed) = match self.tools.invoke(&call.name, &call.arguments).await {
            Ok(output) => (output, false),
            Err(e) => {
                warn!("Tool {} failed: {}", call.name, e);
                (format!("Tool error: {}", e), true)
            }
        };

        ToolCallRecord {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
            result,
            failed,
        }
    }

    /// Ask for a final answer with tools disabled.
    async fn forced_answer(&self, messages: &mut Vec<ChatMessage>) -> Result<String> {
        messages.push(ChatMessage::system(TOOL_LIMIT_NOTICE));
        match self.model.complete(messages.as_slice(), &[]).await? {
            ModelReply::Answer(text) => Ok(text),
            ModelReply::ToolCalls { content, .. } => Ok(content.unwrap_or_else(|| {
                "I could not finish researching this within the tool call limit.".to_string()
            })),
        }
    }
}

/// Prefix an answer with the tool calls that produced it.
fn with_tool_call_summary(answer: &str, calls: &[ToolCallRecord]) -> String {
    if calls.is_empty() {
        return answer.to_string();
    }

    let lines = calls
        .iter()
        .map(|c| format!(" - {}", c))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Running:\n{}\n\n{}", lines, answer)
}

/// Response from an agent run.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// The final response content.
    pub content: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of model calls used.
    pub iterations: usize,
    /// The tool call limit cut the run short.
    pub incomplete: bool,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool, or the error text.
    pub result: String,
    /// The tool returned an error.
    #[serde(default)]
    pub failed: bool,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let args = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&self.arguments)
            .map(|map| {
                map.iter()
                    .map(|(k, v)| match v {
                        serde_json::Value::String(s) => format!("{}={}", k, s),
                        other => format!("{}={}", k, other),
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_else(|_| self.arguments.clone());
        write!(f, "{}({})", self.name, args)
    }
}
