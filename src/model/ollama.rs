//! Ollama backend via the OpenAI-compatible chat completions API.

use super::{ChatMessage, MessageRole, ModelBackend, ModelReply, ToolInvocation};
use crate::config::ModelSettings;
use crate::error::{Result, SamtaleError};
use crate::openai::create_client;
use crate::tools::ToolDefinition;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
    FunctionObject,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Chat model served by a local Ollama daemon.
pub struct OllamaModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    id: String,
}

impl OllamaModel {
    /// Create a backend for the configured model.
    pub fn new(settings: &ModelSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            id: settings.id.clone(),
        })
    }
}

#[async_trait]
impl ModelBackend for OllamaModel {
    fn id(&self) -> &str {
        &self.id
    }

    #[instrument(skip(self, messages, tools), fields(model = %self.id, messages = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Result<ModelReply> {
        let request_messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.id).messages(request_messages);
        if !tools.is_empty() {
            builder.tools(tools.iter().map(to_chat_tool).collect::<Vec<_>>());
        }
        let request = builder.build().map_err(build_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| SamtaleError::ModelUnavailable(format!("{} ({})", e, self.id)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SamtaleError::ModelUnavailable("No response from model".to_string()))?;

        match choice.message.tool_calls {
            Some(calls) if !calls.is_empty() => {
                debug!("Model requested {} tool call(s)", calls.len());
                Ok(ModelReply::ToolCalls {
                    content: choice.message.content.filter(|c| !c.trim().is_empty()),
                    calls: calls
                        .into_iter()
                        .map(|c| ToolInvocation {
                            id: c.id,
                            name: c.function.name,
                            arguments: c.function.arguments,
                        })
                        .collect(),
                })
            }
            _ => Ok(ModelReply::Answer(choice.message.content.unwrap_or_default())),
        }
    }
}

fn build_error(e: impl std::fmt::Display) -> SamtaleError {
    SamtaleError::InvalidInput(format!("Failed to build model request: {}", e))
}

fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let built: ChatCompletionRequestMessage = match message.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(build_error)?
            .into(),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(build_error)?
            .into(),
        MessageRole::Assistant => {
            let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
            if !message.content.is_empty() {
                builder.content(message.content.clone());
            }
            if !message.tool_calls.is_empty() {
                builder.tool_calls(
                    message
                        .tool_calls
                        .iter()
                        .map(|c| ChatCompletionMessageToolCall {
                            id: c.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: c.name.clone(),
                                arguments: c.arguments.clone(),
                            },
                        })
                        .collect::<Vec<_>>(),
                );
            }
            builder.build().map_err(build_error)?.into()
        }
        MessageRole::Tool => ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(message.tool_call_id.clone().unwrap_or_default())
            .content(message.content.clone())
            .build()
            .map_err(build_error)?
            .into(),
    };
    Ok(built)
}

fn to_chat_tool(definition: &ToolDefinition) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: definition.name.clone(),
            description: Some(definition.description.clone()),
            parameters: Some(definition.parameters.clone()),
            strict: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definition_conversion() {
        let definition = ToolDefinition::new(
            "get_current_stock_price",
            "Get the current stock price",
            serde_json::json!({
                "type": "object",
                "properties": { "symbol": { "type": "string" } },
                "required": ["symbol"]
            }),
        );

        let tool = to_chat_tool(&definition);
        assert_eq!(tool.function.name, "get_current_stock_price");
        assert!(tool.function.parameters.is_some());
    }

    #[test]
    fn test_message_conversion_covers_all_roles() {
        let messages = vec![
            ChatMessage::system("You are helpful."),
            ChatMessage::user("Hi"),
            ChatMessage::assistant_tool_calls(
                None,
                vec![ToolInvocation {
                    id: "call_0".to_string(),
                    name: "duckduckgo_search".to_string(),
                    arguments: r#"{"query":"rust"}"#.to_string(),
                }],
            ),
            ChatMessage::tool_result("call_0", "results"),
            ChatMessage::assistant("Done."),
        ];

        for message in &messages {
            assert!(to_request_message(message).is_ok());
        }
    }
}
