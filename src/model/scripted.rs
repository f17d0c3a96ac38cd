//! Deterministic model backend driven by a closure.
//!
//! Useful for tests and offline demos: the reply is a pure function of the
//! context, so replaying the same conversation gives the same tool calls.

use super::{ChatMessage, ModelBackend, ModelReply};
use crate::error::Result;
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use std::sync::Mutex;

type ReplyFn = dyn Fn(&[ChatMessage], &[ToolDefinition]) -> Result<ModelReply> + Send + Sync;

/// Model stub that answers through a user-supplied function.
pub struct ScriptedModel {
    id: String,
    reply: Box<ReplyFn>,
    contexts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    /// Create a stub with the given reply function.
    pub fn new<F>(id: &str, reply: F) -> Self
    where
        F: Fn(&[ChatMessage], &[ToolDefinition]) -> Result<ModelReply> + Send + Sync + 'static,
    {
        Self {
            id: id.to_string(),
            reply: Box::new(reply),
            contexts: Mutex::new(Vec::new()),
        }
    }

    /// Stub that always answers with the same text.
    pub fn constant(id: &str, answer: &str) -> Self {
        let answer = answer.to_string();
        Self::new(id, move |_, _| Ok(ModelReply::Answer(answer.clone())))
    }

    /// Every context this model has been called with, oldest first.
    pub fn contexts(&self) -> Vec<Vec<ChatMessage>> {
        self.contexts
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ModelBackend for ScriptedModel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn complete(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Result<ModelReply> {
        if let Ok(mut contexts) = self.contexts.lock() {
            contexts.push(messages.to_vec());
        }
        (self.reply)(messages, tools)
    }
}
