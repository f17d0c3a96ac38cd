//! In-memory conversation store.
//!
//! Useful for testing and throwaway playground sessions.

use super::{
    conversation_title, validate_table_name, ConversationStore, ConversationSummary, ConversationTurn,
    TurnRole,
};
use crate::error::{Result, SamtaleError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type Key = (String, String);

/// In-memory conversation store.
pub struct MemoryConversationStore {
    conversations: RwLock<HashMap<Key, Vec<ConversationTurn>>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Key, Vec<ConversationTurn>>>> {
        self.conversations
            .read()
            .map_err(|e| SamtaleError::StorageUnavailable(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Key, Vec<ConversationTurn>>>> {
        self.conversations
            .write()
            .map_err(|e| SamtaleError::StorageUnavailable(format!("Failed to acquire lock: {}", e)))
    }

    fn key(table: &str, conversation_id: &str) -> Key {
        (table.to_string(), conversation_id.to_string())
    }
}

impl Default for MemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn append(
        &self,
        table: &str,
        conversation_id: &str,
        turns: &[ConversationTurn],
    ) -> Result<Vec<ConversationTurn>> {
        validate_table_name(table)?;
        let mut conversations = self.write()?;
        let existing = conversations.entry(Self::key(table, conversation_id)).or_default();

        let last = existing.last().map(|t| t.sequence).unwrap_or(0);
        let stored: Vec<ConversationTurn> = turns
            .iter()
            .enumerate()
            .map(|(offset, turn)| ConversationTurn {
                sequence: last + 1 + offset as u64,
                ..turn.clone()
            })
            .collect();

        existing.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn recent(&self, table: &str, conversation_id: &str, limit: usize) -> Result<Vec<ConversationTurn>> {
        validate_table_name(table)?;
        let conversations = self.read()?;
        Ok(conversations
            .get(&Self::key(table, conversation_id))
            .map(|turns| turns[turns.len().saturating_sub(limit)..].to_vec())
            .unwrap_or_default())
    }

    async fn history(&self, table: &str, conversation_id: &str) -> Result<Vec<ConversationTurn>> {
        validate_table_name(table)?;
        let conversations = self.read()?;
        Ok(conversations
            .get(&Self::key(table, conversation_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_conversations(&self, table: &str) -> Result<Vec<ConversationSummary>> {
        validate_table_name(table)?;
        let conversations = self.read()?;

        let mut summaries: Vec<ConversationSummary> = conversations
            .iter()
            .filter(|((t, _), turns)| t == table && !turns.is_empty())
            .filter_map(|((_, conversation_id), turns)| {
                let first = turns.first()?;
                let last = turns.last()?;
                let first_message = turns
                    .iter()
                    .find(|t| t.role == TurnRole::User)
                    .map(|t| t.content.as_str())
                    .unwrap_or(conversation_id);

                Some(ConversationSummary {
                    conversation_id: conversation_id.clone(),
                    title: conversation_title(first_message),
                    turn_count: turns.len() as u64,
                    created_at: first.created_at,
                    updated_at: last.created_at,
                })
            })
            .collect();

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn delete_conversation(&self, table: &str, conversation_id: &str) -> Result<usize> {
        validate_table_name(table)?;
        let mut conversations = self.write()?;
        Ok(conversations
            .remove(&Self::key(table, conversation_id))
            .map(|turns| turns.len())
            .unwrap_or(0))
    }
}
