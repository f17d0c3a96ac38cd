//! Conversation storage.
//!
//! Each agent owns one table; a row is one turn keyed by
//! `(conversation_id, sequence)`. Turns are append-only, and the turns of one
//! exchange are written in a single atomic append.

mod memory;
mod sqlite;

pub use memory::MemoryConversationStore;
pub use sqlite::SqliteConversationStore;

use crate::agent::ToolCallRecord;
use crate::config::{Settings, StorageProvider};
use crate::error::{Result, SamtaleError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Agent,
    Tool,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Agent => write!(f, "agent"),
            TurnRole::Tool => write!(f, "tool"),
        }
    }
}

impl std::str::FromStr for TurnRole {
    type Err = SamtaleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(TurnRole::User),
            "agent" => Ok(TurnRole::Agent),
            "tool" => Ok(TurnRole::Tool),
            _ => Err(SamtaleError::StorageUnavailable(format!("Unknown turn role: {}", s))),
        }
    }
}

/// One stored message of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Position in the conversation, assigned by the store on append.
    pub sequence: u64,
    pub role: TurnRole,
    pub content: String,
    /// Tool calls made while producing an agent turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRecord>>,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    fn new(role: TurnRole, content: &str) -> Self {
        Self {
            sequence: 0,
            role,
            content: content.to_string(),
            tool_calls: None,
            created_at: Utc::now(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn agent(content: &str, tool_calls: Vec<ToolCallRecord>) -> Self {
        let mut turn = Self::new(TurnRole::Agent, content);
        if !tool_calls.is_empty() {
            turn.tool_calls = Some(tool_calls);
        }
        turn
    }
}

/// Summary of one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    /// First user message, shortened.
    pub title: String,
    pub turn_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trait for conversation store implementations.
///
/// `table` is the agent's storage table name; implementations must accept any
/// name passing [`validate_table_name`].
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append turns atomically, assigning consecutive sequence numbers.
    /// Returns the stored turns.
    async fn append(
        &self,
        table: &str,
        conversation_id: &str,
        turns: &[ConversationTurn],
    ) -> Result<Vec<ConversationTurn>>;

    /// The most recent `limit` turns, oldest first.
    async fn recent(&self, table: &str, conversation_id: &str, limit: usize) -> Result<Vec<ConversationTurn>>;

    /// Every turn of a conversation, oldest first.
    async fn history(&self, table: &str, conversation_id: &str) -> Result<Vec<ConversationTurn>>;

    /// All conversations in a table, most recently updated first.
    async fn list_conversations(&self, table: &str) -> Result<Vec<ConversationSummary>>;

    /// Delete a conversation. Returns the number of turns removed.
    async fn delete_conversation(&self, table: &str, conversation_id: &str) -> Result<usize>;
}

/// Table names are interpolated into SQL, so only `[a-z0-9_]` is allowed.
pub fn validate_table_name(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && table.len() <= 64
        && table.chars().next().is_some_and(|c| c.is_ascii_lowercase())
        && table
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(SamtaleError::Config(format!("Invalid storage table name: {}", table)))
    }
}

/// Shorten a first message into a conversation title.
pub(crate) fn conversation_title(first_message: &str) -> String {
    const MAX_CHARS: usize = 60;
    let line = first_message.lines().next().unwrap_or_default().trim();
    if line.chars().count() <= MAX_CHARS {
        line.to_string()
    } else {
        format!("{}...", line.chars().take(MAX_CHARS - 3).collect::<String>())
    }
}

/// Open the store selected in settings.
pub fn open_store(settings: &Settings) -> Result<Arc<dyn ConversationStore>> {
    match settings.storage.provider {
        StorageProvider::Sqlite => Ok(Arc::new(SqliteConversationStore::new(&settings.sqlite_path())?)),
        StorageProvider::Memory => Ok(Arc::new(MemoryConversationStore::new())),
    }
}
