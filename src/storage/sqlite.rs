//! SQLite-based conversation store.

use super::{
    conversation_title, validate_table_name, ConversationStore, ConversationSummary, ConversationTurn,
};
use crate::error::{Result, SamtaleError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

/// Raw row before role and timestamp parsing.
type TurnRow = (i64, String, String, Option<String>, String);

/// SQLite-based conversation store.
///
/// All access goes through one connection behind a mutex, which also
/// serializes sequence allocation for concurrent appends.
pub struct SqliteConversationStore {
    conn: Mutex<Connection>,
}

impl SqliteConversationStore {
    /// Open (or create) a store at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL lets the CLI read history while the server is writing
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;

        info!("Opened SQLite conversation store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SamtaleError::StorageUnavailable(format!("Failed to acquire lock: {}", e)))
    }

    /// Create the agent's table on first use.
    fn ensure_table(conn: &Connection, table: &str) -> Result<()> {
        validate_table_name(table)?;
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                conversation_id TEXT NOT NULL,
                sequence INTEGER NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                tool_calls_json TEXT,
                created_at TEXT NOT NULL,
                PRIMARY KEY (conversation_id, sequence)
            );
            "#
        ))?;
        Ok(())
    }

    fn parse_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn to_turn(row: TurnRow) -> Result<ConversationTurn> {
        let (sequence, role, content, tool_calls_json, created_at) = row;
        let tool_calls = tool_calls_json
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(|e| SamtaleError::StorageUnavailable(format!("Corrupt tool call metadata: {}", e)))?;

        Ok(ConversationTurn {
            sequence: sequence as u64,
            role: role.parse()?,
            content,
            tool_calls,
            created_at: Self::parse_time(&created_at),
        })
    }

    fn select_turns(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<ConversationTurn>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?
            .collect::<rusqlite::Result<Vec<TurnRow>>>()?;

        rows.into_iter().map(Self::to_turn).collect()
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    #[instrument(skip(self, turns), fields(turns = turns.len()))]
    async fn append(
        &self,
        table: &str,
        conversation_id: &str,
        turns: &[ConversationTurn],
    ) -> Result<Vec<ConversationTurn>> {
        let conn = self.lock()?;
        Self::ensure_table(&conn, table)?;

        let tx = conn.unchecked_transaction()?;

        let last: i64 = tx.query_row(
            &format!("SELECT COALESCE(MAX(sequence), 0) FROM {table} WHERE conversation_id = ?1"),
            params![conversation_id],
            |row| row.get(0),
        )?;

        let mut stored = Vec::with_capacity(turns.len());
        for (offset, turn) in turns.iter().enumerate() {
            let sequence = last + 1 + offset as i64;
            let tool_calls_json = turn
                .tool_calls
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;

            tx.execute(
                &format!(
                    r#"
                    INSERT INTO {table}
                    (conversation_id, sequence, role, content, tool_calls_json, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#
                ),
                params![
                    conversation_id,
                    sequence,
                    turn.role.to_string(),
                    turn.content,
                    tool_calls_json,
                    turn.created_at.to_rfc3339(),
                ],
            )?;

            stored.push(ConversationTurn {
                sequence: sequence as u64,
                ..turn.clone()
            });
        }

        tx.commit()?;
        debug!("Appended {} turns to {}/{}", stored.len(), table, conversation_id);
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn recent(&self, table: &str, conversation_id: &str, limit: usize) -> Result<Vec<ConversationTurn>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        Self::ensure_table(&conn, table)?;

        let mut turns = Self::select_turns(
            &conn,
            &format!(
                r#"
                SELECT sequence, role, content, tool_calls_json, created_at
                FROM {table}
                WHERE conversation_id = ?1
                ORDER BY sequence DESC
                LIMIT ?2
                "#
            ),
            params![conversation_id, limit as i64],
        )?;

        turns.reverse();
        Ok(turns)
    }

    #[instrument(skip(self))]
    async fn history(&self, table: &str, conversation_id: &str) -> Result<Vec<ConversationTurn>> {
        let conn = self.lock()?;
        Self::ensure_table(&conn, table)?;

        Self::select_turns(
            &conn,
            &format!(
                r#"
                SELECT sequence, role, content, tool_calls_json, created_at
                FROM {table}
                WHERE conversation_id = ?1
                ORDER BY sequence
                "#
            ),
            params![conversation_id],
        )
    }

    #[instrument(skip(self))]
    async fn list_conversations(&self, table: &str) -> Result<Vec<ConversationSummary>> {
        let conn = self.lock()?;
        Self::ensure_table(&conn, table)?;

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT t.conversation_id, COUNT(*), MIN(t.created_at), MAX(t.created_at),
                   (SELECT f.content FROM {table} AS f
                    WHERE f.conversation_id = t.conversation_id AND f.role = 'user'
                    ORDER BY f.sequence LIMIT 1)
            FROM {table} AS t
            GROUP BY t.conversation_id
            ORDER BY MAX(t.created_at) DESC
            "#
        ))?;

        let rows = stmt
            .query_map([], |row| {
                let conversation_id: String = row.get(0)?;
                let turn_count: i64 = row.get(1)?;
                let created_at: String = row.get(2)?;
                let updated_at: String = row.get(3)?;
                let first_message: Option<String> = row.get(4)?;
                Ok(ConversationSummary {
                    title: conversation_title(first_message.as_deref().unwrap_or(&conversation_id)),
                    conversation_id,
                    turn_count: turn_count as u64,
                    created_at: Self::parse_time(&created_at),
                    updated_at: Self::parse_time(&updated_at),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn delete_conversation(&self, table: &str, conversation_id: &str) -> Result<usize> {
        let conn = self.lock()?;
        Self::ensure_table(&conn, table)?;

        let deleted = conn.execute(
            &format!("DELETE FROM {table} WHERE conversation_id = ?1"),
            params![conversation_id],
        )?;

        info!("Deleted {} turns of {}/{}", deleted, table, conversation_id);
        Ok(deleted)
    }
}
