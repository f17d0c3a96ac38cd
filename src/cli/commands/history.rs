//! History command implementation.

use super::{open_registry, report_unknown_agent};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// List an agent's conversations, or show or delete one of them.
pub async fn run_history(
    agent_id: &str,
    conversation: Option<&str>,
    delete: bool,
    settings: &Settings,
) -> Result<()> {
    let registry = open_registry(settings)?;
    let agent = match registry.get(agent_id) {
        Ok(agent) => agent,
        Err(e) => {
            report_unknown_agent(&registry, agent_id);
            return Err(e.into());
        }
    };

    match conversation {
        None => {
            let sessions = agent.sessions().await?;
            if sessions.is_empty() {
                Output::info(&format!(
                    "No conversations yet. Start one with: samtale chat {}",
                    agent_id
                ));
                return Ok(());
            }

            Output::header(&format!("{} conversations ({})", agent.definition().name, sessions.len()));
            println!();
            for session in &sessions {
                Output::session_info(session);
            }
        }

        Some(conversation_id) if delete => {
            let removed = agent.delete_session(conversation_id).await?;
            if removed == 0 {
                Output::warning(&format!("Conversation not found: {}", conversation_id));
            } else {
                Output::success(&format!(
                    "Deleted conversation {} ({} turns)",
                    conversation_id, removed
                ));
            }
        }

        Some(conversation_id) => {
            let turns = agent.history(conversation_id).await?;
            if turns.is_empty() {
                Output::warning(&format!("Conversation not found: {}", conversation_id));
                return Ok(());
            }

            Output::header(&format!("Conversation {}", conversation_id));
            for turn in &turns {
                Output::turn(turn, &agent.definition().name);
            }
            println!();
        }
    }

    Ok(())
}
