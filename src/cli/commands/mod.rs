//! CLI command implementations.

mod agents;
mod ask;
mod chat;
mod config;
mod doctor;
mod history;
mod serve;

pub use agents::run_agents;
pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use history::run_history;
pub use serve::run_serve;

use crate::catalog;
use crate::config::Settings;
use crate::registry::AgentRegistry;
use crate::storage;

/// Open the configured store and register the built-in agents.
fn open_registry(settings: &Settings) -> crate::error::Result<AgentRegistry> {
    let store = storage::open_store(settings)?;
    catalog::build_registry(settings, store)
}

/// Print the error and a hint when the agent ID is unknown.
fn report_unknown_agent(registry: &AgentRegistry, agent_id: &str) {
    super::Output::error(&format!("Unknown agent: {}", agent_id));
    super::Output::info(&format!("Available agents: {}", registry.ids().join(", ")));
}
