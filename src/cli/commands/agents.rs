//! Agents command implementation.

use super::open_registry;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// List the registered agents.
pub fn run_agents(settings: &Settings) -> Result<()> {
    let registry = open_registry(settings)?;

    Output::header(&format!("Agents ({})", registry.len()));
    println!();
    for agent in registry.list() {
        Output::agent_info(&agent);
    }

    println!();
    Output::kv("Model", &settings.model.id);
    Output::kv("Endpoint", &settings.model.base_url);
    Output::kv("Storage", &settings.storage.provider.to_string());

    Ok(())
}
