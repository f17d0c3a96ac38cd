//! Agent registry and dispatch by agent ID.

use crate::agent::{Agent, AgentResponse};
use crate::error::{Result, SamtaleError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Listing entry for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub agent_id: String,
    pub name: String,
    pub role: String,
    pub model: String,
    pub tools: Vec<String>,
}

/// Fixed set of named agents, in registration order.
#[derive(Default)]
pub struct AgentRegistry {
    agents: Vec<Arc<Agent>>,
    index: HashMap<String, usize>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent. IDs must be unique.
    pub fn register(&mut self, agent: Agent) -> Result<()> {
        if self.index.contains_key(agent.id()) {
            return Err(SamtaleError::Config(format!(
                "Agent '{}' is already registered",
                agent.id()
            )));
        }
        debug!("Registering agent {}", agent.id());
        self.index.insert(agent.id().to_string(), self.agents.len());
        self.agents.push(Arc::new(agent));
        Ok(())
    }

    /// Look up an agent by ID.
    pub fn get(&self, agent_id: &str) -> Result<Arc<Agent>> {
        self.index
            .get(agent_id)
            .map(|&i| Arc::clone(&self.agents[i]))
            .ok_or_else(|| SamtaleError::UnknownAgentId(agent_id.to_string()))
    }

    /// Send a message to the named agent.
    #[instrument(skip(self, message))]
    pub async fn route(&self, agent_id: &str, conversation_id: &str, message: &str) -> Result<AgentResponse> {
        self.get(agent_id)?.respond(conversation_id, message).await
    }

    pub fn list(&self) -> Vec<AgentSummary> {
        self.agents
            .iter()
            .map(|agent| {
                let definition = agent.definition();
                AgentSummary {
                    agent_id: definition.id.clone(),
                    name: definition.name.clone(),
                    role: definition.role.clone(),
                    model: agent.model_id().to_string(),
                    tools: agent.tool_names(),
                }
            })
            .collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
