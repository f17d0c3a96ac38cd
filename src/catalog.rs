//! The built-in agents: web search, finance and YouTube.

use crate::agent::{Agent, AgentDefinition};
use crate::config::Settings;
use crate::error::Result;
use crate::model::{ModelBackend, OllamaModel};
use crate::registry::AgentRegistry;
use crate::storage::ConversationStore;
use crate::tools::finance::FinanceFeatures;
use crate::tools::{
    DuckDuckGoSearch, DuckDuckGoTools, FinanceTools, MarketData, SearchProvider, ToolRegistry, Toolkit,
    YahooFinance, YouTubeTools,
};
use std::sync::Arc;
use tracing::info;

pub const WEB_AGENT_ID: &str = "web-agent";
pub const FINANCE_AGENT_ID: &str = "finance-agent";
pub const YOUTUBE_AGENT_ID: &str = "youtube-agent";

/// Instructions appended to every agent's own list.
pub fn common_instructions() -> Vec<String> {
    vec![
        "If the user asks about you or your skills, tell them your name and role.".to_string(),
        "IMPORTANT: ONLY RUN TOOLS WHEN NECESSARY. If you can answer the user directly, do so.".to_string(),
    ]
}

pub fn web_agent() -> AgentDefinition {
    AgentDefinition::new(WEB_AGENT_ID, "Web Agent")
        .role("Search the web for information")
        .instructions([
            "If you need to search the web, break down the users request into 2-3 different searches and always include sources.",
        ])
        .instructions(common_instructions())
        .storage_table("web_agent")
        .show_tool_calls(true)
        .with_history(4)
        .add_name_to_instructions(true)
        .add_datetime_to_instructions(true)
        .markdown(true)
}

pub fn finance_agent() -> AgentDefinition {
    AgentDefinition::new(FINANCE_AGENT_ID, "Finance Agent")
        .role("Get financial data")
        .description("You are an investment analyst that researches stocks and helps users make informed decisions.")
        .instructions(["Always use tables to display data"])
        .instructions(common_instructions())
        .storage_table("finance_agent")
        .with_history(10)
        .add_name_to_instructions(true)
        .add_datetime_to_instructions(true)
        .markdown(true)
}

pub fn youtube_agent() -> AgentDefinition {
    AgentDefinition::new(YOUTUBE_AGENT_ID, "YouTube Agent")
        .role("Understand YouTube videos and answer questions")
        .description(
            "You are a YouTube agent that has the special skill of understanding YouTube videos and answering questions about them.",
        )
        .instructions([
            "Using a video URL, get the video data using the `get_youtube_video_data` tool and captions using the `get_youtube_video_captions` tool.",
            "Using the data and captions, answer the user's question in an engaging and thoughtful manner. Focus on the most important details.",
            "If you cannot find the answer in the video, say so and ask the user to provide more details.",
            "Keep your answers concise and engaging.",
        ])
        .instructions(common_instructions())
        .storage_table("youtube_agent")
        .with_history(10)
        .show_tool_calls(true)
        .add_name_to_instructions(true)
        .add_datetime_to_instructions(true)
        .markdown(true)
}

/// External services the catalog agents are wired to.
pub struct Backends {
    pub model: Arc<dyn ModelBackend>,
    pub search: Arc<dyn SearchProvider>,
    pub market: Arc<dyn MarketData>,
}

impl Backends {
    /// Production services: Ollama, DuckDuckGo and Yahoo Finance.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            model: Arc::new(OllamaModel::new(&settings.model)?),
            search: Arc::new(DuckDuckGoSearch::new()?),
            market: Arc::new(YahooFinance::new(&settings.finance)?),
        })
    }
}

/// Build the registry of built-in agents against production services.
pub fn build_registry(settings: &Settings, store: Arc<dyn ConversationStore>) -> Result<AgentRegistry> {
    build_registry_with(settings, Backends::from_settings(settings)?, store)
}

/// Build the registry of built-in agents against the given services.
pub fn build_registry_with(
    settings: &Settings,
    backends: Backends,
    store: Arc<dyn ConversationStore>,
) -> Result<AgentRegistry> {
    let max_tool_calls = settings.model.max_tool_calls;

    let web_tools: Arc<dyn Toolkit> = Arc::new(DuckDuckGoTools::new(backends.search, settings.search.max_results));
    let finance_tools: Arc<dyn Toolkit> = Arc::new(FinanceTools::new(backends.market, FinanceFeatures::all()));
    let youtube_tools: Arc<dyn Toolkit> = Arc::new(YouTubeTools::new(&settings.youtube)?);

    let agents = [
        (web_agent(), web_tools),
        (finance_agent(), finance_tools),
        (youtube_agent(), youtube_tools),
    ];

    let mut registry = AgentRegistry::new();
    for (definition, toolkit) in agents {
        let agent = Agent::new(
            definition.max_tool_calls(max_tool_calls),
            Arc::clone(&backends.model),
            ToolRegistry::from_toolkits(vec![toolkit])?,
            Arc::clone(&store),
        )?;
        registry.register(agent)?;
    }

    info!(
        "Registered {} agents on model {}",
        registry.len(),
        backends.model.id()
    );
    Ok(registry)
}
