//! OpenAI-compatible client configuration.
//!
//! Ollama serves the OpenAI chat completions API under `/v1`, so the same
//! client talks to a local daemon or any hosted compatible endpoint.

use crate::config::ModelSettings;
use crate::error::{Result, SamtaleError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for the configured backend.
pub fn create_client(settings: &ModelSettings) -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(
        &settings.base_url,
        &settings.api_key,
        Duration::from_secs(settings.timeout_seconds),
    )
}

/// Create a client with a custom timeout.
pub fn create_client_with_timeout(
    base_url: &str,
    api_key: &str,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SamtaleError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_base(base_url.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}
