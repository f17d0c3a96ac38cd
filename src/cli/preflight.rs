//! Pre-flight checks before talking to an agent.
//!
//! Validates that the model endpoint is reachable before starting operations
//! that would otherwise fail after a long timeout.

use crate::config::{ModelSettings, Settings};
use crate::error::{Result, SamtaleError};
use std::process::Command;
use std::time::Duration;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Talking to an agent requires the model endpoint.
    Converse,
    /// Listing agents and history needs nothing external.
    Browse,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub async fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Converse => {
            probe_model_endpoint(&settings.model).await?;
        }
        Operation::Browse => {}
    }
    Ok(())
}

/// Ask the backend for its model list. Returns the model names it serves.
pub async fn probe_model_endpoint(settings: &ModelSettings) -> Result<Vec<String>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let url = format!("{}/models", settings.base_url.trim_end_matches('/'));
    let response = client
        .get(&url)
        .bearer_auth(&settings.api_key)
        .send()
        .await
        .map_err(|e| {
            SamtaleError::ModelUnavailable(format!(
                "{} is not reachable ({}). Is Ollama running? Start it with: ollama serve",
                settings.base_url, e
            ))
        })?;

    if !response.status().is_success() {
        return Err(SamtaleError::ModelUnavailable(format!(
            "{} returned status {}",
            url,
            response.status()
        )));
    }

    let body: serde_json::Value = response.json().await?;
    Ok(model_names(&body))
}

/// Extract model IDs from an OpenAI-style `/models` listing.
fn model_names(body: &serde_json::Value) -> Vec<String> {
    body["data"]
        .as_array()
        .map(|models| {
            models
                .iter()
                .filter_map(|m| m["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Whether the backend serves the configured model. Ollama lists tags
/// like "llama3.2:latest" for a configured "llama3.2".
pub fn serves_model(available: &[String], id: &str) -> bool {
    available
        .iter()
        .any(|name| name == id || name.strip_suffix(":latest") == Some(id))
}

/// Check if an external tool is available. Returns its first version line.
pub fn check_tool(name: &str) -> Result<String> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("installed")
            .trim()
            .to_string()),
        Ok(_) => Err(SamtaleError::Config(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SamtaleError::Config(format!("{} not found", name)))
        }
        Err(e) => Err(SamtaleError::Config(format!("{}: {}", name, e))),
    }
}
