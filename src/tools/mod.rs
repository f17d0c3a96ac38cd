//! Tool adapters and name-based dispatch.
//!
//! A [`Toolkit`] groups a few related functions (e.g. the four Yahoo Finance
//! lookups). A [`ToolRegistry`] maps every function name an agent exposes to
//! the toolkit that implements it, so resolving a model's tool call is a map
//! lookup.

pub mod duckduckgo;
pub mod finance;
pub mod youtube;

pub use duckduckgo::{DuckDuckGoSearch, DuckDuckGoTools, NewsHit, SearchItem, SearchProvider};
pub use finance::{FinanceTools, MarketData, YahooFinance};
pub use youtube::YouTubeTools;

use crate::error::{Result, SamtaleError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Description of one callable function, as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(name: &str, description: &str, parameters: serde_json::Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }
}

/// A group of callable functions backed by one external service.
#[async_trait]
pub trait Toolkit: Send + Sync {
    /// Toolkit name for logs and listings.
    fn name(&self) -> &str;

    /// Functions this toolkit exposes.
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Invoke a function by name. Argument problems are reported as
    /// `ToolArgument`, service failures as `ToolInvocation`.
    async fn invoke(&self, function: &str, arguments: &serde_json::Value) -> Result<String>;
}

/// Function-name dispatch table for one agent.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
    routes: HashMap<String, Arc<dyn Toolkit>>,
}

impl ToolRegistry {
    /// Create an empty registry (an agent without tools).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from toolkits. Two toolkits exposing the same
    /// function name is a configuration error.
    pub fn from_toolkits(toolkits: Vec<Arc<dyn Toolkit>>) -> Result<Self> {
        let mut registry = Self::new();
        for toolkit in toolkits {
            registry.add(toolkit)?;
        }
        Ok(registry)
    }

    /// Add a toolkit's functions.
    pub fn add(&mut self, toolkit: Arc<dyn Toolkit>) -> Result<()> {
        for definition in toolkit.definitions() {
            if self.routes.contains_key(&definition.name) {
                return Err(SamtaleError::Config(format!(
                    "Tool '{}' is provided by more than one toolkit",
                    definition.name
                )));
            }
            self.routes.insert(definition.name.clone(), Arc::clone(&toolkit));
            self.definitions.push(definition);
        }
        Ok(())
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Names of all registered functions.
    pub fn names(&self) -> Vec<String> {
        self.definitions.iter().map(|d| d.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Resolve and invoke a function from its raw JSON argument string.
    pub async fn invoke(&self, name: &str, arguments: &str) -> Result<String> {
        let toolkit = self
            .routes
            .get(name)
            .ok_or_else(|| SamtaleError::tool_argument(name, "unknown tool"))?;

        let args = parse_arguments(name, arguments)?;
        toolkit.invoke(name, &args).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

/// Parse model-supplied arguments. Small models often send an empty string
/// for functions without parameters, which is treated as `{}`.
fn parse_arguments(tool: &str, arguments: &str) -> Result<serde_json::Value> {
    if arguments.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }

    let value: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| SamtaleError::tool_argument(tool, format!("invalid JSON: {}", e)))?;

    if !value.is_object() {
        return Err(SamtaleError::tool_argument(tool, "arguments must be a JSON object"));
    }
    Ok(value)
}

/// Read a required string argument.
pub(crate) fn required_str<'a>(tool: &str, args: &'a serde_json::Value, key: &str) -> Result<&'a str> {
    args[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SamtaleError::tool_argument(tool, format!("missing '{}' argument", key)))
}

/// Read an optional count argument, clamped to `1..=max`.
pub(crate) fn optional_count(args: &serde_json::Value, key: &str, default: usize, max: usize) -> usize {
    args[key]
        .as_u64()
        .map(|n| n as usize)
        .unwrap_or(default)
        .clamp(1, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTools;

    #[async_trait]
    impl Toolkit for EchoTools {
        fn name(&self) -> &str {
            "echo"
        }

        fn definitions(&self) -> Vec<ToolDefinition> {
            vec![ToolDefinition::new(
                "echo",
                "Echo the text back",
                serde_json::json!({"type": "object", "properties": {"text": {"type": "string"}}}),
            )]
        }

        async fn invoke(&self, function: &str, arguments: &serde_json::Value) -> Result<String> {
            Ok(required_str(function, arguments, "text")?.to_string())
        }
    }

    #[tokio::test]
    async fn test_dispatch_by_name() {
        let registry = ToolRegistry::from_toolkits(vec![Arc::new(EchoTools)]).unwrap();
        let output = registry.invoke("echo", r#"{"text": "hello"}"#).await.unwrap();
        assert_eq!(output, "hello");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_argument_error() {
        let registry = ToolRegistry::from_toolkits(vec![Arc::new(EchoTools)]).unwrap();
        let err = registry.invoke("rm_rf", "{}").await.unwrap_err();
        assert!(matches!(err, SamtaleError::ToolArgument { .. }));
    }

    #[tokio::test]
    async fn test_bad_arguments() {
        let registry = ToolRegistry::from_toolkits(vec![Arc::new(EchoTools)]).unwrap();

        let err = registry.invoke("echo", "{not json").await.unwrap_err();
        assert!(matches!(err, SamtaleError::ToolArgument { .. }));

        let err = registry.invoke("echo", "[1, 2]").await.unwrap_err();
        assert!(matches!(err, SamtaleError::ToolArgument { .. }));

        let err = registry.invoke("echo", "").await.unwrap_err();
        assert!(err.to_string().contains("missing 'text'"));
    }

    #[test]
    fn test_duplicate_function_names_rejected() {
        let result = ToolRegistry::from_toolkits(vec![Arc::new(EchoTools), Arc::new(EchoTools)]);
        assert!(matches!(result, Err(SamtaleError::Config(_))));
    }

    #[test]
    fn test_optional_count_clamps() {
        let args = serde_json::json!({"max_results": 500});
        assert_eq!(optional_count(&args, "max_results", 5, 20), 20);
        assert_eq!(optional_count(&serde_json::json!({}), "max_results", 5, 20), 5);
        assert_eq!(optional_count(&serde_json::json!({"max_results": 0}), "max_results", 5, 20), 1);
    }
}
