//! Error types for Samtale.

use thiserror::Error;

/// Library-level error type for Samtale operations.
#[derive(Error, Debug)]
pub enum SamtaleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model backend unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Tool '{tool}' failed: {message}")]
    ToolInvocation { tool: String, message: String },

    #[error("Invalid arguments for tool '{tool}': {message}")]
    ToolArgument { tool: String, message: String },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Unknown agent: {0}")]
    UnknownAgentId(String),

    #[error("Tool call limit exceeded ({0} calls)")]
    ToolCallLimitExceeded(usize),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SamtaleError {
    /// Shorthand for a tool invocation failure.
    pub fn tool(tool: &str, message: impl Into<String>) -> Self {
        SamtaleError::ToolInvocation {
            tool: tool.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for a rejected tool argument.
    pub fn tool_argument(tool: &str, message: impl Into<String>) -> Self {
        SamtaleError::ToolArgument {
            tool: tool.to_string(),
            message: message.into(),
        }
    }

    /// Whether the caller may retry the whole request unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SamtaleError::ModelUnavailable(_) | SamtaleError::StorageUnavailable(_)
        )
    }
}

impl From<rusqlite::Error> for SamtaleError {
    fn from(e: rusqlite::Error) -> Self {
        SamtaleError::StorageUnavailable(e.to_string())
    }
}

impl From<async_openai::error::OpenAIError> for SamtaleError {
    fn from(e: async_openai::error::OpenAIError) -> Self {
        SamtaleError::ModelUnavailable(e.to_string())
    }
}

/// Result type alias for Samtale operations.
pub type Result<T> = std::result::Result<T, SamtaleError>;
