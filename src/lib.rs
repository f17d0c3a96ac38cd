//! Samtale - local agent playground
//!
//! Three conversational agents (web search, finance and YouTube) on a locally
//! hosted model, each with its own tools and persisted conversation history,
//! served over HTTP and usable from the command line.
//!
//! The name "Samtale" is Norwegian for "conversation."
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `model` - Chat model backends (Ollama via its OpenAI-compatible API)
//! - `tools` - DuckDuckGo, Yahoo Finance and YouTube tool adapters
//! - `storage` - Per-agent conversation stores (SQLite, memory)
//! - `agent` - Agent definitions and the tool calling loop
//! - `registry` - Dispatch by agent ID
//! - `catalog` - The built-in agents
//! - `playground` - HTTP API
//!
//! # Example
//!
//! ```rust,no_run
//! use samtale::config::Settings;
//! use samtale::{catalog, storage};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let registry = catalog::build_registry(&settings, storage::open_store(&settings)?)?;
//!
//!     let response = registry
//!         .route("finance-agent", "demo", "What is the stock price of NVDA?")
//!         .await?;
//!     println!("{}", response.content);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod openai;
pub mod playground;
pub mod registry;
pub mod storage;
pub mod tools;

pub use error::{Result, SamtaleError};
