//! CLI module for Samtale.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Samtale - local agent playground
///
/// Web search, finance and YouTube agents on a local model, with persisted
/// conversations. The name "Samtale" is Norwegian for "conversation."
#[derive(Parser, Debug)]
#[command(name = "samtale")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP playground
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the available agents
    Agents,

    /// Send one message to an agent
    Ask {
        /// Agent ID (e.g. "finance-agent")
        agent: String,

        /// The message to send
        message: String,

        /// Conversation to continue (a new one is started if omitted)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Start an interactive chat with an agent
    Chat {
        /// Agent ID (e.g. "web-agent")
        agent: String,

        /// Conversation to continue (a new one is started if omitted)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Show stored conversations
    History {
        /// Agent ID
        agent: String,

        /// Show the turns of this conversation instead of listing them
        conversation: Option<String>,

        /// Delete the conversation instead of showing it
        #[arg(long, requires = "conversation")]
        delete: bool,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from(["samtale", "ask", "finance-agent", "Price of ACME?", "-s", "c1"]);
        match cli.command {
            Commands::Ask { agent, message, session } => {
                assert_eq!(agent, "finance-agent");
                assert_eq!(message, "Price of ACME?");
                assert_eq!(session.as_deref(), Some("c1"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_history_delete_requires_conversation() {
        assert!(Cli::try_parse_from(["samtale", "history", "web-agent", "--delete"]).is_err());
        assert!(Cli::try_parse_from(["samtale", "history", "web-agent", "c1", "--delete"]).is_ok());
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::parse_from(["samtale", "agents", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }
}
