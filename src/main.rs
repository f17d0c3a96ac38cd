//! Samtale CLI entry point.

use anyhow::Result;
use clap::Parser;
use samtale::cli::{commands, Cli, Commands};
use samtale::config::Settings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging: -v flags win over general.log_level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("samtale={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ensure data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Agents => {
            commands::run_agents(&settings)?;
        }

        Commands::Ask { agent, message, session } => {
            commands::run_ask(agent, message, session.clone(), settings).await?;
        }

        Commands::Chat { agent, session } => {
            commands::run_chat(agent, session.clone(), settings).await?;
        }

        Commands::History {
            agent,
            conversation,
            delete,
        } => {
            commands::run_history(agent, conversation.as_deref(), *delete, &settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
