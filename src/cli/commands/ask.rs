//! Ask command implementation.

use super::{open_registry, report_unknown_agent};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use console::style;

/// Send one message to an agent and print the answer.
pub async fn run_ask(agent_id: &str, message: &str, session: Option<String>, settings: Settings) -> Result<()> {
    let registry = open_registry(&settings)?;
    let agent = match registry.get(agent_id) {
        Ok(agent) => agent,
        Err(e) => {
            report_unknown_agent(&registry, agent_id);
            return Err(e.into());
        }
    };

    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Converse, &settings).await {
        Output::error(&format!("{}", e));
        Output::info("Run 'samtale doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let conversation_id = session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let spinner = Output::spinner(&format!("{} is thinking...", agent.definition().name));

    match registry.route(agent_id, &conversation_id, message).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.content);

            if response.incomplete {
                Output::warning("The agent hit its tool call limit; the answer may be incomplete.");
            }
            println!(
                "{}",
                style(format!(
                    "conversation {} ({} tool calls)",
                    conversation_id,
                    response.tool_calls.len()
                ))
                .dim()
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to get an answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
