//! Interactive chat command against a persisted conversation.

use super::{open_registry, report_unknown_agent};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;
use console::style;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Run the interactive chat command.
pub async fn run_chat(agent_id: &str, session: Option<String>, settings: Settings) -> Result<()> {
    let registry = open_registry(&settings)?;
    let agent = match registry.get(agent_id) {
        Ok(agent) => agent,
        Err(e) => {
            report_unknown_agent(&registry, agent_id);
            return Err(e);
        }
    };

    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Converse, &settings).await {
        Output::error(&format!("{}", e));
        Output::info("Run 'samtale doctor' for detailed diagnostics.");
        return Err(e);
    }

    let name = agent.definition().name.clone();
    let mut conversation_id = session.unwrap_or_else(new_conversation_id);

    let earlier = agent.history(&conversation_id).await?;
    println!("\n{}", style(format!("Samtale: {}", name)).bold().cyan());
    println!(
        "{}",
        style("Type your message, or 'exit' to quit. Use 'new' to start a fresh conversation.").dim()
    );
    if earlier.is_empty() {
        println!("{}\n", style(format!("Conversation {}", conversation_id)).dim());
    } else {
        println!(
            "{}\n",
            style(format!(
                "Resuming conversation {} ({} earlier turns)",
                conversation_id,
                earlier.len()
            ))
            .dim()
        );
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF
            println!();
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("new") {
            conversation_id = new_conversation_id();
            Output::info(&format!("Started conversation {}", conversation_id));
            continue;
        }

        debug!("Chat message in {}", conversation_id);
        let spinner = Output::spinner("Thinking...");
        let result = agent.respond(&conversation_id, input).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => {
                println!("\n{} {}\n", style(format!("{}:", name)).cyan().bold(), response.content);
                if response.incomplete {
                    Output::warning("Tool call limit reached; the answer may be incomplete.");
                }
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}

fn new_conversation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
