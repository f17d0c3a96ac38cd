//! CLI output formatting utilities.

use crate::registry::AgentSummary;
use crate::storage::{ConversationSummary, ConversationTurn, TurnRole};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print agent info.
    pub fn agent_info(agent: &AgentSummary) {
        println!(
            "  {} {} ({}) - {}",
            style("*").cyan(),
            style(&agent.name).bold(),
            style(&agent.agent_id).dim(),
            agent.role
        );
        if !agent.tools.is_empty() {
            println!("    {} {}", style("tools:").dim(), agent.tools.join(", "));
        }
    }

    /// Print a conversation summary line.
    pub fn session_info(session: &ConversationSummary) {
        println!(
            "  {} {} ({}, {} turns, {})",
            style("*").cyan(),
            style(&session.title).bold(),
            style(&session.conversation_id).dim(),
            session.turn_count,
            session.updated_at.format("%Y-%m-%d %H:%M")
        );
    }

    /// Print one stored turn.
    pub fn turn(turn: &ConversationTurn, agent_name: &str) {
        let speaker = match turn.role {
            TurnRole::User => style("You:".to_string()).green().bold(),
            TurnRole::Agent => style(format!("{}:", agent_name)).cyan().bold(),
            TurnRole::Tool => style("Tool:".to_string()).dim(),
        };
        println!(
            "\n{} {} {}",
            style(format!("#{}", turn.sequence)).dim(),
            speaker,
            style(turn.created_at.format("%H:%M:%S")).dim()
        );
        println!("{}", turn.content);

        if let Some(calls) = &turn.tool_calls {
            for call in calls {
                let marker = if call.failed { style("✗").red() } else { style("✓").green() };
                println!("    {} {}", marker, style(call).dim());
            }
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
