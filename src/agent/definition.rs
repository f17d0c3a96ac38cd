//! Static agent configuration.

use chrono::{DateTime, Utc};

/// Default cap on tool calls per user message.
pub const DEFAULT_MAX_TOOL_CALLS: usize = 10;

/// Everything that describes an agent apart from its collaborators.
///
/// Built once at startup with the builder methods and never mutated after
/// being handed to an [`Agent`](super::Agent).
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDefinition {
    /// Unique identifier used for routing (e.g. "web-agent").
    pub id: String,
    /// Display name.
    pub name: String,
    /// One-line role shown in listings.
    pub role: String,
    /// Optional opening paragraph of the system message.
    pub description: Option<String>,
    /// Ordered instructions.
    pub instructions: Vec<String>,
    /// Conversation store table for this agent.
    pub storage_table: String,
    /// Ask the model to answer in markdown.
    pub markdown: bool,
    /// Prefix answers with the list of tool calls made.
    pub show_tool_calls: bool,
    pub add_name_to_instructions: bool,
    pub add_datetime_to_instructions: bool,
    /// Include prior turns in the model context.
    pub add_history_to_messages: bool,
    /// Number of prior turns to include when history is enabled.
    pub history_depth: usize,
    pub max_tool_calls: usize,
}

impl AgentDefinition {
    /// Create a definition with the given ID and display name.
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            role: String::new(),
            description: None,
            instructions: Vec::new(),
            storage_table: id.replace('-', "_"),
            markdown: false,
            show_tool_calls: false,
            add_name_to_instructions: false,
            add_datetime_to_instructions: false,
            add_history_to_messages: false,
            history_depth: 0,
            max_tool_calls: DEFAULT_MAX_TOOL_CALLS,
        }
    }

    pub fn role(mut self, role: &str) -> Self {
        self.role = role.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Append instructions, keeping order.
    pub fn instructions<I, S>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instructions.extend(instructions.into_iter().map(Into::into));
        self
    }

    pub fn storage_table(mut self, table: &str) -> Self {
        self.storage_table = table.to_string();
        self
    }

    pub fn markdown(mut self, enabled: bool) -> Self {
        self.markdown = enabled;
        self
    }

    pub fn show_tool_calls(mut self, enabled: bool) -> Self {
        self.show_tool_calls = enabled;
        self
    }

    pub fn add_name_to_instructions(mut self, enabled: bool) -> Self {
        self.add_name_to_instructions = enabled;
        self
    }

    pub fn add_datetime_to_instructions(mut self, enabled: bool) -> Self {
        self.add_datetime_to_instructions = enabled;
        self
    }

    /// Include the last `depth` turns of the conversation in every request.
    pub fn with_history(mut self, depth: usize) -> Self {
        self.add_history_to_messages = true;
        self.history_depth = depth;
        self
    }

    pub fn max_tool_calls(mut self, max: usize) -> Self {
        self.max_tool_calls = max;
        self
    }

    /// Number of prior turns read per request.
    pub fn history_window(&self) -> usize {
        if self.add_history_to_messages {
            self.history_depth
        } else {
            0
        }
    }

    /// Assemble the system message.
    pub fn system_message(&self, now: DateTime<Utc>) -> String {
        let mut sections = Vec::new();

        if let Some(description) = &self.description {
            sections.push(description.clone());
        }

        if !self.instructions.is_empty() {
            let list = self
                .instructions
                .iter()
                .map(|i| format!("- {}", i))
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("## Instructions\n{}", list));
        }

        let mut extras = Vec::new();
        if self.markdown {
            extras.push("Use markdown to format your answers.".to_string());
        }
        if self.add_name_to_instructions {
            extras.push(format!("Your name is: {}.", self.name));
        }
        if self.add_datetime_to_instructions {
            extras.push(format!(
                "The current time is {}.",
                now.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
        if !extras.is_empty() {
            sections.push(extras.join("\n"));
        }

        sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_storage_table() {
        let definition = AgentDefinition::new("finance-agent", "Finance Agent");
        assert_eq!(definition.storage_table, "finance_agent");
    }

    #[test]
    fn test_history_window() {
        let definition = AgentDefinition::new("a", "A");
        assert_eq!(definition.history_window(), 0);

        let definition = definition.with_history(4);
        assert_eq!(definition.history_window(), 4);
    }

    #[test]
    fn test_system_message_layout() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let definition = AgentDefinition::new("finance-agent", "Finance Agent")
            .description("You are an investment analyst.")
            .instructions(["Always use tables to display data"])
            .instructions(vec!["Be brief".to_string()])
            .markdown(true)
            .add_name_to_instructions(true)
            .add_datetime_to_instructions(true);

        let message = definition.system_message(now);
        assert_eq!(
            message,
            "You are an investment analyst.\n\n\
             ## Instructions\n- Always use tables to display data\n- Be brief\n\n\
             Use markdown to format your answers.\n\
             Your name is: Finance Agent.\n\
             The current time is 2024-05-01 12:30:00 UTC."
        );
    }

    #[test]
    fn test_empty_system_message() {
        let definition = AgentDefinition::new("bare", "Bare");
        assert!(definition.system_message(Utc::now()).is_empty());
    }
}
