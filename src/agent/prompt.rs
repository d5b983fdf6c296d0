//! Prompt template for the advisor agent
//!
//! Message order is fixed: system persona, optional chat history, the human
//! input, then the scratchpad of tool calls made so far.

use crate::agent::scratchpad::{format_steps, AgentStep};
use crate::config::LlmSection;
use crate::llm::provider::Message;

/// Input for one agent invocation
#[derive(Debug, Clone, Default)]
pub struct AgentInput {
    pub input: String,
    /// Earlier turns of the conversation; the HTTP server never fills this
    pub chat_history: Vec<Message>,
}

impl AgentInput {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            chat_history: Vec::new(),
        }
    }

    pub fn with_chat_history(mut self, chat_history: Vec<Message>) -> Self {
        self.chat_history = chat_history;
        self
    }
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    system_prompt: String,
    include_current_date: bool,
}

impl PromptTemplate {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            include_current_date: false,
        }
    }

    pub fn from_config(llm: &LlmSection) -> Self {
        Self::new(llm.system_prompt.clone()).with_current_date(llm.include_current_date)
    }

    /// Append the current UTC date/time to the system prompt
    pub fn with_current_date(mut self, include_current_date: bool) -> Self {
        self.include_current_date = include_current_date;
        self
    }

    fn system_message(&self) -> Message {
        if self.include_current_date {
            let now = chrono::Utc::now();
            Message::system(format!(
                "{}\n\nCurrent date and time: {} UTC",
                self.system_prompt,
                now.format("%Y-%m-%d %H:%M:%S")
            ))
        } else {
            Message::system(self.system_prompt.clone())
        }
    }

    /// Render the full conversation for the next model turn
    pub fn format_messages(&self, input: &AgentInput, scratchpad: &[AgentStep]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2 + input.chat_history.len() + scratchpad.len() * 2);
        messages.push(self.system_message());
        messages.extend(input.chat_history.iter().cloned());
        messages.push(Message::user(input.input.clone()));
        messages.extend(format_steps(scratchpad));
        messages
    }
}
