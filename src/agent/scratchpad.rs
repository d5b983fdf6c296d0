//! Per-request record of tool calls and their observations

use crate::llm::provider::{Message, ToolCall};

/// One tool call the model made and what the tool returned
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStep {
    pub call: ToolCall,
    pub observation: String,
}

impl AgentStep {
    pub fn new(call: ToolCall, observation: impl Into<String>) -> Self {
        Self {
            call,
            observation: observation.into(),
        }
    }

    /// Replay as an assistant tool-call turn followed by its tool result
    pub fn to_messages(&self) -> [Message; 2] {
        [
            Message::assistant_tool_calls("", vec![self.call.clone()]),
            Message::tool_result(self.call.id.clone(), self.observation.clone()),
        ]
    }
}

/// Flatten the scratchpad into conversation messages, oldest step first
pub fn format_steps(steps: &[AgentStep]) -> Vec<Message> {
    steps.iter().flat_map(AgentStep::to_messages).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::MessageRole;
    use serde_json::json;

    fn step(id: &str, observation: &str) -> AgentStep {
        AgentStep::new(
            ToolCall {
                id: id.to_string(),
                name: "getStockPriceTarget".to_string(),
                arguments: json!({"ticker": "AAPL"}),
            },
            observation,
        )
    }

    #[test]
    fn test_step_pairs_call_with_result() {
        let [call, result] = step("call_1", "$250").to_messages();

        assert_eq!(call.role, MessageRole::Assistant);
        assert_eq!(call.tool_calls.as_ref().map(|c| c.len()), Some(1));
        assert_eq!(result.role, MessageRole::Tool);
        assert_eq!(result.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(result.content, "$250");
    }

    #[test]
    fn test_format_steps_keeps_order() {
        let messages = format_steps(&[step("call_1", "first"), step("call_2", "second")]);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].content, "first");
        assert_eq!(messages[3].content, "second");
        assert_eq!(messages[3].tool_call_id.as_deref(), Some("call_2"));
    }

    #[test]
    fn test_format_empty_scratchpad() {
        assert!(format_steps(&[]).is_empty());
    }
}
