//! Agent loop: model turn, tool calls, observations, repeat
//!
//! Each iteration sends the rendered prompt plus scratchpad to the model. A
//! response without tool calls ends the loop with its content as the answer.
//! Otherwise every requested call runs in order and lands on the scratchpad.
//! When the iteration budget is spent the loop stops with a fixed message
//! instead of an error.

use crate::agent::prompt::{AgentInput, PromptTemplate};
use crate::agent::scratchpad::AgentStep;
use crate::agent::QueryAgent;
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, AdvisorResult};
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider, ToolCall};
use crate::tools::{ToolDescription, ToolError, ToolSystem};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const ITERATION_LIMIT_MESSAGE: &str = "Agent stopped due to iteration limit or time limit.";

/// Model parameters and loop budget
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_iterations: usize,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self::from_config(&AdvisorConfig::default())
    }
}

impl ExecutorSettings {
    pub fn from_config(config: &AdvisorConfig) -> Self {
        Self {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            max_iterations: config.agent.max_iterations,
        }
    }
}

/// Result of one agent invocation
#[derive(Debug, Clone)]
pub struct AgentOutput {
    pub output: String,
    pub intermediate_steps: Vec<AgentStep>,
    pub iterations: usize,
    /// True when the iteration budget ran out before a final answer
    pub stopped_early: bool,
}

pub struct AgentExecutor {
    llm_provider: Arc<dyn LlmProvider>,
    tool_system: Arc<ToolSystem>,
    prompt: PromptTemplate,
    settings: ExecutorSettings,
}

impl AgentExecutor {
    pub fn new(
        llm_provider: Arc<dyn LlmProvider>,
        tool_system: Arc<ToolSystem>,
        prompt: PromptTemplate,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            llm_provider,
            tool_system,
            prompt,
            settings,
        }
    }

    pub fn from_config(
        config: &AdvisorConfig,
        llm_provider: Arc<dyn LlmProvider>,
        tool_system: Arc<ToolSystem>,
    ) -> Self {
        Self::new(
            llm_provider,
            tool_system,
            PromptTemplate::from_config(&config.llm),
            ExecutorSettings::from_config(config),
        )
    }

    /// Run the loop for one input
    pub async fn invoke(&self, input: &AgentInput) -> AdvisorResult<AgentOutput> {
        let available_tools = self.tool_system.descriptions();
        let mut intermediate_steps: Vec<AgentStep> = Vec::new();

        for iteration in 1..=self.settings.max_iterations {
            let messages = self.prompt.format_messages(input, &intermediate_steps);
            let request = self.create_completion_request(messages, &available_tools);

            let response = self
                .llm_provider
                .complete(request)
                .await
                .map_err(AdvisorError::from)?;

            if !response.has_tool_calls() {
                info!(
                    iterations = iteration,
                    tool_calls = intermediate_steps.len(),
                    "Agent produced final answer"
                );
                return Ok(AgentOutput {
                    output: Self::extract_final_content(&response),
                    intermediate_steps,
                    iterations: iteration,
                    stopped_early: false,
                });
            }

            let tool_calls = response.tool_calls.unwrap_or_default();
            debug!(
                iteration = iteration,
                tool_count = tool_calls.len(),
                "Processing tool calls"
            );

            for tool_call in tool_calls {
                let observation = self.run_tool_call(&tool_call).await?;
                intermediate_steps.push(AgentStep::new(tool_call, observation));
            }
        }

        warn!(
            max_iterations = self.settings.max_iterations,
            tool_calls = intermediate_steps.len(),
            "Agent stopped at iteration limit"
        );
        Ok(AgentOutput {
            output: ITERATION_LIMIT_MESSAGE.to_string(),
            intermediate_steps,
            iterations: self.settings.max_iterations,
            stopped_early: true,
        })
    }

    /// Create completion request (pure function)
    fn create_completion_request(
        &self,
        messages: Vec<crate::llm::provider::Message>,
        available_tools: &[ToolDescription],
    ) -> CompletionRequest {
        CompletionRequest {
            messages,
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            tools: if available_tools.is_empty() {
                None
            } else {
                Some(available_tools.to_vec())
            },
            tool_choice: None,
            metadata: HashMap::new(),
        }
    }

    /// Execute one tool call and produce its observation
    ///
    /// A call naming an unregistered tool becomes an observation telling the
    /// model which tools exist. Every other tool failure aborts the query.
    async fn run_tool_call(&self, tool_call: &ToolCall) -> AdvisorResult<String> {
        debug!(
            "Executing tool: {} with args: {}",
            tool_call.name, tool_call.arguments
        );

        match self
            .tool_system
            .execute_tool(&tool_call.name, &tool_call.arguments)
            .await
        {
            Ok(result) => Ok(Self::observation_text(result)),
            Err(ToolError::UnknownTool(name)) => {
                warn!("Model requested unknown tool: {}", name);
                Ok(Self::invalid_tool_observation(
                    &name,
                    &self.tool_system.list_tools(),
                ))
            }
            Err(e) => {
                warn!("Tool '{}' failed: {}", tool_call.name, e);
                Err(AdvisorError::from(e))
            }
        }
    }

    /// Tool output as text; strings pass through unquoted (pure function)
    fn observation_text(result: Value) -> String {
        match result {
            Value::String(text) => text,
            other => other.to_string(),
        }
    }

    /// Observation for a call to a tool that does not exist (pure function)
    fn invalid_tool_observation(name: &str, available: &[String]) -> String {
        format!(
            "{name} is not a valid tool, try one of [{}].",
            available.join(", ")
        )
    }

    /// Extract final content from LLM response (pure extraction)
    fn extract_final_content(response: &CompletionResponse) -> String {
        response.content.clone().unwrap_or_default()
    }
}

#[async_trait]
impl QueryAgent for AgentExecutor {
    async fn answer(&self, query: &str) -> AdvisorResult<String> {
        let output = self.invoke(&AgentInput::new(query)).await?;
        Ok(output.output)
    }
}
