//! Mock implementations for testing
//!
//! Provides mock LlmProvider, Tool and QueryAgent implementations.

use crate::agent::QueryAgent;
use crate::error::{AdvisorError, AdvisorResult};
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, TokenUsage,
    ToolCall,
};
use crate::tools::{Tool, ToolDescription, ToolError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One scripted model turn
#[derive(Debug, Clone)]
pub enum MockTurn {
    /// Final answer text
    Answer(String),
    /// Tool calls as (tool name, arguments) pairs
    ToolCalls(Vec<(String, Value)>),
    /// Provider failure
    Fail(LlmError),
}

impl MockTurn {
    pub fn answer(content: impl Into<String>) -> Self {
        Self::Answer(content.into())
    }

    pub fn tool_call(name: impl Into<String>, arguments: Value) -> Self {
        Self::ToolCalls(vec![(name.into(), arguments)])
    }
}

/// Mock LLM provider that replays scripted turns and records every request
///
/// When the script is exhausted the last turn repeats.
pub struct MockLlmProvider {
    turns: Vec<MockTurn>,
    next_turn: Arc<Mutex<usize>>,
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmProvider {
    pub fn new(turns: Vec<MockTurn>) -> Self {
        Self {
            turns,
            next_turn: Arc::new(Mutex::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn single_response(response: impl Into<String>) -> Self {
        Self::new(vec![MockTurn::answer(response)])
    }

    pub fn with_failure() -> Self {
        Self::new(vec![MockTurn::Fail(LlmError::RequestFailed(
            "Mock LLM failure".to_string(),
        ))])
    }

    pub async fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    fn completion(
        content: Option<String>,
        tool_calls: Option<Vec<ToolCall>>,
        finish_reason: FinishReason,
    ) -> CompletionResponse {
        CompletionResponse {
            content,
            model: "mock-model".to_string(),
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
            finish_reason,
            tool_calls,
            metadata: HashMap::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().await.push(request);

        let mut next_turn = self.next_turn.lock().await;
        let index = (*next_turn).min(self.turns.len().saturating_sub(1));
        *next_turn += 1;

        let Some(turn) = self.turns.get(index) else {
            return Ok(Self::completion(
                Some("Mock response".to_string()),
                None,
                FinishReason::Stop,
            ));
        };

        match turn {
            MockTurn::Answer(content) => Ok(Self::completion(
                Some(content.clone()),
                None,
                FinishReason::Stop,
            )),
            MockTurn::ToolCalls(calls) => {
                let tool_calls = calls
                    .iter()
                    .enumerate()
                    .map(|(i, (name, arguments))| ToolCall {
                        id: format!("call_{}_{}", *next_turn, i),
                        name: name.clone(),
                        arguments: arguments.clone(),
                    })
                    .collect();
                Ok(Self::completion(
                    None,
                    Some(tool_calls),
                    FinishReason::ToolCalls,
                ))
            }
            MockTurn::Fail(error) => Err(error.clone()),
        }
    }
}

/// Mock tool returning a fixed output and recording its parameters
pub struct MockTool {
    name: String,
    output: Value,
    should_fail: bool,
    pub calls: Arc<Mutex<Vec<Value>>>,
}

impl MockTool {
    pub fn new(name: impl Into<String>, output: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
            should_fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_failure(name: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            ..Self::new(name, Value::Null)
        }
    }

    pub async fn get_calls(&self) -> Vec<Value> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl Tool for MockTool {
    fn describe(&self) -> ToolDescription {
        ToolDescription {
            name: self.name.clone(),
            description: format!("Mock tool {}", self.name),
            parameters: json!({
                "type": "object",
                "properties": {
                    "input": {"type": "string"}
                },
                "required": ["input"]
            }),
        }
    }

    async fn execute(&self, parameters: &Value) -> Result<Value, ToolError> {
        self.calls.lock().await.push(parameters.clone());

        if self.should_fail {
            return Err(ToolError::ExecutionError(format!(
                "Mock tool {} failure",
                self.name
            )));
        }

        Ok(self.output.clone())
    }
}

/// Mock agent for HTTP server tests
pub struct MockQueryAgent {
    answer: Option<String>,
    error_message: Option<String>,
    pub queries: Arc<Mutex<Vec<String>>>,
}

impl MockQueryAgent {
    pub fn answering(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            error_message: None,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            answer: None,
            error_message: Some(message.into()),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn get_queries(&self) -> Vec<String> {
        self.queries.lock().await.clone()
    }
}

#[async_trait]
impl QueryAgent for MockQueryAgent {
    async fn answer(&self, query: &str) -> AdvisorResult<String> {
        self.queries.lock().await.push(query.to_string());

        match (&self.answer, &self.error_message) {
            (Some(answer), _) => Ok(answer.clone()),
            (None, Some(message)) => Err(AdvisorError::llm_error(message.clone())),
            (None, None) => Err(AdvisorError::internal_error("Mock agent not scripted")),
        }
    }
}
