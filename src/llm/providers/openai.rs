//! OpenAI provider implementation
//!
//! Chat Completions with function calling. Tool calls are carried both ways:
//! assistant messages replay the calls the model made, tool messages carry
//! the observations keyed by call id.

use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, Message,
    MessageRole, TokenUsage, ToolCall as ProviderToolCall,
};
use crate::tools::ToolDescription;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

/// OpenAI provider configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// OpenAI provider implementation
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::NotConfigured(
                "OpenAI API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Convert completion request to OpenAI format (pure function)
    fn convert_to_openai_request(request: &CompletionRequest) -> OpenAiCompletionRequest {
        let messages = request.messages.iter().map(Self::convert_message).collect();

        let tools = request
            .tools
            .as_ref()
            .filter(|tools| !tools.is_empty())
            .map(|tools| tools.iter().map(Self::convert_tool).collect());

        OpenAiCompletionRequest {
            model: request.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools,
            tool_choice: request.tool_choice.clone(),
        }
    }

    /// Convert internal message to OpenAI format (pure function)
    fn convert_message(message: &Message) -> OpenAiMessage {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        };

        let tool_calls = message.tool_calls.as_ref().map(|calls| {
            calls
                .iter()
                .map(|call| OpenAiToolCall {
                    id: call.id.clone(),
                    call_type: "function".to_string(),
                    function: OpenAiFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.to_string(),
                    },
                })
                .collect()
        });

        // An assistant turn that only carries tool calls sends null content
        let content = if tool_calls.is_some() && message.content.is_empty() {
            None
        } else {
            Some(message.content.clone())
        };

        OpenAiMessage {
            role: role.to_string(),
            content,
            tool_calls,
            tool_call_id: message.tool_call_id.clone(),
        }
    }

    /// Convert tool description to OpenAI tool format (pure function)
    fn convert_tool(tool_desc: &ToolDescription) -> OpenAiTool {
        OpenAiTool {
            tool_type: "function".to_string(),
            function: OpenAiFunction {
                name: tool_desc.name.clone(),
                description: tool_desc.description.clone(),
                parameters: tool_desc.parameters.clone(),
            },
        }
    }

    /// Parse OpenAI completion response (pure function)
    fn parse_completion_response(
        openai_response: OpenAiCompletionResponse,
        request_metadata: std::collections::HashMap<String, String>,
    ) -> Result<CompletionResponse, LlmError> {
        let choice = openai_response.choices.into_iter().next().ok_or_else(|| {
            LlmError::InvalidResponse("No choices returned from OpenAI".to_string())
        })?;

        let usage = TokenUsage {
            prompt_tokens: openai_response.usage.prompt_tokens,
            completion_tokens: openai_response.usage.completion_tokens,
            total_tokens: openai_response.usage.total_tokens,
        };

        let tool_calls = choice
            .message
            .tool_calls
            .as_deref()
            .map(Self::extract_tool_calls)
            .transpose()?;

        Ok(CompletionResponse {
            content: choice.message.content,
            model: openai_response.model,
            usage,
            finish_reason: Self::convert_finish_reason(choice.finish_reason.as_deref()),
            tool_calls,
            metadata: request_metadata,
        })
    }

    /// Extract tool calls from OpenAI format (pure function)
    ///
    /// Arguments arrive as a JSON-encoded string; a call whose arguments do
    /// not decode is reported rather than silently dropped.
    fn extract_tool_calls(calls: &[OpenAiToolCall]) -> Result<Vec<ProviderToolCall>, LlmError> {
        calls
            .iter()
            .map(|call| {
                let arguments = if call.function.arguments.trim().is_empty() {
                    serde_json::Value::Object(serde_json::Map::new())
                } else {
                    serde_json::from_str(&call.function.arguments).map_err(|e| {
                        error!(
                            "Failed to parse arguments for tool call {}: {}",
                            call.function.name, e
                        );
                        LlmError::InvalidResponse(format!(
                            "Could not parse arguments for tool '{}': {e}",
                            call.function.name
                        ))
                    })?
                };

                Ok(ProviderToolCall {
                    id: call.id.clone(),
                    name: call.function.name.clone(),
                    arguments,
                })
            })
            .collect()
    }

    /// Convert OpenAI finish reason to internal format (pure function)
    fn convert_finish_reason(reason: Option<&str>) -> FinishReason {
        match reason {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("tool_calls") | Some("function_call") => FinishReason::ToolCalls,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Error,
        }
    }

    /// Map a non-success status to a provider error (pure function)
    fn classify_status(status: StatusCode, body: &str) -> LlmError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                LlmError::AuthenticationFailed(format!("OpenAI API error: {status} - {body}"))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                LlmError::RateLimitExceeded(format!("OpenAI API error: {status} - {body}"))
            }
            _ if status.is_server_error() => {
                LlmError::ApiError(format!("OpenAI API server error: {status} - {body}"))
            }
            _ => LlmError::ApiError(format!("OpenAI API error: {status} - {body}")),
        }
    }

    /// Make single API request (impure I/O)
    async fn make_api_request(
        &self,
        openai_request: &OpenAiCompletionRequest,
    ) -> Result<OpenAiCompletionResponse, LlmError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(openai_request)
            .send()
            .await
            .map_err(|e| {
                let error_msg = format!(
                    "HTTP request failed: {} (is_connect: {}, is_timeout: {})",
                    e,
                    e.is_connect(),
                    e.is_timeout()
                );
                warn!("OpenAI network error details: {}", error_msg);
                LlmError::NetworkError(error_msg)
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "OpenAI API error - Status: {}, Response: {}",
                status, error_text
            );

            if error_text.contains("maximum context length") {
                warn!("Token limit exceeded - scratchpad may be too long");
            }

            return Err(Self::classify_status(status, &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }

    /// Log response information (impure)
    fn log_response_info(&self, response: &CompletionResponse) {
        debug!(
            "OpenAI response: {} tokens used (prompt: {}, completion: {}), finish_reason: {:?}, tool_calls: {}",
            response.usage.total_tokens,
            response.usage.prompt_tokens,
            response.usage.completion_tokens,
            response.finish_reason,
            response.tool_calls.as_ref().map(|tc| tc.len()).unwrap_or(0)
        );
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let openai_request = Self::convert_to_openai_request(&request);

        debug!(
            "OpenAI request: model={}, {} messages, {} tools",
            openai_request.model,
            openai_request.messages.len(),
            openai_request.tools.as_ref().map(|t| t.len()).unwrap_or(0)
        );

        let openai_response = self.make_api_request(&openai_request).await?;
        let response = Self::parse_completion_response(openai_response, request.metadata)?;
        self.log_response_info(&response);
        Ok(response)
    }
}

#[derive(Debug, Serialize)]
struct OpenAiCompletionRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiCompletionResponse {
    model: String,
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: OpenAiUsage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type", default = "default_call_type")]
    call_type: String,
    function: OpenAiFunctionCall,
}

fn default_call_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
