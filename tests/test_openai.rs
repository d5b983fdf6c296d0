//! Integration tests for OpenAI provider
//!
//! Tests behavioral contracts against a mock chat-completions endpoint:
//! - API request/response handling
//! - Error classification (auth failures, rate limits, server errors)
//! - Tool-call round trip on the wire

use market_advisor::llm::provider::{
    CompletionRequest, FinishReason, LlmError, LlmProvider, Message, ToolCall,
};
use market_advisor::llm::providers::openai::{OpenAiConfig, OpenAiProvider};
use market_advisor::tools::ToolDescription;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> OpenAiConfig {
    OpenAiConfig {
        api_key: "test-api-key".to_string(),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
    }
}

fn test_request(messages: Vec<Message>) -> CompletionRequest {
    CompletionRequest {
        messages,
        model: "gpt-4".to_string(),
        max_tokens: None,
        temperature: Some(0.0),
        tools: None,
        tool_choice: None,
        metadata: HashMap::new(),
    }
}

fn stock_tool() -> ToolDescription {
    ToolDescription {
        name: "getStockPriceTarget".to_string(),
        description: "Get the highest price target for a stock ticker".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {"ticker": {"type": "string"}},
            "required": ["ticker"]
        }),
    }
}

fn text_completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1677652288,
        "model": "gpt-4",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }
        ],
        "usage": {"prompt_tokens": 10, "completion_tokens": 15, "total_tokens": 25}
    })
}

#[tokio::test]
async fn test_openai_provider_returns_successful_completion_with_valid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_completion(
            "Hello! How can I assist you today?",
        )))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let response = provider
        .complete(test_request(vec![Message::user("Hello")]))
        .await
        .unwrap();

    assert_eq!(
        response.content,
        Some("Hello! How can I assist you today?".to_string())
    );
    assert_eq!(response.finish_reason, FinishReason::Stop);
    assert_eq!(response.usage.total_tokens, 25);
    assert!(!response.has_tool_calls());
}

#[tokio::test]
async fn test_openai_provider_parses_tool_calls() {
    let mock_server = MockServer::start().await;

    let response_body = json!({
        "id": "chatcmpl-456",
        "object": "chat.completion",
        "created": 1677652288,
        "model": "gpt-4",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {
                            "id": "call_abc",
                            "type": "function",
                            "function": {
                                "name": "getStockPriceTarget",
                                "arguments": "{\"ticker\": \"AAPL\"}"
                            }
                        }
                    ]
                },
                "finish_reason": "tool_calls"
            }
        ],
        "usage": {"prompt_tokens": 40, "completion_tokens": 12, "total_tokens": 52}
    });

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let mut request = test_request(vec![Message::user("What is AAPL's price target?")]);
    request.tools = Some(vec![stock_tool()]);

    let response = provider.complete(request).await.unwrap();

    assert!(response.has_tool_calls());
    assert_eq!(response.finish_reason, FinishReason::ToolCalls);
    assert_eq!(response.content, None);
    assert_eq!(
        response.tool_calls.unwrap(),
        vec![ToolCall {
            id: "call_abc".to_string(),
            name: "getStockPriceTarget".to_string(),
            arguments: json!({"ticker": "AAPL"}),
        }]
    );
}

#[tokio::test]
async fn test_openai_provider_sends_tools_and_tool_messages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "model": "gpt-4",
            "temperature": 0.0,
            "tools": [
                {"type": "function", "function": {"name": "getStockPriceTarget"}}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_completion(
            "AAPL's high target is $250.00.",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();

    let call = ToolCall {
        id: "call_abc".to_string(),
        name: "getStockPriceTarget".to_string(),
        arguments: json!({"ticker": "AAPL"}),
    };
    let mut request = test_request(vec![
        Message::system("You are a helpful financial advisor."),
        Message::user("What is AAPL's price target?"),
        Message::assistant_tool_calls("", vec![call]),
        Message::tool_result("call_abc", "The highest price target for AAPL is $250.00"),
    ]);
    request.tools = Some(vec![stock_tool()]);

    provider.complete(request).await.unwrap();

    let received = mock_server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    let messages = body["messages"].as_array().unwrap();

    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2]["role"], "assistant");
    assert!(messages[2]["content"].is_null());
    assert_eq!(messages[2]["tool_calls"][0]["id"], "call_abc");
    assert_eq!(messages[2]["tool_calls"][0]["type"], "function");
    let arguments: Value = serde_json::from_str(
        messages[2]["tool_calls"][0]["function"]["arguments"]
            .as_str()
            .unwrap(),
    )
    .unwrap();
    assert_eq!(arguments, json!({"ticker": "AAPL"}));

    assert_eq!(messages[3]["role"], "tool");
    assert_eq!(messages[3]["tool_call_id"], "call_abc");
    assert_eq!(
        messages[3]["content"],
        "The highest price target for AAPL is $250.00"
    );
}

#[tokio::test]
async fn test_openai_provider_handles_authentication_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider
        .complete(test_request(vec![Message::user("Hello")]))
        .await;

    assert!(matches!(result, Err(LlmError::AuthenticationFailed(_))));
}

#[tokio::test]
async fn test_openai_provider_handles_rate_limit_without_retrying() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit reached", "type": "rate_limit_error"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider
        .complete(test_request(vec![Message::user("Hello")]))
        .await;

    assert!(matches!(result, Err(LlmError::RateLimitExceeded(_))));
}

#[tokio::test]
async fn test_openai_provider_handles_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider
        .complete(test_request(vec![Message::user("Hello")]))
        .await;

    match result {
        Err(LlmError::ApiError(message)) => assert!(message.contains("upstream exploded")),
        other => panic!("Expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_provider_rejects_response_without_choices() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-789",
            "model": "gpt-4",
            "choices": []
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new(test_config(&mock_server.uri())).unwrap();
    let result = provider
        .complete(test_request(vec![Message::user("Hello")]))
        .await;

    assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_openai_provider_reports_network_error() {
    let provider = OpenAiProvider::new(test_config("http://127.0.0.1:1")).unwrap();
    let result = provider
        .complete(test_request(vec![Message::user("Hello")]))
        .await;

    assert!(matches!(result, Err(LlmError::NetworkError(_))));
}

#[test]
fn test_openai_provider_requires_api_key() {
    let config = OpenAiConfig {
        api_key: String::new(),
        ..Default::default()
    };

    assert!(matches!(
        OpenAiProvider::new(config),
        Err(LlmError::NotConfigured(_))
    ));
}
