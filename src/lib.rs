//! Market Advisor
//!
//! An HTTP financial-advisor agent. A query posted to `/query` is answered by
//! a tool-calling chat model that can look up analyst price targets and run
//! web searches before it replies.
//!
//! # Overview
//!
//! - Agent loop with a bounded iteration budget
//! - OpenAI chat-completions provider behind the `LlmProvider` trait
//! - Tool system with JSON schema validation
//! - Warp HTTP server with permissive CORS
//!
//! # Quick Start
//!
//! ```rust
//! use market_advisor::agent::{AgentExecutor, AgentInput, ExecutorSettings, PromptTemplate};
//! use market_advisor::config::DEFAULT_SYSTEM_PROMPT;
//! use market_advisor::testing::MockLlmProvider;
//! use market_advisor::tools::ToolSystem;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let executor = AgentExecutor::new(
//!     Arc::new(MockLlmProvider::single_response("Hello!")),
//!     Arc::new(ToolSystem::new()),
//!     PromptTemplate::new(DEFAULT_SYSTEM_PROMPT),
//!     ExecutorSettings::default(),
//! );
//!
//! let output = executor.invoke(&AgentInput::new("Hi")).await.unwrap();
//! assert_eq!(output.output, "Hello!");
//! # });
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod observability;
pub mod server;
pub mod testing;
pub mod tools;

pub use agent::{AgentExecutor, AgentInput, AgentOutput, QueryAgent};
pub use config::*;
pub use error::{AdvisorError, AdvisorResult};
pub use tools::{Tool, ToolDescription, ToolError, ToolSystem};
