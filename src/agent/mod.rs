//! Tool-augmented advisor agent
//!
//! The agent turns a user query into a chat-completion conversation, runs the
//! tool calls the model asks for, feeds each observation back, and stops at
//! the first plain answer or when the iteration budget runs out.

pub mod executor;
pub mod prompt;
pub mod scratchpad;

use crate::error::AdvisorResult;
use async_trait::async_trait;

pub use executor::{AgentExecutor, AgentOutput, ExecutorSettings, ITERATION_LIMIT_MESSAGE};
pub use prompt::{AgentInput, PromptTemplate};
pub use scratchpad::AgentStep;

/// Anything that can answer a free-text query
///
/// The HTTP server depends on this seam rather than on the executor.
#[async_trait]
pub trait QueryAgent: Send + Sync {
    async fn answer(&self, query: &str) -> AdvisorResult<String>;
}
