//! LLM provider abstraction layer
//!
//! A provider-agnostic chat-completion interface with function calling, plus
//! the OpenAI implementation the advisor agent runs on.

pub mod provider;
pub mod providers;

pub use provider::*;
pub use providers::*;
