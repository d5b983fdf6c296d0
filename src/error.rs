//! Error types for the market advisor service
//!
//! Every failure that reaches the HTTP layer is an [`AdvisorError`]; its
//! `Display` text is what callers see in the `error` field of a 500 response.

use thiserror::Error;

/// Main error type for agent and server operations
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("LLM provider error: {message}")]
    LlmError { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),

    #[error("Tool error: {0}")]
    ToolError(#[from] crate::tools::ToolError),
}

impl AdvisorError {
    /// Create LLM error
    pub fn llm_error<S: Into<String>>(message: S) -> Self {
        Self::LlmError {
            message: message.into(),
        }
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create internal error
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

impl From<crate::llm::LlmError> for AdvisorError {
    fn from(error: crate::llm::LlmError) -> Self {
        Self::llm_error(error.to_string())
    }
}

/// Result type for advisor operations
pub type AdvisorResult<T> = Result<T, AdvisorError>;
