//! Observability for the market advisor service
//!
//! Structured logging through `tracing`, with span macros for HTTP queries
//! and tool executions.

pub mod logging;

pub use logging::{init_default_logging, init_logging, LogFormat};

// Span macros for structured logging
pub use logging::{query_span, tool_span};
