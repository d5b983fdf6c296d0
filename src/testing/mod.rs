//! Testing utilities and mock implementations
//!
//! Mocks stand in for the LLM provider, individual tools and the whole agent
//! so the loop and the HTTP surface can be exercised without network access.

pub mod mocks;

pub use mocks::*;
