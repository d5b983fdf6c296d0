//! Tool system for the advisor agent
//!
//! A tool is a named function with a description and a JSON schema for its
//! arguments. The [`ToolSystem`] owns the registered tools, validates call
//! arguments against each schema, and dispatches execution by name.

use crate::config::ToolsSection;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod builtin;

/// Tool interface
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and JSON schema advertised to the model
    fn describe(&self) -> ToolDescription;

    /// Called once before the tool is registered
    async fn initialize(&mut self) -> Result<(), ToolError> {
        Ok(())
    }

    /// Receives parameters already validated against the schema from describe()
    async fn execute(&self, parameters: &Value) -> Result<Value, ToolError>;
}

/// Tool description advertised to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescription {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Registry of initialized tools, in registration order
pub struct ToolSystem {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolSystem {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Build the advisor's two builtin tools from configuration
    pub async fn from_config(config: &ToolsSection) -> Result<Self, ToolError> {
        let mut tool_system = Self::new();
        tool_system
            .register(Box::new(builtin::StockPriceTargetTool::new(
                config.stock_price.clone(),
            )))
            .await?;
        tool_system
            .register(Box::new(builtin::GoogleSearchTool::new(
                config.google_search.clone(),
            )))
            .await?;
        Ok(tool_system)
    }

    /// Initialize a tool and add it to the registry
    pub async fn register(&mut self, mut tool: Box<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.describe().name;
        if self.find(&name).is_some() {
            return Err(ToolError::DuplicateTool(name));
        }

        tool.initialize().await?;
        tracing::debug!("Registered tool: {}", name);
        self.tools.push(tool);
        Ok(())
    }

    fn find(&self, tool_name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|tool| tool.describe().name == tool_name)
            .map(|tool| tool.as_ref())
    }

    /// Get tool description
    pub fn describe_tool(&self, tool_name: &str) -> Option<ToolDescription> {
        self.find(tool_name).map(|tool| tool.describe())
    }

    /// Descriptions of every registered tool, in registration order
    pub fn descriptions(&self) -> Vec<ToolDescription> {
        self.tools.iter().map(|tool| tool.describe()).collect()
    }

    /// Execute tool with validated parameters
    pub async fn execute_tool(
        &self,
        tool_name: &str,
        parameters: &Value,
    ) -> Result<Value, ToolError> {
        let tool = self
            .find(tool_name)
            .ok_or_else(|| ToolError::UnknownTool(tool_name.to_string()))?;

        Self::validate_parameters(&tool.describe(), parameters)?;

        tool.execute(parameters).await
    }

    /// Validate parameters against the tool schema
    fn validate_parameters(
        description: &ToolDescription,
        parameters: &Value,
    ) -> Result<(), ToolError> {
        let validator = jsonschema::validator_for(&description.parameters)
            .map_err(|e| ToolError::SchemaError(format!("Schema compilation error: {e}")))?;

        validator.validate(parameters).map_err(|errors| {
            let error_messages: Vec<String> = errors
                .map(|e| format!("At '{}': {}", e.instance_path, e))
                .collect();
            ToolError::ValidationError(error_messages.join("; "))
        })
    }

    /// Names of the registered tools, in registration order
    pub fn list_tools(&self) -> Vec<String> {
        self.tools.iter().map(|tool| tool.describe().name).collect()
    }
}

impl Default for ToolSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Render an error followed by each distinct cause in its `source()` chain
///
/// Transport errors only name the failing URL at the top level; the cause
/// (DNS, refused connection, TLS) sits further down the chain.
pub(crate) fn error_chain(error: &dyn std::error::Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}

/// Tool system errors
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),
    #[error("Tool initialization failed: {0}")]
    InitializationError(String),
    #[error("Parameter validation failed: {0}")]
    ValidationError(String),
    #[error("Schema error: {0}")]
    SchemaError(String),
    #[error("Tool execution failed: {0}")]
    ExecutionError(String),
}
