//! Web search tool backed by the Google Custom Search JSON API
//!
//! The observation is the result snippets joined into one string, with a
//! fixed sentence when the search returns nothing.

use crate::config::{AdvisorConfig, GoogleSearchToolConfig};
use crate::tools::{error_chain, Tool, ToolDescription, ToolError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::Instrument;
use url::Url;

pub const TOOL_NAME: &str = "GoogleSearch";
pub const NO_RESULTS_MESSAGE: &str = "No good Google Search Result was found";

/// Google search tool - builtin implementation
pub struct GoogleSearchTool {
    config: GoogleSearchToolConfig,
    client: Option<reqwest::Client>,
    api_key: Option<String>,
    cse_id: Option<String>,
}

impl GoogleSearchTool {
    /// Create a tool that reads its credentials from the environment on initialize
    pub fn new(config: GoogleSearchToolConfig) -> Self {
        Self {
            config,
            client: None,
            api_key: None,
            cse_id: None,
        }
    }

    /// Create a tool with explicit credentials, skipping the environment lookup
    pub fn with_credentials(
        config: GoogleSearchToolConfig,
        api_key: impl Into<String>,
        cse_id: impl Into<String>,
    ) -> Self {
        Self {
            config,
            client: None,
            api_key: Some(api_key.into()),
            cse_id: Some(cse_id.into()),
        }
    }

    /// Build the Custom Search request URL (pure function)
    fn build_search_url(
        base_url: &str,
        api_key: &str,
        cse_id: &str,
        query: &str,
        num_results: u32,
    ) -> Result<Url, String> {
        let endpoint = format!("{}/customsearch/v1", base_url.trim_end_matches('/'));
        let num = num_results.to_string();
        Url::parse_with_params(
            &endpoint,
            &[
                ("key", api_key),
                ("cx", cse_id),
                ("q", query),
                ("num", num.as_str()),
            ],
        )
        .map_err(|e| format!("Invalid search endpoint '{endpoint}': {e}"))
    }

    /// Join the snippets of every result item (pure function)
    fn format_snippets(search_result: &Value) -> String {
        let items = search_result
            .get("items")
            .and_then(|items| items.as_array())
            .filter(|items| !items.is_empty());

        let Some(items) = items else {
            return NO_RESULTS_MESSAGE.to_string();
        };

        items
            .iter()
            .filter_map(|item| item.get("snippet").and_then(|s| s.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run one search and return the joined snippets
    pub async fn search(&self, query: &str) -> Result<String, ToolError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| ToolError::ExecutionError("Tool not initialized".to_string()))?;
        let (Some(api_key), Some(cse_id)) = (self.api_key.as_deref(), self.cse_id.as_deref())
        else {
            return Err(ToolError::ExecutionError(
                "Search credentials not configured".to_string(),
            ));
        };

        let url = Self::build_search_url(
            &self.config.base_url,
            api_key,
            cse_id,
            query,
            self.config.num_results,
        )
        .map_err(ToolError::ExecutionError)?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                ToolError::ExecutionError(format!("Request failed: {}", error_chain(&e)))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ToolError::ExecutionError(format!(
                "Google Search API error ({}): {}",
                status.as_u16(),
                error_text
            )));
        }

        let search_result: Value = response
            .json()
            .await
            .map_err(|e| {
                ToolError::ExecutionError(format!("Failed to parse response: {}", error_chain(&e)))
            })?;

        Ok(Self::format_snippets(&search_result))
    }
}

#[async_trait]
impl Tool for GoogleSearchTool {
    fn describe(&self) -> ToolDescription {
        ToolDescription {
            name: TOOL_NAME.to_string(),
            description: "Use this tool to find real-time information, news, and answer questions about the latest market trends, risers, and droppers. You can ask it things like 'Top rising stocks today' or 'Latest news on NVDA'.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn initialize(&mut self) -> Result<(), ToolError> {
        if self.api_key.is_none() {
            self.api_key = Some(
                AdvisorConfig::get_env_var_required(&self.config.api_key_env)
                    .map_err(|e| ToolError::InitializationError(e.to_string()))?,
            );
        }
        if self.cse_id.is_none() {
            self.cse_id = Some(
                AdvisorConfig::get_env_var_required(&self.config.cse_id_env)
                    .map_err(|e| ToolError::InitializationError(e.to_string()))?,
            );
        }

        self.client = Some(
            reqwest::Client::builder()
                .timeout(Duration::from_secs(self.config.timeout_secs))
                .build()
                .map_err(|e| ToolError::InitializationError(e.to_string()))?,
        );

        Ok(())
    }

    async fn execute(&self, parameters: &Value) -> Result<Value, ToolError> {
        let query = parameters["query"]
            .as_str()
            .ok_or_else(|| ToolError::ExecutionError("Query parameter is required".to_string()))?;

        let snippets = self
            .search(query)
            .instrument(crate::tool_span!(tool = TOOL_NAME))
            .await?;

        Ok(Value::String(snippets))
    }
}
