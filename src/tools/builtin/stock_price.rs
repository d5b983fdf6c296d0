//! Analyst price-target lookup scraped from MarketWatch
//!
//! The analyst-estimates page carries a table row whose first cell reads
//! `High` and whose next `table__cell` sibling holds the high price target.
//! Any markup change, HTTP failure or unknown ticker surfaces as a
//! [`PriceTargetLookup`] variant; the tool itself never fails on them.

use crate::config::StockPriceToolConfig;
use crate::tools::{error_chain, Tool, ToolDescription, ToolError};
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use scraper::{ElementRef, Html, Selector};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn, Instrument};

pub const TOOL_NAME: &str = "getStockPriceTarget";

/// Desktop browser user agent; MarketWatch rejects obvious bot clients
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Outcome of a single price-target lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceTargetLookup {
    /// The page had a `High` cell with a sibling price cell
    Found { price: String },
    /// The page loaded but the expected cells were absent
    NotFound,
    /// The request failed or returned a non-success status
    FetchError { detail: String },
}

impl PriceTargetLookup {
    /// Prose handed to the agent as the tool observation
    pub fn render(&self, ticker: &str) -> String {
        match self {
            Self::Found { price } => {
                format!("The high analyst price target for {ticker} is {price}.")
            }
            Self::NotFound => {
                format!("Could not find the price target for {ticker} on MarketWatch.")
            }
            Self::FetchError { detail } => format!(
                "An error occurred while trying to fetch the stock price target for {ticker}: {detail}"
            ),
        }
    }
}

/// Stock price-target tool - builtin implementation
pub struct StockPriceTargetTool {
    config: StockPriceToolConfig,
    client: Option<reqwest::Client>,
}

impl StockPriceTargetTool {
    pub fn new(config: StockPriceToolConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    /// Analyst-estimates page for a ticker (pure function)
    fn build_url(base_url: &str, ticker: &str) -> String {
        format!(
            "{}/investing/stock/{}/analystestimates",
            base_url.trim_end_matches('/'),
            ticker
        )
    }

    /// Locate the high price target in the page markup (pure function)
    ///
    /// Matching is looser than an exact-attribute lookup on purpose: the
    /// label cell only needs both `table__cell` and `positive` among its
    /// classes (in any order, alongside others), and its text is compared
    /// after trimming surrounding whitespace.
    ///
    /// Only the first `High` cell is considered. If it has no matching
    /// sibling the lookup is a miss even when a later row would match.
    pub fn parse_price_target(html: &str) -> PriceTargetLookup {
        let Ok(label_selector) = Selector::parse("td.table__cell.positive") else {
            return PriceTargetLookup::NotFound;
        };

        let document = Html::parse_document(html);
        let Some(label_cell) = document
            .select(&label_selector)
            .find(|cell| cell.text().collect::<String>().trim() == "High")
        else {
            return PriceTargetLookup::NotFound;
        };

        label_cell
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|sibling| {
                sibling.value().name() == "td"
                    && sibling.value().classes().any(|class| class == "table__cell")
            })
            .map(|price_cell| PriceTargetLookup::Found {
                price: price_cell.text().collect::<String>().trim().to_string(),
            })
            .unwrap_or(PriceTargetLookup::NotFound)
    }

    /// Fetch the page body, failing on transport errors and non-2xx status
    ///
    /// The failure detail carries the full cause chain so a DNS failure
    /// reads differently from a refused connection or an HTTP status.
    async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String, String> {
        let response = client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(|e| error_chain(&e))?;

        let response = response.error_for_status().map_err(|e| error_chain(&e))?;

        response.text().await.map_err(|e| error_chain(&e))
    }

    /// Run the lookup for one ticker
    pub async fn lookup(&self, ticker: &str) -> PriceTargetLookup {
        let Some(client) = self.client.as_ref() else {
            return PriceTargetLookup::FetchError {
                detail: "Tool not initialized".to_string(),
            };
        };

        let url = Self::build_url(&self.config.base_url, ticker);
        debug!("Fetching price target page: {}", url);

        match Self::fetch_page(client, &url).await {
            Ok(body) => Self::parse_price_target(&body),
            Err(detail) => {
                warn!(ticker = %ticker, "Price target fetch failed: {}", detail);
                PriceTargetLookup::FetchError { detail }
            }
        }
    }
}

#[async_trait]
impl Tool for StockPriceTargetTool {
    fn describe(&self) -> ToolDescription {
        ToolDescription {
            name: TOOL_NAME.to_string(),
            description: "Use this tool to get the analyst price target for a specific stock ticker. The input should be a stock ticker symbol, like 'AAPL' or 'TSLA'.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "ticker": {
                        "type": "string",
                        "description": "Stock ticker symbol, e.g. 'AAPL'"
                    }
                },
                "required": ["ticker"]
            }),
        }
    }

    async fn initialize(&mut self) -> Result<(), ToolError> {
        self.client = Some(
            reqwest::Client::builder()
                .timeout(Duration::from_secs(self.config.timeout_secs))
                .build()
                .map_err(|e| ToolError::InitializationError(e.to_string()))?,
        );
        Ok(())
    }

    async fn execute(&self, parameters: &Value) -> Result<Value, ToolError> {
        let ticker = parameters["ticker"]
            .as_str()
            .ok_or_else(|| ToolError::ExecutionError("Ticker parameter is required".to_string()))?;

        let lookup = self
            .lookup(ticker)
            .instrument(crate::tool_span!(tool = TOOL_NAME, ticker = %ticker))
            .await;

        Ok(Value::String(lookup.render(ticker)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ESTIMATES_PAGE: &str = r#"
<html><body>
<table class="table value-pairs">
  <tbody>
    <tr class="table__row">
      <td class="table__cell positive">High</td>
      <td class="table__cell">$250.00</td>
    </tr>
    <tr class="table__row">
      <td class="table__cell negative">Low</td>
      <td class="table__cell">$150.00</td>
    </tr>
  </tbody>
</table>
</body></html>"#;

    #[test]
    fn test_render_found() {
        let lookup = PriceTargetLookup::Found {
            price: "$250.00".to_string(),
        };
        assert_eq!(
            lookup.render("AAPL"),
            "The high analyst price target for AAPL is $250.00."
        );
    }

    #[test]
    fn test_render_not_found() {
        assert_eq!(
            PriceTargetLookup::NotFound.render("TSLA"),
            "Could not find the price target for TSLA on MarketWatch."
        );
    }

    #[test]
    fn test_render_fetch_error_embeds_detail() {
        let lookup = PriceTargetLookup::FetchError {
            detail: "dns error".to_string(),
        };
        let rendered = lookup.render("MSFT");
        assert!(rendered.contains("MSFT"));
        assert!(rendered.ends_with(": dns error"));
    }

    #[test]
    fn test_build_url() {
        assert_eq!(
            StockPriceTargetTool::build_url("https://www.marketwatch.com/", "AAPL"),
            "https://www.marketwatch.com/investing/stock/AAPL/analystestimates"
        );
    }

    #[test]
    fn test_parse_price_target_found() {
        assert_eq!(
            StockPriceTargetTool::parse_price_target(ESTIMATES_PAGE),
            PriceTargetLookup::Found {
                price: "$250.00".to_string()
            }
        );
    }

    #[test]
    fn test_parse_price_target_trims_whitespace() {
        let html = r#"<table><tr>
            <td class="table__cell positive">
                High
            </td>
            <td class="table__cell">
                310.5
            </td></tr></table>"#;
        assert_eq!(
            StockPriceTargetTool::parse_price_target(html),
            PriceTargetLookup::Found {
                price: "310.5".to_string()
            }
        );
    }

    #[test]
    fn test_parse_price_target_skips_non_matching_siblings() {
        let html = r#"<table><tr>
            <td class="table__cell positive">High</td>
            <td class="spacer"></td>
            <td class="table__cell">$99</td></tr></table>"#;
        assert_eq!(
            StockPriceTargetTool::parse_price_target(html),
            PriceTargetLookup::Found {
                price: "$99".to_string()
            }
        );
    }

    #[test]
    fn test_parse_price_target_accepts_reordered_and_extra_classes() {
        let html = r#"<table><tr>
            <td class="positive table__cell table__cell--bold">High</td>
            <td class="table__cell">$412.00</td></tr></table>"#;
        assert_eq!(
            StockPriceTargetTool::parse_price_target(html),
            PriceTargetLookup::Found {
                price: "$412.00".to_string()
            }
        );
    }

    #[test]
    fn test_parse_price_target_requires_whole_label_text() {
        let html = r#"<table><tr>
            <td class="table__cell positive">High estimate</td>
            <td class="table__cell">$1</td></tr></table>"#;
        assert_eq!(
            StockPriceTargetTool::parse_price_target(html),
            PriceTargetLookup::NotFound
        );
    }

    #[test]
    fn test_parse_price_target_missing_label() {
        let html = r#"<table><tr><td class="table__cell">Median</td><td class="table__cell">$1</td></tr></table>"#;
        assert_eq!(
            StockPriceTargetTool::parse_price_target(html),
            PriceTargetLookup::NotFound
        );
    }

    #[test]
    fn test_parse_price_target_label_without_positive_class() {
        let html = r#"<table><tr><td class="table__cell">High</td><td class="table__cell">$1</td></tr></table>"#;
        assert_eq!(
            StockPriceTargetTool::parse_price_target(html),
            PriceTargetLookup::NotFound
        );
    }

    #[test]
    fn test_parse_price_target_missing_sibling() {
        let html = r#"<table><tr><td class="table__cell positive">High</td></tr></table>"#;
        assert_eq!(
            StockPriceTargetTool::parse_price_target(html),
            PriceTargetLookup::NotFound
        );
    }

    #[test]
    fn test_parse_price_target_empty_page() {
        assert_eq!(
            StockPriceTargetTool::parse_price_target(""),
            PriceTargetLookup::NotFound
        );
    }

    #[tokio::test]
    async fn test_lookup_before_initialize() {
        let tool = StockPriceTargetTool::new(StockPriceToolConfig::default());
        assert!(matches!(
            tool.lookup("AAPL").await,
            PriceTargetLookup::FetchError { .. }
        ));
    }

    #[tokio::test]
    async fn test_execute_requires_ticker() {
        let mut tool = StockPriceTargetTool::new(StockPriceToolConfig::default());
        tool.initialize().await.unwrap();

        let result = tool.execute(&json!({})).await;
        assert!(matches!(result, Err(ToolError::ExecutionError(_))));
    }

    #[test]
    fn test_tool_description() {
        let tool = StockPriceTargetTool::new(StockPriceToolConfig::default());
        let description = tool.describe();

        assert_eq!(description.name, "getStockPriceTarget");
        assert!(description.description.contains("analyst price target"));
        assert_eq!(description.parameters["required"], json!(["ticker"]));
    }
}
