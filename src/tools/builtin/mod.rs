//! Builtin tools for the advisor agent
//!
//! Each tool keeps its pure parsing and formatting functions separate from
//! the HTTP I/O so they can be tested without a network.

pub mod google_search;
pub mod stock_price;

pub use google_search::GoogleSearchTool;
pub use stock_price::{PriceTargetLookup, StockPriceTargetTool};
