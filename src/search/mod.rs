//! Web search backends for the internet search tool.

mod duckduckgo;

pub use duckduckgo::DuckDuckGoSearch;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single web search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub href: String,
    pub body: String,
}

/// Trait for web search providers.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search the web and return at most `max_results` hits.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}
