//! Search Module
//!
//! Web search for entities. SerpAPI (Google engine) is the only backend; the
//! `SearchProvider` trait is the seam the search agent depends on.

pub mod serpapi;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use serpapi::{SearchError, SerpApiClient};

/// One organic result, projected to the fields extraction needs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one query and return organic results in provider order
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError>;
}
