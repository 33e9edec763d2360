//! SerpAPI Client
//!
//! Google web search through SerpAPI's `search.json` endpoint. Only the
//! `organic_results` block of the response is read; each item is projected to
//! `{title, link, snippet}` with absent fields left as `None`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::{SearchProvider, SearchResult};
use crate::config::SearchConfig;

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("SerpAPI key not configured")]
    NoApiKey,

    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("SerpAPI returned {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("SerpAPI error: {0}")]
    Provider(String),

    #[error("Failed to parse search results: {0}")]
    ParseError(String),
}

/// SerpAPI client for Google web search
pub struct SerpApiClient {
    client: Client,
    api_key: String,
    base_url: String,
    location: String,
    hl: String,
    gl: String,
    google_domain: String,
}

impl SerpApiClient {
    /// Create a new SerpAPI client with the default search parameters
    pub fn new(api_key: String) -> Self {
        Self::from_config(&SearchConfig::new(api_key))
    }

    /// Configure client from config
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.serpapi_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            location: config.location.clone(),
            hl: config.hl.clone(),
            gl: config.gl.clone(),
            google_domain: config.google_domain.clone(),
        }
    }

    /// Point the client at another host (used against local fakes)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn query_params<'a>(&'a self, query: &'a str) -> [(&'static str, &'a str); 7] {
        [
            ("engine", "google"),
            ("q", query),
            ("location", self.location.as_str()),
            ("hl", self.hl.as_str()),
            ("gl", self.gl.as_str()),
            ("google_domain", self.google_domain.as_str()),
            ("api_key", self.api_key.as_str()),
        ]
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        if self.api_key.is_empty() {
            return Err(SearchError::NoApiKey);
        }

        info!(query = %query, "Searching Google via SerpAPI");

        let url = format!("{}/search.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&self.query_params(query))
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            // SerpAPI puts a readable message in `error` even on failures
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(String::from));
            return Err(match message {
                Some(message) => SearchError::Provider(message),
                None => SearchError::HttpStatus {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let results: Value =
            serde_json::from_str(&body).map_err(|e| SearchError::ParseError(e.to_string()))?;

        debug!("Raw SerpAPI response received");

        parse_organic_results(&results)
    }
}

/// Project the `organic_results` block of a SerpAPI response
pub fn parse_organic_results(results: &Value) -> Result<Vec<SearchResult>, SearchError> {
    if let Some(error) = results.get("error").and_then(Value::as_str) {
        return Err(SearchError::Provider(error.to_string()));
    }

    let organic_results = match results.get("organic_results") {
        Some(v) => v,
        None => return Ok(Vec::new()),
    };

    let results_array = organic_results
        .as_array()
        .ok_or_else(|| SearchError::ParseError("Expected array of results".to_string()))?;

    let text_field = |item: &Value, key: &str| item.get(key).and_then(Value::as_str).map(String::from);

    Ok(results_array
        .iter()
        .map(|item| SearchResult {
            title: text_field(item, "title"),
            link: text_field(item, "link"),
            snippet: text_field(item, "snippet"),
        })
        .collect())
}
