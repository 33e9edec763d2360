use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;
use tracing::{info, warn};

use crate::agents::{ExtractionAgent, SearchAgent, SearchResultSet};
use crate::config::Config;
use crate::dataset::{Record, SheetsClient, Table};
use crate::llm::LLM;
use crate::search::SerpApiClient;
use crate::utils::GovernorThrottle;

/// Shared handles built once at startup and injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub search_agent: Arc<SearchAgent>,
    pub extraction_agent: Arc<ExtractionAgent>,
    pub sheets: Option<Arc<SheetsClient>>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let search_agent = SearchAgent::new(
            Arc::new(SerpApiClient::from_config(&config.search)),
            Arc::new(GovernorThrottle::per_second(config.search.requests_per_second)),
        );

        if config.llm.api_key.is_empty() {
            warn!(provider = %config.llm.provider, "No LLM API key configured; extraction requests will fail");
        }
        let extraction_agent = ExtractionAgent::new(LLM::new(&config.llm));

        let sheets = match &config.sheets.service_account_json {
            Some(json) => Some(Arc::new(
                SheetsClient::from_service_account_json(json, config.sheets.api_base.clone())
                    .context("GOOGLE_SHEETS_API_KEY is not a valid service account key")?,
            )),
            None => {
                info!("Google Sheets credentials not configured; sheet loading disabled");
                None
            }
        };

        Ok(Self {
            search_agent: Arc::new(search_agent),
            extraction_agent: Arc::new(extraction_agent),
            sheets,
            max_upload_bytes: config.server.max_upload_bytes,
        })
    }
}

// API Request/Response types

#[derive(Debug, serde::Deserialize)]
pub struct SheetRequest {
    pub sheet_url: Option<String>,
    pub start_row: Option<usize>,
    pub end_row: Option<usize>,
}

#[derive(Debug, serde::Deserialize)]
pub struct SearchRequest {
    pub entities: Option<Vec<Value>>,
    pub prompt_template: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct ExtractionRequest {
    pub entities: Option<Vec<Value>>,
    pub search_results: Option<SearchResultSet>,
    pub prompt_template: Option<String>,
}

/// Column names plus the sliced rows of a loaded table
#[derive(Debug, serde::Serialize)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub preview: Vec<Record>,
}

impl From<Table> for TablePreview {
    fn from(table: Table) -> Self {
        Self {
            columns: table.columns,
            preview: table.rows,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
