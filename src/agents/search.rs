//! Search Agent
//!
//! Runs one web search per entity, strictly in input order. Each call first
//! waits on the injected throttle; a failing entity is recorded and the batch
//! moves on to the next one.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::batch::BatchResult;
use crate::search::{SearchProvider, SearchResult};
use crate::utils::{PromptTemplate, TemplateError, Throttle};

/// Placeholders a search query template may use
pub const QUERY_PLACEHOLDERS: &[&str] = &["entity"];

pub struct SearchAgent {
    provider: Arc<dyn SearchProvider>,
    throttle: Arc<dyn Throttle>,
}

impl SearchAgent {
    pub fn new(provider: Arc<dyn SearchProvider>, throttle: Arc<dyn Throttle>) -> Self {
        Self { provider, throttle }
    }

    /// Query templates must contain `{entity}` and nothing else
    pub fn parse_template(source: &str) -> Result<PromptTemplate, TemplateError> {
        PromptTemplate::parse(source, QUERY_PLACEHOLDERS, QUERY_PLACEHOLDERS)
    }

    pub fn build_query(template: &PromptTemplate, entity: &str) -> Result<String, TemplateError> {
        let values = HashMap::from([("entity", entity)]);
        template.render(&values)
    }

    pub async fn search_entities(
        &self,
        entities: &[String],
        template: &PromptTemplate,
    ) -> BatchResult<Vec<SearchResult>> {
        let mut batch = BatchResult::new();

        for entity in entities {
            info!(entity = %entity, "Searching for entity");

            let query = match Self::build_query(template, entity) {
                Ok(query) => query,
                Err(e) => {
                    warn!(entity = %entity, error = %e, "Could not build search query");
                    batch.push_failure(entity.clone(), e.to_string());
                    continue;
                }
            };

            self.throttle.acquire().await;

            match self.provider.search(&query).await {
                Ok(results) => {
                    debug!(entity = %entity, count = results.len(), "Search results received");
                    batch.push_success(entity.clone(), results);
                }
                Err(e) => {
                    warn!(entity = %entity, error = %e, "Search failed for entity");
                    batch.push_failure(entity.clone(), e.to_string());
                }
            }
        }

        info!(
            entities = batch.len(),
            failed = batch.failure_count(),
            "Completed all searches"
        );
        batch
    }
}
