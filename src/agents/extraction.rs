//! Extraction Agent
//!
//! Asks the configured chat model to pull one fact out of each entity's
//! search results. The user message is the rendered template followed by a
//! blank line and a `Title:`/`Snippet:` listing of the entity's results.

use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::batch::{BatchResult, SearchResultSet};
use crate::llm::LLM;
use crate::search::SearchResult;
use crate::types::{LLMMessage, LLMRequest};
use crate::utils::{PromptTemplate, TemplateError};

/// Placeholders an extraction template may use
pub const EXTRACTION_PLACEHOLDERS: &[&str] = &["entity", "context"];

/// Returned when the model answers without any message content
pub const NO_DATA_FOUND: &str = "No data found";

pub struct ExtractionAgent {
    llm: LLM,
}

impl ExtractionAgent {
    pub fn new(llm: LLM) -> Self {
        Self { llm }
    }

    /// Extraction templates must contain `{entity}` and may contain `{context}`
    pub fn parse_template(source: &str) -> Result<PromptTemplate, TemplateError> {
        PromptTemplate::parse(source, EXTRACTION_PLACEHOLDERS, &["entity"])
    }

    /// Snippets joined by newlines; a result without a snippet contributes an empty line
    pub fn build_context(results: &[SearchResult]) -> String {
        results
            .iter()
            .map(|r| r.snippet.as_deref().unwrap_or(""))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn build_prompt(
        template: &PromptTemplate,
        entity: &str,
        results: &[SearchResult],
    ) -> Result<String, TemplateError> {
        let context = Self::build_context(results);
        let values = HashMap::from([("entity", entity), ("context", context.as_str())]);
        template.render(&values)
    }

    fn format_results(results: &[SearchResult]) -> String {
        results
            .iter()
            .map(|r| {
                format!(
                    "Title: {}\nSnippet: {}",
                    r.title.as_deref().unwrap_or("N/A"),
                    r.snippet.as_deref().unwrap_or("N/A")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Full user message sent to the model for one entity
    pub fn build_message(
        template: &PromptTemplate,
        entity: &str,
        results: &[SearchResult],
    ) -> Result<String, TemplateError> {
        let prompt = Self::build_prompt(template, entity, results)?;
        Ok(format!("{}\n\n{}", prompt, Self::format_results(results)))
    }

    fn request_for(&self, message: String) -> LLMRequest {
        LLMRequest {
            model: self.llm.model().to_string(),
            messages: vec![LLMMessage::user(message)],
            max_tokens: None,
            temperature: None,
        }
    }

    pub async fn extract_entities(
        &self,
        entities: &[String],
        search_results: &SearchResultSet,
        template: &PromptTemplate,
    ) -> BatchResult<String> {
        let mut batch = BatchResult::new();

        for entity in entities {
            let results = search_results
                .get(entity)
                .map(Vec::as_slice)
                .unwrap_or_default();

            let message = match Self::build_message(template, entity, results) {
                Ok(message) => message,
                Err(e) => {
                    batch.push_failure(entity.clone(), e.to_string());
                    continue;
                }
            };

            debug!(
                entity = %entity,
                results = results.len(),
                message_len = message.len(),
                "Sending extraction request"
            );

            match self.llm.create_chat_completion(&self.request_for(message)).await {
                Ok(response) => {
                    let text = response.content.unwrap_or_else(|| NO_DATA_FOUND.to_string());
                    info!(entity = %entity, response_len = text.len(), "Extraction completed");
                    batch.push_success(entity.clone(), text);
                }
                Err(e) => {
                    warn!(entity = %entity, error = %e, "Extraction failed for entity");
                    batch.push_failure(entity.clone(), e.to_string());
                }
            }
        }

        info!(
            entities = batch.len(),
            failed = batch.failure_count(),
            provider = %self.llm.provider(),
            "Completed all extractions"
        );
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LLMAdapter;
    use crate::types::{AppError, AppResult, LLMProvider, LLMResponse};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Captures every user message and answers from a script
    #[derive(Default)]
    struct ScriptedAdapter {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LLMAdapter for ScriptedAdapter {
        async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
            let message = request.messages[0].content.clone();
            self.seen.lock().unwrap().push(message.clone());
            if message.contains("Globex") {
                return Err(AppError::LLMApi("Error code: 429 - Rate limit reached".into()));
            }
            let content = if message.contains("Initech") {
                None
            } else {
                Some(format!("answer #{}", self.seen.lock().unwrap().len()))
            };
            Ok(LLMResponse {
                content,
                finish_reason: Some("stop".into()),
                usage: None,
            })
        }
    }

    fn result(title: Option<&str>, snippet: Option<&str>) -> SearchResult {
        SearchResult {
            title: title.map(String::from),
            link: None,
            snippet: snippet.map(String::from),
        }
    }

    #[test]
    fn test_message_without_results_is_prompt_and_blank_line() {
        let template = ExtractionAgent::parse_template("Extract email of {entity}").unwrap();
        let message = ExtractionAgent::build_message(&template, "Acme", &[]).unwrap();
        assert_eq!(message, "Extract email of Acme\n\n");
    }

    #[test]
    fn test_prompt_without_context_ignores_results() {
        let template = ExtractionAgent::parse_template("Extract email of {entity}").unwrap();
        let with = ExtractionAgent::build_prompt(
            &template,
            "Acme",
            &[result(Some("t"), Some("contact: a@acme.test"))],
        )
        .unwrap();
        let without = ExtractionAgent::build_prompt(&template, "Acme", &[]).unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn test_context_joins_snippets() {
        let results = vec![
            result(Some("One"), Some("first")),
            result(Some("Two"), None),
            result(None, Some("third")),
        ];
        assert_eq!(ExtractionAgent::build_context(&results), "first\n\nthird");

        let template = ExtractionAgent::parse_template("{entity}: {context}").unwrap();
        let message = ExtractionAgent::build_message(&template, "Acme", &results).unwrap();
        assert_eq!(
            message,
            "Acme: first\n\nthird\n\nTitle: One\nSnippet: first\nTitle: Two\nSnippet: N/A\nTitle: N/A\nSnippet: third"
        );
    }

    #[test]
    fn test_template_requires_entity() {
        assert!(ExtractionAgent::parse_template("Summarise {context}").is_err());
        assert!(ExtractionAgent::parse_template("{entity} {phone}").is_err());
    }

    #[tokio::test]
    async fn test_extract_entities_records_each_outcome() {
        let adapter = Arc::new(ScriptedAdapter::default());
        let llm = LLM::with_adapter(adapter.clone(), LLMProvider::Groq, "llama3-8b-8192");
        let agent = ExtractionAgent::new(llm);

        let mut search_results = SearchResultSet::new();
        search_results.insert("Acme".into(), vec![result(Some("Acme"), Some("acme snippet"))]);
        search_results.insert("Globex".into(), vec![result(Some("Globex"), Some("globex snippet"))]);

        let template = ExtractionAgent::parse_template("Email of {entity}? {context}").unwrap();
        let entities: Vec<String> = ["Acme", "Globex", "Initech"].iter().map(|s| s.to_string()).collect();
        let batch = agent.extract_entities(&entities, &search_results, &template).await;

        let seen = adapter.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].starts_with("Email of Acme? acme snippet\n\n"));
        assert!(!seen[0].contains("globex"));
        assert_eq!(seen[2], "Email of Initech? \n\n");

        assert_eq!(batch.failure_count(), 1);
        let map = batch.into_extraction_map();
        assert_eq!(map["Acme"], "answer #1");
        assert_eq!(map["Globex"], "Error: LLM API error: Error code: 429 - Rate limit reached");
        assert_eq!(map["Initech"], NO_DATA_FOUND);
    }
}
