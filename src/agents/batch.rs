//! Per-entity batch outcomes
//!
//! Every entity handed to a stage produces exactly one record, in input
//! order, including duplicates. The map projections used by the HTTP surface
//! keep the last record for a repeated entity.

use std::collections::BTreeMap;

use crate::search::SearchResult;

/// Entity → organic results, as exchanged over HTTP
pub type SearchResultSet = BTreeMap<String, Vec<SearchResult>>;

/// Entity → extracted text or `"Error: ..."`, as exchanged over HTTP
pub type ExtractionMap = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityOutcome<T> {
    Success(T),
    Failure { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord<T> {
    pub entity: String,
    pub outcome: EntityOutcome<T>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult<T> {
    records: Vec<EntityRecord<T>>,
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self { records: Vec::new() }
    }
}

impl<T> BatchResult<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_success(&mut self, entity: impl Into<String>, value: T) {
        self.records.push(EntityRecord {
            entity: entity.into(),
            outcome: EntityOutcome::Success(value),
        });
    }

    pub fn push_failure(&mut self, entity: impl Into<String>, reason: impl Into<String>) {
        self.records.push(EntityRecord {
            entity: entity.into(),
            outcome: EntityOutcome::Failure {
                reason: reason.into(),
            },
        });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `(entity, reason)` for every failed record, in input order
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.records.iter().filter_map(|r| match &r.outcome {
            EntityOutcome::Failure { reason } => Some((r.entity.as_str(), reason.as_str())),
            EntityOutcome::Success(_) => None,
        })
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}

impl BatchResult<Vec<SearchResult>> {
    /// Failed searches become an empty result list
    pub fn into_search_map(self) -> SearchResultSet {
        let mut map = SearchResultSet::new();
        for record in self.records {
            let results = match record.outcome {
                EntityOutcome::Success(results) => results,
                EntityOutcome::Failure { .. } => Vec::new(),
            };
            map.insert(record.entity, results);
        }
        map
    }
}

impl BatchResult<String> {
    /// Failed extractions become `"Error: <reason>"`
    pub fn into_extraction_map(self) -> ExtractionMap {
        let mut map = ExtractionMap::new();
        for record in self.records {
            let text = match record.outcome {
                EntityOutcome::Success(text) => text,
                EntityOutcome::Failure { reason } => format!("Error: {}", reason),
            };
            map.insert(record.entity, text);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_are_preserved_in_order() {
        let mut batch: BatchResult<String> = BatchResult::new();
        batch.push_success("Acme", "a@acme.test".to_string());
        batch.push_failure("Globex", "rate limited");
        batch.push_failure("Initech", "timeout");

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.failure_count(), 2);
        let failures: Vec<_> = batch.failures().collect();
        assert_eq!(failures, vec![("Globex", "rate limited"), ("Initech", "timeout")]);
    }

    #[test]
    fn test_extraction_map_encodes_errors() {
        let mut batch: BatchResult<String> = BatchResult::new();
        batch.push_success("Acme", "a@acme.test".to_string());
        batch.push_failure("Globex", "Error code: 401 - Invalid API Key");

        let map = batch.into_extraction_map();
        assert_eq!(map["Acme"], "a@acme.test");
        assert_eq!(map["Globex"], "Error: Error code: 401 - Invalid API Key");
    }

    #[test]
    fn test_duplicates_collapse_last_write_wins() {
        let mut batch: BatchResult<Vec<SearchResult>> = BatchResult::new();
        batch.push_success(
            "Acme",
            vec![SearchResult {
                title: Some("first".into()),
                ..Default::default()
            }],
        );
        batch.push_failure("Acme", "boom");

        assert_eq!(batch.len(), 2);
        let map = batch.into_search_map();
        assert_eq!(map.len(), 1);
        assert!(map["Acme"].is_empty());
    }
}
