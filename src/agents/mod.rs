//! Pipeline agents
//!
//! Search first, then extraction. Both work on entities in their string
//! form; JSON entity values from a table column are converted with
//! [`entity_key`].

pub mod batch;
pub mod extraction;
pub mod search;

pub use batch::{BatchResult, EntityOutcome, EntityRecord, ExtractionMap, SearchResultSet};
pub use extraction::ExtractionAgent;
pub use search::SearchAgent;

use serde_json::Value;

/// String form of an entity cell: strings verbatim, everything else as JSON text
pub fn entity_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn entity_keys(values: &[Value]) -> Vec<String> {
    values.iter().map(entity_key).collect()
}
