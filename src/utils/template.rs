//! Prompt templates
//!
//! A template is plain text with `{name}` placeholders, where `name` matches
//! `[A-Za-z_][A-Za-z0-9_]*`. Any other brace text (`{}`, `{ x }`, JSON
//! snippets) is kept literally. Parsing checks placeholder names against the
//! set the caller allows and requires; rendering takes an explicit value map
//! and inserts values verbatim.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown placeholder {{{0}}} in template")]
    UnknownPlaceholder(String),

    #[error("template must contain the {{{0}}} placeholder")]
    MissingPlaceholder(String),

    #[error("no value supplied for placeholder {{{0}}}")]
    MissingValue(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse `source`, accepting only `allowed` names and demanding every `required` one
    pub fn parse(source: &str, allowed: &[&str], required: &[&str]) -> Result<Self, TemplateError> {
        let segments = split_segments(source);

        for segment in &segments {
            if let Segment::Placeholder(name) = segment {
                if !allowed.contains(&name.as_str()) {
                    return Err(TemplateError::UnknownPlaceholder(name.clone()));
                }
            }
        }

        let template = Self {
            source: source.to_string(),
            segments,
        };
        if let Some(name) = required.iter().find(|name| !template.contains(name)) {
            return Err(TemplateError::MissingPlaceholder((*name).to_string()));
        }
        Ok(template)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Placeholder(p) if p == name))
    }

    pub fn render(&self, values: &HashMap<&str, &str>) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = values
                        .get(name.as_str())
                        .ok_or_else(|| TemplateError::MissingValue(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn is_placeholder_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn split_segments(source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = source;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if is_placeholder_name(&after[..close]) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(after[..close].to_string()));
                rest = &after[close + 1..];
            }
            _ => {
                literal.push('{');
                rest = after;
            }
        }
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values<'a>(pairs: &[(&'a str, &'a str)]) -> HashMap<&'a str, &'a str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_renders_entity() {
        let template = PromptTemplate::parse("Get {entity}", &["entity"], &["entity"]).unwrap();
        assert_eq!(template.render(&values(&[("entity", "Acme")])).unwrap(), "Get Acme");
    }

    #[test]
    fn test_repeated_placeholder_and_verbatim_values() {
        let template = PromptTemplate::parse("{entity} / {entity}", &["entity"], &["entity"]).unwrap();
        let rendered = template.render(&values(&[("entity", "{context} & co")])).unwrap();
        assert_eq!(rendered, "{context} & co / {context} & co");
    }

    #[test]
    fn test_non_identifier_braces_are_literal() {
        let template = PromptTemplate::parse(
            r#"Reply as {"email": "..."} for {entity} {} { x }"#,
            &["entity"],
            &["entity"],
        )
        .unwrap();
        let rendered = template.render(&values(&[("entity", "Acme")])).unwrap();
        assert_eq!(rendered, r#"Reply as {"email": "..."} for Acme {} { x }"#);
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let err = PromptTemplate::parse("Find {company}", &["entity"], &[]).unwrap_err();
        assert_eq!(err, TemplateError::UnknownPlaceholder("company".to_string()));
        assert_eq!(err.to_string(), "unknown placeholder {company} in template");
    }

    #[test]
    fn test_missing_required_placeholder_rejected() {
        let err = PromptTemplate::parse("Find contacts", &["entity"], &["entity"]).unwrap_err();
        assert_eq!(err, TemplateError::MissingPlaceholder("entity".to_string()));
    }

    #[test]
    fn test_missing_value_rejected() {
        let template =
            PromptTemplate::parse("{entity}: {context}", &["entity", "context"], &["entity"]).unwrap();
        assert!(template.contains("context"));
        let err = template.render(&values(&[("entity", "Acme")])).unwrap_err();
        assert_eq!(err, TemplateError::MissingValue("context".to_string()));
    }

    #[test]
    fn test_unclosed_brace_is_literal() {
        let template = PromptTemplate::parse("{entity} {oops", &["entity"], &["entity"]).unwrap();
        assert_eq!(template.render(&values(&[("entity", "A")])).unwrap(), "A {oops");
    }
}
