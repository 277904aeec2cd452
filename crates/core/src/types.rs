//! Domain types shared by the cache, the classifiers and the pipeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of a search engine results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchResult {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl SearchResult {
    /// Text used when no page content is available for this result.
    pub fn fallback_content(&self) -> String {
        format!("Title: {}\nDescription: {}", self.title, self.description)
    }
}

/// Normalized classifier answer.
///
/// Model replies come back as strings, lists or nested objects; they are
/// folded into this shape once so callers never branch on JSON types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Label {
    Single(String),
    Multiple(Vec<String>),
    Unsure,
}

const UNSURE_MARKERS: &[&str] = &["unsure", "unclear", "unknown", "n/a", "none"];

fn is_unsure_marker(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || UNSURE_MARKERS.iter().any(|m| s.eq_ignore_ascii_case(m))
}

impl Label {
    /// Fold a raw model answer into a label.
    pub fn from_response(value: &Value) -> Self {
        match value {
            Value::Null => Label::Unsure,
            Value::String(s) if is_unsure_marker(s) => Label::Unsure,
            Value::String(s) => Label::Single(s.trim().to_string()),
            Value::Bool(b) => Label::Single(b.to_string()),
            Value::Number(n) => Label::Single(n.to_string()),
            Value::Array(items) => {
                let values: Vec<String> = items
                    .iter()
                    .flat_map(|item| Label::from_response(item).into_values())
                    .collect();
                if values.is_empty() { Label::Unsure } else { Label::Multiple(values) }
            }
            Value::Object(map) => match map.values().next() {
                Some(first) if map.len() == 1 => Label::from_response(first),
                _ => {
                    let values: Vec<String> =
                        map.values().flat_map(|v| Label::from_response(v).into_values()).collect();
                    if values.is_empty() { Label::Unsure } else { Label::Multiple(values) }
                }
            },
        }
    }

    /// All label values, empty for `Unsure`.
    pub fn into_values(self) -> Vec<String> {
        match self {
            Label::Single(v) => vec![v],
            Label::Multiple(vs) => vs,
            Label::Unsure => Vec::new(),
        }
    }

    pub fn is_unsure(&self) -> bool {
        matches!(self, Label::Unsure)
    }
}

/// Truncate `text` to at most `limit` characters, on a char boundary.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// One document submitted for classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub url: String,
    /// Classification tag, e.g. `educational_level` or `snippet`.
    pub content_type: String,
    /// Document text, already truncated.
    pub content: String,
    pub facet: Option<String>,
}

impl BatchItem {
    pub fn new(
        url: impl Into<String>, content_type: impl Into<String>, content: &str, facet: Option<&str>, char_limit: usize,
    ) -> Self {
        Self {
            url: url.into(),
            content_type: content_type.into(),
            content: truncate_chars(content, char_limit).to_string(),
            facet: facet.map(str::to_string),
        }
    }

    /// Cache key of this request.
    pub fn cache_key(&self) -> String {
        crate::cache::hash::compute_cache_key(&self.url, &self.content_type, self.facet.as_deref())
    }
}

/// A final classification answer for one (url, content type, facet) key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassificationResult {
    pub url: String,
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet: Option<String>,
    pub response: Value,
}

impl ClassificationResult {
    pub fn cache_key(&self) -> String {
        crate::cache::hash::compute_cache_key(&self.url, &self.content_type, self.facet.as_deref())
    }

    /// Whether the response is a final answer worth persisting.
    pub fn is_cacheable(&self) -> bool {
        match &self.response {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
            _ => true,
        }
    }
}
