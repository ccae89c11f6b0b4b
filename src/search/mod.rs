//! Search index abstraction for shipqna.
//!
//! Indexing and ranking live in an external search service. This module only
//! describes the request/response shapes the rest of the crate consumes.

mod azure;
mod memory;

pub use azure::AzureSearchIndex;
pub use memory::MemorySearchIndex;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A record as uploaded to the index: field name to JSON value.
pub type IndexDocument = Map<String, Value>;

/// Hit fields that carry retrieval metadata rather than record content.
pub const METADATA_FIELDS: [&str; 3] = ["score", "reranker_score", "doc_id"];

/// One retrieved record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchHit {
    fields: Map<String, Value>,
}

impl SearchHit {
    /// Create a hit from its fields.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Look up a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// All fields, metadata included.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Document key, if the service returned one.
    pub fn doc_id(&self) -> Option<&str> {
        self.fields.get("doc_id").and_then(Value::as_str)
    }

    /// Relevance score, if the service returned one.
    pub fn score(&self) -> Option<f64> {
        self.fields.get("score").and_then(Value::as_f64)
    }
}

impl From<Map<String, Value>> for SearchHit {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// One bucket of a facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetBucket {
    /// Bucket value (null for range facets).
    #[serde(default)]
    pub value: Value,
    /// Number of matching documents in the bucket.
    pub count: u64,
}

/// Aggregate information about a query's result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    /// Total number of matching documents.
    pub count: Option<u64>,
    /// Facet field to buckets.
    #[serde(default)]
    pub facets: BTreeMap<String, Vec<FacetBucket>>,
}

impl AnalyticsSummary {
    /// True when the summary carries neither a count nor facets.
    pub fn is_empty(&self) -> bool {
        self.count.is_none() && self.facets.is_empty()
    }
}

/// A query against the shipment index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Full-text query; `*` matches everything.
    pub text: String,
    /// OData filter expression.
    pub filter: Option<String>,
    /// Maximum number of hits.
    pub top: usize,
    /// Facet fields to aggregate.
    pub facets: Vec<String>,
    /// Ask the service for the total match count.
    pub include_count: bool,
}

impl SearchQuery {
    /// Create a plain keyword query.
    pub fn new(text: impl Into<String>, top: usize) -> Self {
        Self {
            text: text.into(),
            filter: None,
            top,
            facets: Vec::new(),
            include_count: false,
        }
    }

    /// Restrict results with an OData filter.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Request facets and the total count.
    pub fn with_analytics(mut self, facets: Vec<String>) -> Self {
        self.facets = facets;
        self.include_count = true;
        self
    }

    /// Whether this query asks for aggregate information.
    pub fn wants_analytics(&self) -> bool {
        self.include_count || !self.facets.is_empty()
    }
}

/// Hits and optional analytics returned by a query.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    pub analytics: Option<AnalyticsSummary>,
}

/// Build a filter restricting results to records visible to the given consignees.
pub fn consignee_filter(field: &str, codes: &[String]) -> Option<String> {
    let codes: Vec<String> = codes
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| c.replace('\'', "''"))
        .collect();

    if codes.is_empty() {
        return None;
    }

    Some(format!(
        "{}/any(c: search.in(c, '{}', ','))",
        field,
        codes.join(",")
    ))
}

/// Trait for search index implementations.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Run a query.
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults>;

    /// Merge or upload documents. Returns the number accepted.
    async fn upload(&self, documents: &[IndexDocument]) -> Result<usize>;

    /// Remove every document. Returns the number removed.
    async fn clear_index(&self) -> Result<usize>;

    /// Get total document count.
    async fn document_count(&self) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_consignee_filter() {
        let codes = vec!["C001".to_string(), " C002 ".to_string(), String::new()];
        assert_eq!(
            consignee_filter("consignee_codes", &codes).as_deref(),
            Some("consignee_codes/any(c: search.in(c, 'C001,C002', ','))")
        );
        assert!(consignee_filter("consignee_codes", &[]).is_none());
    }

    #[test]
    fn test_consignee_filter_escapes_quotes() {
        let codes = vec!["O'NEIL".to_string()];
        assert_eq!(
            consignee_filter("consignee_codes", &codes).as_deref(),
            Some("consignee_codes/any(c: search.in(c, 'O''NEIL', ','))")
        );
    }

    #[test]
    fn test_hit_accessors() {
        let hit: SearchHit = json!({"doc_id": "d1", "score": 2.5, "carrier": "ACME"})
            .as_object()
            .cloned()
            .unwrap()
            .into();
        assert_eq!(hit.doc_id(), Some("d1"));
        assert_eq!(hit.score(), Some(2.5));
        assert_eq!(hit.get("carrier"), Some(&json!("ACME")));
    }

    #[test]
    fn test_analytics_is_empty() {
        assert!(AnalyticsSummary::default().is_empty());
        let summary = AnalyticsSummary {
            count: Some(0),
            ..Default::default()
        };
        assert!(!summary.is_empty());
    }
}
