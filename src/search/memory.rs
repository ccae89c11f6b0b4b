//! In-memory search index implementation.
//!
//! Backs the unit tests; no configuration selects it. Matching is a
//! case-insensitive term lookup over string fields; the score is the number
//! of matched terms.

use super::{
    AnalyticsSummary, FacetBucket, IndexDocument, SearchHit, SearchIndex, SearchQuery,
    SearchResults,
};
use crate::error::{QnaError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// In-memory search index.
pub struct MemorySearchIndex {
    key_field: String,
    documents: RwLock<BTreeMap<String, IndexDocument>>,
}

impl MemorySearchIndex {
    /// Create an empty index keyed by `doc_id`.
    pub fn new() -> Self {
        Self::with_key_field("doc_id")
    }

    /// Create an empty index with a custom key field.
    pub fn with_key_field(key_field: &str) -> Self {
        Self {
            key_field: key_field.to_string(),
            documents: RwLock::new(BTreeMap::new()),
        }
    }

    fn poisoned() -> QnaError {
        QnaError::Search("in-memory index lock poisoned".to_string())
    }
}

impl Default for MemorySearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// A parsed `search.in` filter: field and accepted values.
#[derive(Debug, PartialEq)]
struct InFilter {
    field: String,
    values: Vec<String>,
}

/// Parse the two `search.in` shapes this crate produces:
/// `field/any(c: search.in(c, 'a,b', ','))` and `search.in(field, 'a,b', ',')`.
fn parse_in_filter(filter: &str) -> Option<InFilter> {
    let filter = filter.trim();

    let (field, args) = if let Some((field, rest)) = filter.split_once("/any(") {
        let (_, inner) = rest.split_once("search.in(")?;
        let (_, args) = inner.split_once(',')?;
        (field.trim().to_string(), args)
    } else {
        let inner = filter.strip_prefix("search.in(")?;
        let (field, args) = inner.split_once(',')?;
        (field.trim().to_string(), args)
    };

    let start = args.find('\'')?;
    let list = &args[start + 1..];
    let mut values = String::new();
    let mut chars = list.chars().peekable();
    loop {
        match chars.next()? {
            '\'' if chars.peek() == Some(&'\'') => {
                chars.next();
                values.push('\'');
            }
            '\'' => break,
            c => values.push(c),
        }
    }

    Some(InFilter {
        field,
        values: values.split(',').map(|v| v.trim().to_string()).collect(),
    })
}

fn value_matches(value: &Value, accepted: &[String]) -> bool {
    match value {
        Value::String(s) => accepted.iter().any(|a| a == s),
        Value::Array(items) => items.iter().any(|item| value_matches(item, accepted)),
        _ => false,
    }
}

fn term_hits(doc: &IndexDocument, terms: &[String]) -> usize {
    let texts: Vec<String> = doc.values().flat_map(string_values).collect();
    terms
        .iter()
        .filter(|term| texts.iter().any(|text| text.contains(term.as_str())))
        .count()
}

fn string_values(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.to_lowercase()],
        Value::Number(n) => vec![n.to_string()],
        Value::Array(items) => items.iter().flat_map(string_values).collect(),
        _ => Vec::new(),
    }
}

fn facet_buckets(docs: &[&IndexDocument], field: &str) -> Vec<FacetBucket> {
    let mut counts: HashMap<String, (Value, u64)> = HashMap::new();

    for doc in docs {
        let values: Vec<&Value> = match doc.get(field) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![other],
        };
        for value in values {
            let entry = counts
                .entry(value.to_string())
                .or_insert_with(|| (value.clone(), 0));
            entry.1 += 1;
        }
    }

    let mut buckets: Vec<FacetBucket> = counts
        .into_values()
        .map(|(value, count)| FacetBucket { value, count })
        .collect();
    buckets.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.value.to_string().cmp(&b.value.to_string()))
    });
    buckets
}

#[async_trait]
impl SearchIndex for MemorySearchIndex {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        let filter = match &query.filter {
            Some(f) => Some(parse_in_filter(f).ok_or_else(|| {
                QnaError::InvalidInput(format!("Unsupported filter for in-memory index: {}", f))
            })?),
            None => None,
        };

        let text = query.text.trim();
        let terms: Vec<String> = if text.is_empty() || text == "*" {
            Vec::new()
        } else {
            text.split_whitespace()
                .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
                .filter(|t| !t.is_empty())
                .collect()
        };

        let docs = self.documents.read().map_err(|_| Self::poisoned())?;

        let mut matched: Vec<(&String, &IndexDocument, usize)> = docs
            .iter()
            .filter(|(_, doc)| match &filter {
                Some(f) => doc
                    .get(&f.field)
                    .is_some_and(|v| value_matches(v, &f.values)),
                None => true,
            })
            .map(|(key, doc)| (key, doc, term_hits(doc, &terms)))
            .filter(|(_, _, hits)| terms.is_empty() || *hits > 0)
            .collect();

        // Highest score first; key order breaks ties
        matched.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(b.0)));

        let analytics = if query.wants_analytics() {
            let matched_docs: Vec<&IndexDocument> = matched.iter().map(|(_, doc, _)| *doc).collect();
            Some(AnalyticsSummary {
                count: query.include_count.then_some(matched_docs.len() as u64),
                facets: query
                    .facets
                    .iter()
                    .map(|field| (field.clone(), facet_buckets(&matched_docs, field)))
                    .collect(),
            })
        } else {
            None
        };

        let hits = matched
            .into_iter()
            .take(query.top)
            .map(|(key, doc, score)| {
                let mut fields = doc.clone();
                fields.insert("score".to_string(), Value::from(score as f64));
                fields.insert("doc_id".to_string(), Value::String(key.clone()));
                SearchHit::new(fields)
            })
            .collect();

        Ok(SearchResults { hits, analytics })
    }

    async fn upload(&self, documents: &[IndexDocument]) -> Result<usize> {
        let mut store = self.documents.write().map_err(|_| Self::poisoned())?;

        for doc in documents {
            let key = doc
                .get(&self.key_field)
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    QnaError::InvalidInput(format!(
                        "Document is missing string key field '{}'",
                        self.key_field
                    ))
                })?
                .to_string();

            // mergeOrUpload: incoming fields overwrite, others are kept
            let entry = store.entry(key).or_default();
            for (field, value) in doc {
                entry.insert(field.clone(), value.clone());
            }
        }

        Ok(documents.len())
    }

    async fn clear_index(&self) -> Result<usize> {
        let mut store = self.documents.write().map_err(|_| Self::poisoned())?;
        let removed = store.len();
        store.clear();
        Ok(removed)
    }

    async fn document_count(&self) -> Result<usize> {
        let docs = self.documents.read().map_err(|_| Self::poisoned())?;
        Ok(docs.len())
    }
}
