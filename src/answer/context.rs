//! Context assembly for answer prompts.

use crate::search::{AnalyticsSummary, SearchHit, METADATA_FIELDS};
use serde_json::Value;

/// Default number of hits rendered into a context block.
pub const DEFAULT_MAX_DOCUMENTS: usize = 5;

/// Result of assembling context from retrieval output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembledContext {
    /// Neither hits nor analytics were available.
    NoInformation,
    /// Rendered context text.
    Text(String),
}

/// Formats hits and analytics into a bounded text block.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    max_documents: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DOCUMENTS)
    }
}

impl ContextAssembler {
    /// At least one document is always rendered.
    pub fn new(max_documents: usize) -> Self {
        Self {
            max_documents: max_documents.max(1),
        }
    }

    /// Assemble the context block.
    ///
    /// Blocks are separated by a blank line. Within a document block, fields
    /// appear in lexicographic key order with null values and retrieval
    /// metadata left out.
    pub fn assemble(
        &self,
        hits: &[SearchHit],
        analytics: Option<&AnalyticsSummary>,
    ) -> AssembledContext {
        let analytics = analytics.filter(|a| !a.is_empty());

        if hits.is_empty() && analytics.is_none() {
            return AssembledContext::NoInformation;
        }

        let mut blocks = Vec::new();

        if let Some(analytics) = analytics {
            blocks.push(format_analytics(analytics));
        }

        blocks.extend(
            hits.iter()
                .take(self.max_documents)
                .enumerate()
                .map(|(i, hit)| format_document(i + 1, hit)),
        );

        AssembledContext::Text(blocks.join("\n"))
    }
}

fn format_analytics(analytics: &AnalyticsSummary) -> String {
    let count = analytics
        .count
        .map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut block = format!("--- Analytics Data ---\nTotal Matches: {}\n", count);

    if !analytics.facets.is_empty() {
        let facets = serde_json::to_string(&analytics.facets).unwrap_or_default();
        block.push_str(&format!("Facets: {}\n", facets));
    }

    block
}

fn format_document(number: usize, hit: &SearchHit) -> String {
    let mut keys: Vec<&String> = hit
        .fields()
        .iter()
        .filter(|(key, value)| !value.is_null() && !METADATA_FIELDS.contains(&key.as_str()))
        .map(|(key, _)| key)
        .collect();
    keys.sort();

    let mut block = format!("--- Document {} ---\n", number);
    for key in keys {
        if let Some(value) = hit.get(key) {
            block.push_str(&format!("{}: {}\n", key, render_value(value)));
        }
    }
    block
}

/// Render a field value for the prompt. Strings are unquoted.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
