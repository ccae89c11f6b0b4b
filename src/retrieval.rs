//! Retrieval step: question and consignee scope to hits and analytics.

use crate::config::SearchSettings;
use crate::search::{consignee_filter, SearchIndex, SearchQuery};
use crate::state::TurnState;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Intent whose answers need counts and facets rather than just records.
pub const ANALYTICS_INTENT: &str = "analytics";

/// Queries the shipment index for the current question.
pub struct Retriever {
    index: Arc<dyn SearchIndex>,
    consignee_field: String,
    top: usize,
    facets: Vec<String>,
}

impl Retriever {
    pub fn new(index: Arc<dyn SearchIndex>, settings: &SearchSettings) -> Self {
        Self {
            index,
            consignee_field: settings.consignee_field.clone(),
            top: settings.top,
            facets: settings.facets.clone(),
        }
    }

    /// Build the search query for a turn.
    pub fn build_query(&self, state: &TurnState) -> SearchQuery {
        let mut query = SearchQuery::new(state.question_raw.clone(), self.top);

        if let Some(filter) = consignee_filter(&self.consignee_field, &state.consignee_codes) {
            query = query.with_filter(filter);
        }

        if state.intent.eq_ignore_ascii_case(ANALYTICS_INTENT) {
            query = query.with_analytics(self.facets.clone());
        }

        query
    }

    /// Run the query and store its results on the state.
    ///
    /// A failed search leaves the state without hits and records the failure
    /// in `errors`.
    #[instrument(
        name = "retrieve",
        skip(self, state),
        fields(conversation_id = %state.conversation_id, intent = %state.intent)
    )]
    pub async fn retrieve(&self, mut state: TurnState) -> TurnState {
        let query = self.build_query(&state);

        match self.index.search(&query).await {
            Ok(results) => {
                info!("Retrieved {} hits", results.hits.len());
                state.hits = results.hits;
                state.idx_analytics = results.analytics;
            }
            Err(e) => {
                error!("Search failed: {}", e);
                state.hits = Vec::new();
                state.idx_analytics = None;
                state.errors.push(format!("Search Error: {}", e));
            }
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{IndexDocument, MemorySearchIndex};
    use crate::testing::FailingIndex;
    use serde_json::json;

    async fn seeded_index() -> Arc<MemorySearchIndex> {
        let index = Arc::new(MemorySearchIndex::new());
        let docs: Vec<IndexDocument> = [
            json!({"doc_id": "1", "carrier": "ACME", "shipment_status": "Delayed", "consignee_codes": ["C1"]}),
            json!({"doc_id": "2", "carrier": "ACME", "shipment_status": "Delivered", "consignee_codes": ["C2"]}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();
        index.upload(&docs).await.unwrap();
        index
    }

    #[test]
    fn test_build_query() {
        let retriever = Retriever::new(Arc::new(MemorySearchIndex::new()), &SearchSettings::default());

        let state = TurnState::new("c")
            .with_consignees(vec!["C1".to_string()])
            .with_intent("Analytics")
            .start_turn("how many delayed");
        let query = retriever.build_query(&state);

        assert_eq!(query.text, "how many delayed");
        assert_eq!(
            query.filter.as_deref(),
            Some("consignee_codes/any(c: search.in(c, 'C1', ','))")
        );
        assert!(query.include_count);
        assert_eq!(query.facets, SearchSettings::default().facets);

        let plain = retriever.build_query(&TurnState::new("c").start_turn("status"));
        assert!(plain.filter.is_none());
        assert!(!plain.wants_analytics());
    }

    #[tokio::test]
    async fn test_retrieve_respects_consignee_scope() {
        let retriever = Retriever::new(seeded_index().await, &SearchSettings::default());

        let state = TurnState::new("c")
            .with_consignees(vec!["C2".to_string()])
            .start_turn("acme");
        let state = retriever.retrieve(state).await;

        assert_eq!(state.hits.len(), 1);
        assert_eq!(state.hits[0].doc_id(), Some("2"));
        assert!(state.idx_analytics.is_none());
    }

    #[tokio::test]
    async fn test_retrieve_analytics_intent() {
        let retriever = Retriever::new(seeded_index().await, &SearchSettings::default());

        let state = TurnState::new("c")
            .with_intent(ANALYTICS_INTENT)
            .start_turn("acme");
        let state = retriever.retrieve(state).await;

        let analytics = state.idx_analytics.unwrap();
        assert_eq!(analytics.count, Some(2));
        assert_eq!(analytics.facets["carrier"][0].count, 2);
    }

    #[tokio::test]
    async fn test_search_failure_is_recorded() {
        let retriever = Retriever::new(Arc::new(FailingIndex), &SearchSettings::default());

        let state = retriever
            .retrieve(TurnState::new("c").start_turn("anything"))
            .await;

        assert!(state.hits.is_empty());
        assert_eq!(state.errors.len(), 1);
        assert!(state.errors[0].contains("503"));
    }
}
